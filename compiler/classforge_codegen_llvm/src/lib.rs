//! Declares the LLVM-IR stubs a compilation unit's trampoline set needs.
//!
//! This crate stops at declaration: it never lowers a method body to
//! instructions, with one narrow exception — `constexpr` synthesizes the
//! handful of layout-derived instructions (`size_of`/`offset_of`'s
//! null-pointer-indexing constants, the field-pointer GEP) that the
//! Managed-to-IR Type Mapper's helper predicates call for directly. That
//! keeps the crate symmetric with `classforge_trampoline`, which only ever
//! describes *what* needs linking, never *how* a method body runs.

pub mod constexpr;
pub mod context;
pub mod lir;

use classforge_abi::calling_convention::function::{ArgAbi, FnAbi, PassMode};
use classforge_abi::layout::{Layout, Primitive, TyAndLayout};
use classforge_abi::size_and_align::{AbiAndPrefAlign, Size};
use classforge_ir::IrType;
use classforge_trampoline::traits::StubLinkageOf;
use classforge_trampoline::TrampolineSet;
use inkwell::values::FunctionValue;
use tracing::instrument;

pub use context::CodegenCtx;

fn trivial_arg_abi(ty: IrType, primitive: Primitive, size_bits: u64) -> ArgAbi<IrType> {
    let size = Size::from_bits(size_bits);
    let align_bytes = size.bytes().max(1);
    let align = AbiAndPrefAlign::new(align_bytes, align_bytes);
    ArgAbi::new(
        TyAndLayout {
            ty,
            layout: Layout {
                size,
                align,
                backend_repr: classforge_abi::layout::BackendRepr::Scalar(primitive),
            },
        },
        PassMode::Direct,
    )
}

/// Builds a best-effort `FnAbi` for a trampoline stub purely from its IR
/// function type, passing every argument and the return value directly.
/// A real calling-convention lowering (splitting large aggregates into
/// `PassMode::Indirect`, for instance) belongs to a full ABI classifier;
/// this crate only needs enough of an `FnAbi` to declare a stub's type.
pub fn trivial_fn_abi(params: &[IrType], ret: &IrType) -> FnAbi<IrType> {
    let args = params
        .iter()
        .cloned()
        .map(|ty| match &ty {
            IrType::Pointer(_) => trivial_arg_abi(ty, Primitive::Pointer, 64),
            IrType::Integer(w) => trivial_arg_abi(ty.clone(), Primitive::I32, w.bits() as u64),
            IrType::Float => trivial_arg_abi(ty, Primitive::F32, 32),
            IrType::Double => trivial_arg_abi(ty, Primitive::F64, 64),
            _ => trivial_arg_abi(ty, Primitive::Pointer, 64),
        })
        .collect();

    let ret_abi = match ret {
        IrType::Void => ArgAbi::new(
            TyAndLayout {
                ty: IrType::Void,
                layout: Layout {
                    size: Size::from_bits(0),
                    align: AbiAndPrefAlign::new(0, 0),
                    backend_repr: classforge_abi::layout::BackendRepr::Memory,
                },
            },
            PassMode::Ignore,
        ),
        other => trivial_arg_abi(other.clone(), Primitive::Pointer, 64),
    };

    FnAbi { args, ret: ret_abi }
}

/// Declares every trampoline in `set` against `ctx`, returning the declared
/// function values in the set's deterministic order.
#[instrument(skip(ctx, set))]
pub fn declare_trampoline_stubs<'ll>(
    ctx: &mut CodegenCtx<'ll>,
    set: &TrampolineSet,
    abi_of: impl Fn(&classforge_trampoline::Trampoline) -> FnAbi<IrType>,
) -> Vec<FunctionValue<'ll>> {
    set.iter().map(|t| ctx.declare_stub(t, &abi_of(t))).collect()
}
