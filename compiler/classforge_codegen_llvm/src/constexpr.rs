//! Lowers `classforge_ir::constexpr`'s backend-agnostic constant
//! descriptions into actual LLVM values.
//!
//! `ConstExpr` is lowered via the "null pointer indexing" trick: index a
//! null pointer of the relevant type and `ptrtoint` the result, so a
//! type's size or a field's offset becomes a link-time constant instead of
//! a host-computed number. `FieldPointerExpr` needs a real base pointer
//! value, so it lowers through a `Builder` instead of a pure constant.

use inkwell::builder::{Builder, BuilderError};
use inkwell::values::{IntValue, PointerValue};
use inkwell::AddressSpace;

use classforge_ir::constexpr::{ConstExpr, FieldPointerExpr};
use classforge_ir::IrType;

use crate::context::CodegenCtx;
use crate::lir::ir_types::IntoBasicType;

/// Lowers a `ConstExpr` to an `i64` constant.
pub fn lower_const_expr<'ll>(expr: &ConstExpr, ctx: &CodegenCtx<'ll>) -> IntValue<'ll> {
    match expr {
        ConstExpr::SizeOf(ty) => size_of_via_null_gep(ty, ctx),
        ConstExpr::OffsetOf { ty, path } => offset_of_via_null_gep(ty, path, ctx),
    }
}

fn size_of_via_null_gep<'ll>(ty: &IrType, ctx: &CodegenCtx<'ll>) -> IntValue<'ll> {
    let basic_ty = ty.into_basic_type(ctx);
    let ptr_ty = ctx.ll_context.ptr_type(AddressSpace::default());
    let null = ptr_ty.const_null();
    let one = ctx.ll_context.i32_type().const_int(1, false);
    let indexed = unsafe { null.const_in_bounds_gep(basic_ty, &[one]) };
    indexed.const_to_int(ctx.ll_context.i64_type())
}

/// `path` is a chain of field indices into (possibly nested) structures, so
/// the GEP leads with an index-0 "dereference" of the null pointer before
/// walking the path, matching the conventional `getelementptr ty, ty* null,
/// i32 0, i32 idx0, i32 idx1, ...` form.
fn offset_of_via_null_gep<'ll>(ty: &IrType, path: &[usize], ctx: &CodegenCtx<'ll>) -> IntValue<'ll> {
    let basic_ty = ty.into_basic_type(ctx);
    let ptr_ty = ctx.ll_context.ptr_type(AddressSpace::default());
    let null = ptr_ty.const_null();
    let i32_ty = ctx.ll_context.i32_type();
    let mut indices = vec![i32_ty.const_int(0, false)];
    indices.extend(path.iter().map(|&idx| i32_ty.const_int(idx as u64, false)));
    let indexed = unsafe { null.const_in_bounds_gep(basic_ty, &indices) };
    indexed.const_to_int(ctx.ll_context.i64_type())
}

/// Synthesizes the field-pointer sequence: treats `base` as a raw byte
/// pointer and steps forward by `expr.byte_offset`. Under LLVM's opaque
/// pointer model every pointer type lowers to the same `ptr` value, so the
/// `bitcast base to i8*; gep by byte_offset; bitcast to field_ty*` sequence
/// the data model describes collapses to a single byte-indexed GEP — no
/// separate no-op bitcasts are needed to reach the same result.
pub fn lower_field_pointer<'ll>(
    builder: &Builder<'ll>,
    base: PointerValue<'ll>,
    expr: &FieldPointerExpr,
    ctx: &CodegenCtx<'ll>,
) -> Result<PointerValue<'ll>, BuilderError> {
    let i8_ty = ctx.ll_context.i8_type();
    let offset = i8_ty.const_int(expr.byte_offset, false);
    unsafe { builder.build_in_bounds_gep(i8_ty, base, &[offset], "field_ptr") }
}
