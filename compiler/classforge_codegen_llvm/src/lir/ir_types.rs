//! `IrType` -> inkwell type lowering.
//!
//! `IrType` is recursive (pointers, structures, arrays, function types),
//! so this conversion recurses through its variants rather than matching
//! a flat enum.

use classforge_ir::{IntWidth, IrType};
use inkwell::types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType};
use inkwell::AddressSpace;

use crate::context::CodegenCtx;

pub trait IntoBasicTypeMetadata<'ll> {
    fn into_basic_type_metadata(&self, ctx: &CodegenCtx<'ll>) -> BasicMetadataTypeEnum<'ll>;
}

pub trait IntoBasicType<'ll> {
    fn into_basic_type(&self, ctx: &CodegenCtx<'ll>) -> BasicTypeEnum<'ll>;
}

impl<'ll> IntoBasicTypeMetadata<'ll> for IrType {
    fn into_basic_type_metadata(&self, ctx: &CodegenCtx<'ll>) -> BasicMetadataTypeEnum<'ll> {
        self.into_basic_type(ctx).into()
    }
}

impl<'ll> IntoBasicType<'ll> for IrType {
    fn into_basic_type(&self, ctx: &CodegenCtx<'ll>) -> BasicTypeEnum<'ll> {
        match self {
            IrType::Void => panic!("`void` has no basic-type representation; use it only in return position"),
            IrType::Integer(width) => BasicTypeEnum::IntType(match width {
                IntWidth::W8 => ctx.ll_context.i8_type(),
                IntWidth::W16 => ctx.ll_context.i16_type(),
                IntWidth::W32 => ctx.ll_context.i32_type(),
                IntWidth::W64 => ctx.ll_context.i64_type(),
            }),
            IrType::Float => BasicTypeEnum::FloatType(ctx.ll_context.f32_type()),
            IrType::Double => BasicTypeEnum::FloatType(ctx.ll_context.f64_type()),
            IrType::Pointer(_) => BasicTypeEnum::PointerType(ctx.ll_context.ptr_type(AddressSpace::default())),
            IrType::Opaque(name) => {
                let resolved = ctx
                    .type_arena
                    .resolve(name)
                    .unwrap_or_else(|| panic!("unresolved opaque type `{name}` reached codegen"));
                resolved.into_basic_type(ctx)
            }
            IrType::Structure { fields, packed, .. } => {
                let field_tys: Vec<BasicTypeEnum> = fields.iter().map(|f| f.into_basic_type(ctx)).collect();
                BasicTypeEnum::StructType(ctx.ll_context.struct_type(&field_tys, *packed))
            }
            IrType::Array { elem, count } => {
                BasicTypeEnum::ArrayType(elem.into_basic_type(ctx).array_type(*count as u32))
            }
            IrType::Function { .. } => {
                panic!("a function type has no basic-type representation; use `function_type_of`")
            }
        }
    }
}

/// Lowers a function-shaped `IrType` directly to an inkwell `FunctionType`,
/// since `FunctionType` is not itself a `BasicTypeEnum` variant.
pub fn function_type_of<'ll>(params: &[IrType], ret: &IrType, ctx: &CodegenCtx<'ll>) -> FunctionType<'ll> {
    let param_tys: Vec<BasicMetadataTypeEnum> = params.iter().map(|p| p.into_basic_type_metadata(ctx)).collect();
    match ret {
        IrType::Void => ctx.ll_context.void_type().fn_type(&param_tys, false),
        other => match other.into_basic_type(ctx) {
            BasicTypeEnum::ArrayType(t) => t.fn_type(&param_tys, false),
            BasicTypeEnum::FloatType(t) => t.fn_type(&param_tys, false),
            BasicTypeEnum::IntType(t) => t.fn_type(&param_tys, false),
            BasicTypeEnum::PointerType(t) => t.fn_type(&param_tys, false),
            BasicTypeEnum::StructType(t) => t.fn_type(&param_tys, false),
            BasicTypeEnum::VectorType(t) => t.fn_type(&param_tys, false),
        },
    }
}
