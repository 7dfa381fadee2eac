//! The data layout engine: the three per-type operations (`alloc_size`,
//! `store_size`, `alignment`) and the structure-layout walk that every
//! higher-level component (field ordering, instance/static layout, method
//! signatures) is built on top of.
//!
//! Generalized from a flat match over a five-variant enum to a recursive
//! walk over the full [`IrType`] algebra, with a complete structure-layout
//! algorithm (padding, alignment, field offsets).

use std::sync::Arc;

use classforge_abi::target::TargetDataLayout;
use classforge_abi::{AbiAndPrefAlign, Align, Size};
use tracing::instrument;

use crate::ir_type::{IntWidth, IrType, TypeArena};

/// A field's placement inside a structure: its byte offset and its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    pub offset: u64,
    pub ty: IrType,
}

/// The computed, platform-specific layout of an `IrType`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeLayout {
    /// The "store size": the minimum number of bytes the value's bit
    /// pattern actually occupies.
    pub store_size: u64,
    /// The "alloc size": `store_size` rounded up to `align`, i.e. the
    /// stride used when the type repeats (an array element, consecutive
    /// struct fields of the same type).
    pub alloc_size: u64,
    /// The ABI alignment, in bytes.
    pub align: u64,
    /// Field layouts, populated only for `Structure`.
    pub fields: Vec<FieldLayout>,
}

/// Computes layouts for IR types against a target's data layout.
///
/// Unlike the ABI-generic `classforge_abi::layout::LayoutCtx` that used to
/// live on this type, a `LayoutCtx` here also resolves named (`Structure`/
/// `Opaque`) types through a [`TypeArena`], since a managed class's layout
/// is a recursive function of its supertype's layout.
pub struct LayoutCtx<'a> {
    data_layout: &'a TargetDataLayout,
    arena: &'a TypeArena,
}

impl<'a> LayoutCtx<'a> {
    pub fn new(data_layout: &'a TargetDataLayout, arena: &'a TypeArena) -> Self {
        LayoutCtx { data_layout, arena }
    }

    fn align_pair_for(&self, ty: &IrType) -> AbiAndPrefAlign {
        match ty {
            IrType::Void => AbiAndPrefAlign::new(8, 8),
            IrType::Integer(IntWidth::W8) => self.data_layout.i8_align,
            IrType::Integer(IntWidth::W16) => self.data_layout.i16_align,
            IrType::Integer(IntWidth::W32) => self.data_layout.i32_align,
            IrType::Integer(IntWidth::W64) => self.data_layout.i64_align,
            IrType::Float => self.data_layout.f32_align,
            IrType::Double => self.data_layout.f64_align,
            IrType::Pointer(_) => self.data_layout.pointer_align,
            IrType::Opaque(_) => self.data_layout.aggregate_align,
            IrType::Structure { .. } => self.data_layout.aggregate_align,
            IrType::Function { .. } => self.data_layout.pointer_align,
            IrType::Array { elem, .. } => self.align_pair_for(elem),
        }
    }

    /// The ABI alignment of `ty`, in bytes. For a named `Opaque` type this
    /// resolves through the arena first, falling back to aggregate
    /// alignment if the name is still undefined (a forward declaration
    /// whose layout is not needed yet, only its address).
    #[instrument(skip(self))]
    pub fn alignment(&self, ty: &IrType) -> u64 {
        if let IrType::Opaque(name) = ty {
            if let Some(resolved) = self.arena.resolve(name) {
                if !matches!(resolved, IrType::Opaque(_)) {
                    return self.alignment(&resolved);
                }
            }
        }
        self.align_pair_for(ty).abi.bytes()
    }

    fn store_size_bits(&self, ty: &IrType) -> u64 {
        match ty {
            IrType::Void => 0,
            IrType::Integer(w) => w.bits() as u64,
            IrType::Float => 32,
            IrType::Double => 64,
            IrType::Pointer(_) | IrType::Function { .. } => self.data_layout.pointer_size,
            IrType::Opaque(name) => match self.arena.resolve(name) {
                Some(resolved) if !matches!(resolved, IrType::Opaque(_)) => {
                    self.store_size_bits(&resolved)
                }
                _ => 0,
            },
            IrType::Structure { fields, .. } => {
                let layout = self.compute_struct_layout(ty);
                layout.store_size * 8
            }
            IrType::Array { elem, count } => self.alloc_size(elem) * 8 * count,
        }
    }

    /// The minimal number of bytes needed to hold `ty`'s bit pattern.
    pub fn store_size(&self, ty: &IrType) -> u64 {
        Size::from_bits(self.store_size_bits(ty)).bytes()
    }

    /// `store_size` rounded up to `ty`'s own alignment: the stride used
    /// when `ty` repeats, e.g. as an array element.
    pub fn alloc_size(&self, ty: &IrType) -> u64 {
        let store = self.store_size(ty);
        let align = self.alignment(ty).max(1);
        round_up(store, align)
    }

    /// Computes a structure's field offsets and overall size/alignment.
    /// Panics if `ty` is not `Structure` — callers only reach this through
    /// `store_size`/`alloc_size`/`full_layout`, which only invoke it on a
    /// `Structure`.
    fn compute_struct_layout(&self, ty: &IrType) -> TypeLayout {
        let IrType::Structure { fields, packed, .. } = ty else {
            unreachable!("compute_struct_layout called on a non-structure type");
        };

        let mut offset: u64 = 0;
        let mut field_layouts = Vec::with_capacity(fields.len());
        let mut max_align: u64 = 1;

        for field in fields {
            let field_align = if *packed { 1 } else { self.alignment(field) };
            max_align = max_align.max(field_align);
            if !*packed {
                offset = round_up(offset, field_align);
            }
            field_layouts.push(FieldLayout {
                offset,
                ty: field.clone(),
            });
            offset += self.store_size(field);
        }

        let store_size = offset;
        let align = if *packed { 1 } else { max_align };
        let alloc_size = round_up(store_size, align);

        TypeLayout {
            store_size,
            alloc_size,
            align,
            fields: field_layouts,
        }
    }

    /// The full layout (size, alignment, field offsets) of `ty`.
    pub fn full_layout(&self, ty: &IrType) -> TypeLayout {
        match ty {
            IrType::Structure { .. } => self.compute_struct_layout(ty),
            other => TypeLayout {
                store_size: self.store_size(other),
                alloc_size: self.alloc_size(other),
                align: self.alignment(other),
                fields: Vec::new(),
            },
        }
    }

    /// Builds the "null pointer indexing" style constant offset for the
    /// `index`-th field of a structure, without synthesizing any backend
    /// instruction — the offset is derived purely from the computed layout.
    pub fn offset_of_field(&self, ty: &IrType, index: usize) -> Option<u64> {
        let layout = self.full_layout(ty);
        layout.fields.get(index).map(|f| f.offset)
    }

    pub fn arena(&self) -> &TypeArena {
        self.arena
    }
}

fn round_up(value: u64, align: u64) -> u64 {
    if align == 0 {
        return value;
    }
    let rem = value % align;
    if rem == 0 {
        value
    } else {
        value + (align - rem)
    }
}

/// Trivial re-export so callers that only need a byte count don't have to
/// depend on `classforge_abi::Align` directly for the common case.
pub fn align_bytes(align: Align) -> u64 {
    align.bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(dl: &'a TargetDataLayout, arena: &'a TypeArena) -> LayoutCtx<'a> {
        LayoutCtx::new(dl, arena)
    }

    #[test]
    fn scalar_store_and_alloc_sizes_on_64_bit_target() {
        let dl = TargetDataLayout::default();
        let arena = TypeArena::new();
        let lc = ctx(&dl, &arena);

        assert_eq!(lc.store_size(&IrType::i8()), 1);
        assert_eq!(lc.store_size(&IrType::i32()), 4);
        assert_eq!(lc.store_size(&IrType::i64()), 8);
        assert_eq!(lc.store_size(&IrType::Double), 8);
        assert_eq!(lc.store_size(&IrType::ptr(IrType::i8())), 8);
        assert_eq!(lc.alignment(&IrType::i64()), 8);
    }

    #[test]
    fn struct_layout_inserts_padding_for_alignment() {
        // { i8, i32 } on a target where i32 is 4-byte aligned: the i8 is
        // followed by 3 bytes of padding before the i32.
        let dl = TargetDataLayout::default();
        let arena = TypeArena::new();
        let lc = ctx(&dl, &arena);

        let ty = IrType::Structure {
            name: None,
            fields: vec![IrType::i8(), IrType::i32()],
            packed: false,
        };
        let layout = lc.full_layout(&ty);
        assert_eq!(layout.fields[0].offset, 0);
        assert_eq!(layout.fields[1].offset, 4);
        assert_eq!(layout.store_size, 8);
        assert_eq!(layout.align, 4);
    }

    #[test]
    fn packed_struct_has_no_padding() {
        let dl = TargetDataLayout::default();
        let arena = TypeArena::new();
        let lc = ctx(&dl, &arena);

        let ty = IrType::Structure {
            name: None,
            fields: vec![IrType::i8(), IrType::i32()],
            packed: true,
        };
        let layout = lc.full_layout(&ty);
        assert_eq!(layout.fields[1].offset, 1);
        assert_eq!(layout.store_size, 5);
        assert_eq!(layout.align, 1);
    }

    #[test]
    fn resolved_opaque_defers_to_its_definition() {
        let dl = TargetDataLayout::default();
        let arena = TypeArena::new();
        arena.define(
            "Pair",
            IrType::Structure {
                name: Some(Arc::from("Pair")),
                fields: vec![IrType::i32(), IrType::i32()],
                packed: false,
            },
        );
        let lc = ctx(&dl, &arena);
        assert_eq!(lc.store_size(&IrType::opaque("Pair")), 8);
    }
}
