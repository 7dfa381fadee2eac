//! Managed classes, field ordering, and instance/static layout — the heart
//! of the Managed-to-IR Type Mapper.

use std::collections::HashMap;
use std::sync::Arc;

use classforge_abi::target::TargetTriple;

use crate::descriptor::{FieldDescriptor, InternalName};
use crate::error::MapperError;
use crate::ir_type::IrType;
use crate::layout::LayoutCtx;

/// The well-known superclass name that marks a class as an enum. `is_enum`
/// only looks one level up the chain: a class two levels below the enum
/// root is an enum's subclass (e.g. a per-constant body), not itself
/// enum-shaped.
pub const ENUM_ROOT_CLASS: &str = "java/lang/Enum";

/// The marker superclass transitively extended by classes backed by a
/// native (host-language) object handle rather than a managed field layout.
pub const NATIVE_OBJECT_MARKER_CLASS: &str = "classforge/rt/NativeObject";

/// The marker superclass transitively extended by value types laid out
/// inline rather than behind a reference.
pub const STRUCT_MARKER_CLASS: &str = "classforge/rt/Struct";

/// A single declared field of a managed class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedField {
    pub name: String,
    pub descriptor: FieldDescriptor,
    pub is_static: bool,
}

impl ManagedField {
    pub fn new(name: impl Into<String>, descriptor: FieldDescriptor, is_static: bool) -> Self {
        ManagedField {
            name: name.into(),
            descriptor,
            is_static,
        }
    }

    /// The stable sort key used by [`order_fields`]. Per-field alignment
    /// here is the architecture-generic value; the ARM 32-bit long/double
    /// override used in [`instance_layout`]/[`static_layout`] does not
    /// affect ordering, only padding, so we intentionally do not thread a
    /// target triple through field ordering.
    fn sort_key(&self, layout_ctx: &LayoutCtx<'_>) -> (bool, std::cmp::Reverse<u64>, std::cmp::Reverse<u64>, &'static str, &str) {
        let ir_ty = self.descriptor.storage_ir_type();
        let align = layout_ctx.alignment(&ir_ty);
        let size = layout_ctx.store_size(&ir_ty);
        (
            !self.descriptor.is_reference(),
            std::cmp::Reverse(align),
            std::cmp::Reverse(size),
            type_tag_name(&self.descriptor),
            self.name.as_str(),
        )
    }
}

fn type_tag_name(desc: &FieldDescriptor) -> &'static str {
    match desc {
        FieldDescriptor::Boolean => "boolean",
        FieldDescriptor::Byte => "byte",
        FieldDescriptor::Short => "short",
        FieldDescriptor::Char => "char",
        FieldDescriptor::Int => "int",
        FieldDescriptor::Long => "long",
        FieldDescriptor::Float => "float",
        FieldDescriptor::Double => "double",
        FieldDescriptor::Reference(_) => "reference",
        FieldDescriptor::Array(_) => "array",
    }
}

/// Orders fields per the five-rule total order: references first, then by
/// decreasing alignment, then by decreasing size, then by type-tag name,
/// then by field name. Implemented with `slice::sort_by`, which is
/// documented-stable, so re-sorting an already-sorted slice is a no-op —
/// this is what makes the ordering idempotent under repeated application.
pub fn order_fields(fields: &mut [ManagedField], layout_ctx: &LayoutCtx<'_>) {
    fields.sort_by(|a, b| a.sort_key(layout_ctx).cmp(&b.sort_key(layout_ctx)));
}

/// A managed class: its name, optional superclass, and declared fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedClass {
    pub name: InternalName,
    pub super_class: Option<InternalName>,
    pub fields: Vec<ManagedField>,
}

impl ManagedClass {
    pub fn instance_fields(&self) -> impl Iterator<Item = &ManagedField> {
        self.fields.iter().filter(|f| !f.is_static)
    }

    pub fn static_fields(&self) -> impl Iterator<Item = &ManagedField> {
        self.fields.iter().filter(|f| f.is_static)
    }
}

/// A read-only view over all classes known to the current compilation,
/// populated by the (out-of-scope) front end.
#[derive(Default)]
pub struct ClassTable {
    classes: HashMap<InternalName, ManagedClass>,
}

impl ClassTable {
    pub fn new() -> Self {
        ClassTable::default()
    }

    pub fn insert(&mut self, class: ManagedClass) {
        self.classes.insert(class.name.clone(), class);
    }

    pub fn get(&self, name: &str) -> Option<&ManagedClass> {
        self.classes.get(name)
    }

    /// True iff `name`'s *direct* superclass is the enum root. Deeper
    /// ancestry doesn't count: a class two levels below the enum root (e.g.
    /// a per-constant body subclass) is not itself enum-shaped by this rule.
    pub fn is_enum(&self, name: &str) -> bool {
        matches!(
            self.get(name).and_then(|c| c.super_class.as_deref()),
            Some(sup) if sup == ENUM_ROOT_CLASS
        )
    }

    /// True iff `name` transitively extends the native-object marker class.
    pub fn is_native_object(&self, name: &str) -> bool {
        self.extends_transitively(name, NATIVE_OBJECT_MARKER_CLASS)
    }

    /// True iff `name` transitively extends the struct marker class.
    pub fn is_struct(&self, name: &str) -> bool {
        self.extends_transitively(name, STRUCT_MARKER_CLASS)
    }

    /// Walks the superclass chain starting at `name`, looking for `marker`.
    /// Stops (returning `false`) at the root of the chain or if a
    /// superclass name isn't resolvable in this table; guards against a
    /// cyclic chain in malformed input by tracking visited names.
    fn extends_transitively(&self, name: &str, marker: &str) -> bool {
        let mut seen = std::collections::HashSet::new();
        let mut current = self.get(name);
        while let Some(class) = current {
            let Some(super_name) = class.super_class.as_deref() else {
                return false;
            };
            if super_name == marker {
                return true;
            }
            if !seen.insert(super_name.to_string()) {
                return false;
            }
            current = self.get(super_name);
        }
        false
    }
}

/// Returns the field's padding-purposes alignment: the generic ABI
/// alignment, except that `long`/`double` fields are forced to an 8-byte
/// alignment on 32-bit ARM targets, overriding that architecture's natural
/// 4-byte word alignment for those two types.
///
/// Per the recorded Open Question decision (see DESIGN.md), this override
/// applies to every `long`/`double` field, not only `volatile`/`final`
/// ones, mirroring the literal behavior being modeled rather than a
/// narrower reading of it.
fn field_alignment(desc: &FieldDescriptor, triple: Option<&TargetTriple>, layout_ctx: &LayoutCtx<'_>) -> u64 {
    let forces_eight = matches!(desc, FieldDescriptor::Long | FieldDescriptor::Double)
        && triple.map(|t| t.long_long_align_on_32_bit_arm()).unwrap_or(false);
    if forces_eight {
        return 8;
    }
    layout_ctx.alignment(&desc.storage_ir_type())
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

/// A laid-out field: its descriptor, its byte offset within the instance,
/// and the IR type used to synthesize its field pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaidOutField {
    pub name: String,
    pub offset: u64,
    pub ir_type: IrType,
}

/// The result of laying out a class's instance (non-static) fields: the
/// synthesized `IrType::Structure`, the per-field offsets, and the
/// instance's overall size/alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceLayout {
    pub ty: IrType,
    pub fields: Vec<LaidOutField>,
    pub size: u64,
    pub align: u64,
}

/// Computes a class's instance layout, recursing through its parent chain.
///
/// The parent's instance layout (if any) is embedded as a single packed
/// field at offset 0 — packed so that the parent's own internal padding is
/// reproduced exactly rather than re-derived, guaranteeing a subclass
/// instance is layout-compatible with its parent up to the parent's size.
/// Own fields are then ordered and placed after it, with byte padding
/// inserted before each field so it lands on its (possibly ARM-overridden)
/// alignment, and trailing padding so the whole structure satisfies its own
/// most-strict alignment.
pub fn instance_layout(
    class: &ManagedClass,
    table: &ClassTable,
    triple: Option<&TargetTriple>,
    layout_ctx: &LayoutCtx<'_>,
) -> Result<InstanceLayout, MapperError> {
    let mut offset: u64 = 0;
    let mut fields = Vec::new();
    let mut struct_fields = Vec::new();
    let mut max_align: u64 = 1;

    if let Some(parent_name) = &class.super_class {
        let parent = table
            .get(parent_name)
            .ok_or_else(|| MapperError::UnknownClass {
                class: parent_name.to_string(),
            })?;
        let parent_layout = instance_layout(parent, table, triple, layout_ctx)?;
        max_align = max_align.max(parent_layout.align);
        struct_fields.push(parent_layout.ty.clone());
        for f in parent_layout.fields {
            fields.push(f);
        }
        offset = parent_layout.size;
    }

    let mut own_fields: Vec<ManagedField> = class.instance_fields().cloned().collect();
    order_fields(&mut own_fields, layout_ctx);

    for field in &own_fields {
        let align = field_alignment(&field.descriptor, triple, layout_ctx);
        max_align = max_align.max(align);
        offset = round_up(offset, align);

        let ir_ty = field.descriptor.storage_ir_type();
        fields.push(LaidOutField {
            name: field.name.clone(),
            offset,
            ir_type: ir_ty.clone(),
        });
        struct_fields.push(ir_ty.clone());
        offset += layout_ctx.store_size(&ir_ty);
    }

    let size = round_up(offset, max_align);

    Ok(InstanceLayout {
        ty: IrType::Structure {
            name: Some(Arc::from(&*class.name)),
            fields: struct_fields,
            packed: true,
        },
        fields,
        size,
        align: max_align,
    })
}

/// Computes a class's static-field layout, wrapped in a two-field
/// structure `{ ClassHeader, StaticFields }`. Static fields have no
/// parent chain to recurse through — each class's statics are
/// independent of its supertype's.
pub fn static_layout(
    class: &ManagedClass,
    triple: Option<&TargetTriple>,
    layout_ctx: &LayoutCtx<'_>,
) -> InstanceLayout {
    let mut own_fields: Vec<ManagedField> = class.static_fields().cloned().collect();
    order_fields(&mut own_fields, layout_ctx);

    let mut offset: u64 = 0;
    let mut fields = Vec::new();
    let mut struct_fields = Vec::new();
    let mut max_align: u64 = 1;

    for field in &own_fields {
        let align = field_alignment(&field.descriptor, triple, layout_ctx);
        max_align = max_align.max(align);
        offset = round_up(offset, align);

        let ir_ty = field.descriptor.storage_ir_type();
        fields.push(LaidOutField {
            name: field.name.clone(),
            offset,
            ir_type: ir_ty.clone(),
        });
        struct_fields.push(ir_ty.clone());
        offset += layout_ctx.store_size(&ir_ty);
    }

    let statics_size = round_up(offset, max_align.max(1));

    let statics_ty = IrType::Structure {
        name: Some(Arc::from(format!("{}$Statics", class.name))),
        fields: struct_fields,
        packed: true,
    };

    let wrapper = IrType::Structure {
        name: Some(Arc::from(format!("{}$StaticHandle", class.name))),
        fields: vec![IrType::opaque("ClassHeader"), statics_ty],
        packed: false,
    };

    InstanceLayout {
        ty: wrapper,
        fields,
        size: statics_size,
        align: max_align.max(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classforge_abi::target::TargetDataLayout;
    use crate::ir_type::TypeArena;

    fn class(name: &str, super_class: Option<&str>, fields: Vec<ManagedField>) -> ManagedClass {
        ManagedClass {
            name: Arc::from(name),
            super_class: super_class.map(Arc::from),
            fields,
        }
    }

    #[test]
    fn field_ordering_puts_references_first_then_by_size_desc() {
        let dl = TargetDataLayout::default();
        let arena = TypeArena::new();
        let lc = LayoutCtx::new(&dl, &arena);

        let mut fields = vec![
            ManagedField::new("b", FieldDescriptor::Byte, false),
            ManagedField::new("l", FieldDescriptor::Long, false),
            ManagedField::new("ref1", FieldDescriptor::Reference(Arc::from("Object")), false),
            ManagedField::new("i", FieldDescriptor::Int, false),
        ];
        order_fields(&mut fields, &lc);

        assert_eq!(fields[0].name, "ref1");
        assert_eq!(fields[1].name, "l");
        assert_eq!(fields[2].name, "i");
        assert_eq!(fields[3].name, "b");
    }

    #[test]
    fn ordering_is_idempotent() {
        let dl = TargetDataLayout::default();
        let arena = TypeArena::new();
        let lc = LayoutCtx::new(&dl, &arena);

        let mut fields = vec![
            ManagedField::new("z", FieldDescriptor::Boolean, false),
            ManagedField::new("a", FieldDescriptor::Boolean, false),
            ManagedField::new("l", FieldDescriptor::Long, false),
        ];
        order_fields(&mut fields, &lc);
        let once = fields.clone();
        order_fields(&mut fields, &lc);
        assert_eq!(once, fields);
    }

    #[test]
    fn instance_layout_64_bit_linux() {
        let dl = TargetDataLayout::default();
        let arena = TypeArena::new();
        let lc = LayoutCtx::new(&dl, &arena);
        let table = ClassTable::new();

        let c = class(
            "Point",
            None,
            vec![
                ManagedField::new("x", FieldDescriptor::Int, false),
                ManagedField::new("y", FieldDescriptor::Int, false),
            ],
        );
        let layout = instance_layout(&c, &table, None, &lc).unwrap();
        assert_eq!(layout.size, 8);
        assert_eq!(layout.fields[0].offset, 0);
        assert_eq!(layout.fields[1].offset, 4);
    }

    #[test]
    fn instance_layout_inherits_parent_fields_at_front() {
        let dl = TargetDataLayout::default();
        let arena = TypeArena::new();
        let lc = LayoutCtx::new(&dl, &arena);
        let mut table = ClassTable::new();

        let base = class(
            "Base",
            None,
            vec![ManagedField::new("x", FieldDescriptor::Int, false)],
        );
        table.insert(base);

        let derived = class(
            "Derived",
            Some("Base"),
            vec![ManagedField::new("y", FieldDescriptor::Int, false)],
        );
        let layout = instance_layout(&derived, &table, None, &lc).unwrap();
        assert_eq!(layout.fields.len(), 2);
        assert_eq!(layout.fields[0].name, "x");
        assert_eq!(layout.fields[1].name, "y");
        assert_eq!(layout.fields[1].offset, 4);
    }

    #[test]
    fn arm_32_bit_forces_long_field_alignment_to_eight() {
        let triple = TargetTriple::parse("armv7-unknown-linux-gnueabihf").unwrap();
        let dl = TargetDataLayout::for_triple(&triple);
        let arena = TypeArena::new();
        let lc = LayoutCtx::new(&dl, &arena);
        let table = ClassTable::new();

        let c = class(
            "Counter",
            None,
            vec![
                ManagedField::new("flag", FieldDescriptor::Byte, false),
                ManagedField::new("total", FieldDescriptor::Long, false),
            ],
        );
        let layout = instance_layout(&c, &table, Some(&triple), &lc).unwrap();
        let total_field = layout.fields.iter().find(|f| f.name == "total").unwrap();
        assert_eq!(total_field.offset, 8);
        assert_eq!(layout.align, 8);
    }

    #[test]
    fn static_layout_wraps_fields_with_class_header() {
        let dl = TargetDataLayout::default();
        let arena = TypeArena::new();
        let lc = LayoutCtx::new(&dl, &arena);

        let c = class(
            "Config",
            None,
            vec![ManagedField::new("version", FieldDescriptor::Int, true)],
        );
        let layout = static_layout(&c, None, &lc);
        match &layout.ty {
            IrType::Structure { fields, .. } => {
                assert_eq!(fields.len(), 2);
                assert!(matches!(fields[0], IrType::Opaque(_)));
            }
            _ => panic!("expected a structure"),
        }
    }

    #[test]
    fn is_enum_checks_only_the_direct_superclass() {
        let mut table = ClassTable::new();
        table.insert(class("Color", Some(ENUM_ROOT_CLASS), vec![]));
        table.insert(class("BrightColor", Some("Color"), vec![]));

        assert!(table.is_enum("Color"));
        assert!(!table.is_enum("BrightColor")); // two levels below the root
        assert!(!table.is_enum("Color/NoSuchClass"));
    }

    #[test]
    fn is_native_object_and_is_struct_walk_the_full_chain() {
        let mut table = ClassTable::new();
        table.insert(class("Handle", Some(NATIVE_OBJECT_MARKER_CLASS), vec![]));
        table.insert(class("FileHandle", Some("Handle"), vec![]));
        table.insert(class("Vec3", Some(STRUCT_MARKER_CLASS), vec![]));
        table.insert(class("Unrelated", None, vec![]));

        assert!(table.is_native_object("Handle"));
        assert!(table.is_native_object("FileHandle")); // transitive
        assert!(!table.is_native_object("Vec3"));
        assert!(table.is_struct("Vec3"));
        assert!(!table.is_struct("Unrelated"));
        assert!(!table.is_native_object("Unrelated"));
    }

    #[test]
    fn marker_chain_walk_terminates_on_a_cycle() {
        let mut table = ClassTable::new();
        table.insert(class("A", Some("B"), vec![]));
        table.insert(class("B", Some("A"), vec![]));

        assert!(!table.is_native_object("A"));
    }
}
