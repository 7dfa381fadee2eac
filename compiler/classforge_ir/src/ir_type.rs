//! The low-level IR type algebra.
//!
//! This is a closed, structural sum type: every IR type a managed class,
//! field, or method descriptor can be lowered to is one of the variants
//! below. There is no open-ended "user type" escape hatch — named types
//! (`Structure`, `Opaque`) are resolved through a [`TypeArena`] instead of
//! being intrinsically recursive Rust values, the same way the rest of this
//! workspace avoids cyclic owned graphs.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

/// The width, in bits, of an integer IR type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    pub fn bits(self) -> u32 {
        match self {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
        }
    }
}

/// A low-level IR type.
///
/// `Structure` and `Function` fields are boxed/vec'd so the type is
/// `Sized`; a `Structure`'s own identity (for a *named* structure) is
/// carried by `name` and resolved through the `TypeArena`, not by deep
/// structural equality of a recursive definition. Equality and hashing are
/// implemented by hand below rather than derived, because a named type's
/// identity is its name alone: a forward-declared `Opaque("Counter")` and
/// the `Structure{name: Some("Counter"), ..}` that later completes it must
/// compare equal, even though their payloads differ completely.
#[derive(Debug, Clone)]
pub enum IrType {
    /// No value (`void` return type).
    Void,
    /// A signed or unsigned integer of the given width.
    Integer(IntWidth),
    /// An IEEE-754 single-precision float.
    Float,
    /// An IEEE-754 double-precision float.
    Double,
    /// A pointer to a value of the pointee type.
    Pointer(Box<IrType>),
    /// A forward-declared named type whose definition is not yet known,
    /// or a type whose internals are intentionally not modeled (e.g. the
    /// execution-environment block).
    Opaque(Arc<str>),
    /// An aggregate of fields in declaration order.
    Structure {
        name: Option<Arc<str>>,
        fields: Vec<IrType>,
        packed: bool,
    },
    /// A function type: the hidden-parameter-expanded signature this
    /// workspace actually emits, not the managed descriptor's surface form.
    Function {
        ret: Box<IrType>,
        params: Vec<IrType>,
        varargs: bool,
    },
    /// A fixed-length homogeneous array.
    Array { elem: Box<IrType>, count: u64 },
}

/// Named types (`Opaque` and named `Structure`) compare equal by name
/// alone, so a forward declaration and its later definition are the same
/// type; unnamed structures and every other variant compare structurally.
impl PartialEq for IrType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (IrType::Void, IrType::Void) => true,
            (IrType::Integer(a), IrType::Integer(b)) => a == b,
            (IrType::Float, IrType::Float) => true,
            (IrType::Double, IrType::Double) => true,
            (IrType::Pointer(a), IrType::Pointer(b)) => a == b,
            (IrType::Opaque(a), IrType::Opaque(b)) => a == b,
            (IrType::Opaque(name), IrType::Structure { name: Some(sname), .. })
            | (IrType::Structure { name: Some(sname), .. }, IrType::Opaque(name)) => name == sname,
            (IrType::Structure { name: Some(a), .. }, IrType::Structure { name: Some(b), .. }) => a == b,
            (
                IrType::Structure {
                    name: None,
                    fields: f1,
                    packed: p1,
                },
                IrType::Structure {
                    name: None,
                    fields: f2,
                    packed: p2,
                },
            ) => f1 == f2 && p1 == p2,
            (
                IrType::Function {
                    ret: r1,
                    params: p1,
                    varargs: v1,
                },
                IrType::Function {
                    ret: r2,
                    params: p2,
                    varargs: v2,
                },
            ) => r1 == r2 && p1 == p2 && v1 == v2,
            (IrType::Array { elem: e1, count: c1 }, IrType::Array { elem: e2, count: c2 }) => e1 == e2 && c1 == c2,
            _ => false,
        }
    }
}

impl Eq for IrType {}

/// Kept consistent with `PartialEq`: an `Opaque` and a named `Structure`
/// sharing a name must land in the same hash bucket, so both tag their
/// hash with the name alone rather than with the full payload.
impl Hash for IrType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            IrType::Void => 0u8.hash(state),
            IrType::Integer(w) => {
                1u8.hash(state);
                w.hash(state);
            }
            IrType::Float => 2u8.hash(state),
            IrType::Double => 3u8.hash(state),
            IrType::Pointer(inner) => {
                4u8.hash(state);
                inner.hash(state);
            }
            IrType::Opaque(name) => {
                5u8.hash(state);
                name.hash(state);
            }
            IrType::Structure { name: Some(name), .. } => {
                5u8.hash(state);
                name.hash(state);
            }
            IrType::Structure {
                name: None,
                fields,
                packed,
            } => {
                6u8.hash(state);
                fields.hash(state);
                packed.hash(state);
            }
            IrType::Function { ret, params, varargs } => {
                7u8.hash(state);
                ret.hash(state);
                params.hash(state);
                varargs.hash(state);
            }
            IrType::Array { elem, count } => {
                8u8.hash(state);
                elem.hash(state);
                count.hash(state);
            }
        }
    }
}

impl IrType {
    pub fn ptr(pointee: IrType) -> IrType {
        IrType::Pointer(Box::new(pointee))
    }

    pub fn i8() -> IrType {
        IrType::Integer(IntWidth::W8)
    }

    pub fn i16() -> IrType {
        IrType::Integer(IntWidth::W16)
    }

    pub fn i32() -> IrType {
        IrType::Integer(IntWidth::W32)
    }

    pub fn i64() -> IrType {
        IrType::Integer(IntWidth::W64)
    }

    pub fn opaque(name: impl Into<Arc<str>>) -> IrType {
        IrType::Opaque(name.into())
    }

    pub fn is_zero_sized_void(&self) -> bool {
        matches!(self, IrType::Void)
    }
}

impl fmt::Display for IrType {
    /// A human-readable rendering for diagnostics; the exact format is not
    /// part of this crate's contract.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Void => write!(f, "void"),
            IrType::Integer(w) => write!(f, "i{}", w.bits()),
            IrType::Float => write!(f, "float"),
            IrType::Double => write!(f, "double"),
            IrType::Pointer(inner) => write!(f, "{}*", inner),
            IrType::Opaque(name) => write!(f, "opaque({})", name),
            IrType::Structure {
                name: Some(name), ..
            } => write!(f, "%{}", name),
            IrType::Structure {
                name: None, fields, ..
            } => {
                write!(f, "{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", field)?;
                }
                write!(f, "}}")
            }
            IrType::Function {
                ret,
                params,
                varargs,
            } => {
                write!(f, "{} (", ret)?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                if *varargs {
                    write!(f, ", ...")?;
                }
                write!(f, ")")
            }
            IrType::Array { elem, count } => write!(f, "[{} x {}]", count, elem),
        }
    }
}

/// Registers named structure/opaque definitions and resolves forward
/// declarations, implementing the "structural interning" design the class
/// hierarchy's cyclic references need: a class's fields can reference its
/// own type, or a type not yet laid out, without the Rust value graph
/// itself being cyclic.
///
/// Shareable across the per-class workers the concurrency model allows
/// (`RwLock` guards the one mutable table), unlike a plain `RefCell`.
#[derive(Default)]
pub struct TypeArena {
    named: RwLock<HashMap<Arc<str>, IrType>>,
}

impl TypeArena {
    pub fn new() -> Self {
        TypeArena::default()
    }

    /// Declares `name` as an as-yet-undefined opaque type, returning a
    /// reference to it that can be embedded in other types before its
    /// definition is known.
    pub fn declare_opaque(&self, name: impl Into<Arc<str>>) -> IrType {
        let name = name.into();
        let mut table = self.named.write().unwrap();
        table.entry(name.clone()).or_insert(IrType::Opaque(name.clone()));
        IrType::Opaque(name)
    }

    /// Completes (or replaces) a named type's definition.
    pub fn define(&self, name: impl Into<Arc<str>>, ty: IrType) {
        let name = name.into();
        self.named.write().unwrap().insert(name, ty);
    }

    /// Looks up a named type's current definition (`Opaque` if declared but
    /// not yet defined).
    pub fn resolve(&self, name: &str) -> Option<IrType> {
        self.named.read().unwrap().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_forward_declaration_is_completed_by_later_definition() {
        let arena = TypeArena::new();
        let forward = arena.declare_opaque("Counter");
        assert_eq!(forward, IrType::Opaque("Counter".into()));

        arena.define(
            "Counter",
            IrType::Structure {
                name: Some("Counter".into()),
                fields: vec![IrType::i32()],
                packed: false,
            },
        );

        let resolved = arena.resolve("Counter").unwrap();
        // Same name, so the forward declaration and its completed
        // definition are the same type even though one is an `Opaque`
        // and the other is a fully fielded `Structure`.
        assert_eq!(resolved, forward);
        assert!(matches!(resolved, IrType::Structure { .. }));
    }

    #[test]
    fn opaque_and_structure_with_different_names_are_not_equal() {
        let a = IrType::opaque("Counter");
        let b = IrType::Structure {
            name: Some("Widget".into()),
            fields: vec![IrType::i32()],
            packed: false,
        };
        assert_ne!(a, b);
    }

    #[test]
    fn unnamed_structures_compare_structurally() {
        let a = IrType::Structure {
            name: None,
            fields: vec![IrType::i32(), IrType::i8()],
            packed: false,
        };
        let b = IrType::Structure {
            name: None,
            fields: vec![IrType::i32(), IrType::i8()],
            packed: false,
        };
        let c = IrType::Structure {
            name: None,
            fields: vec![IrType::i8(), IrType::i32()],
            packed: false,
        };
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn display_is_nonempty_for_every_variant() {
        let cases = vec![
            IrType::Void,
            IrType::i32(),
            IrType::Float,
            IrType::Double,
            IrType::ptr(IrType::i8()),
            IrType::opaque("ExecEnv"),
            IrType::Structure {
                name: None,
                fields: vec![IrType::i32(), IrType::i64()],
                packed: false,
            },
            IrType::Function {
                ret: Box::new(IrType::Void),
                params: vec![IrType::i32()],
                varargs: false,
            },
            IrType::Array {
                elem: Box::new(IrType::i8()),
                count: 4,
            },
        ];
        for case in cases {
            assert!(!format!("{case}").is_empty());
        }
    }
}
