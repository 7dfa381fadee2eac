//! The IR type algebra, data layout engine, and managed-to-IR type mapper:
//! everything needed to turn class-file descriptors and managed classes
//! into low-level typed IR, independent of any particular backend.

pub mod class;
pub mod constexpr;
pub mod descriptor;
pub mod error;
pub mod ir_type;
pub mod layout;
pub mod linkage;
pub mod signature;

pub use class::{ClassTable, ManagedClass, ManagedField};
pub use descriptor::{parse_field_descriptor, parse_method_descriptor, FieldDescriptor, MethodDescriptor};
pub use error::{DescriptorError, MapperError};
pub use ir_type::{IntWidth, IrType, TypeArena};
pub use layout::LayoutCtx;
pub use signature::{build_signature, env_ptr_type, object_ptr_type, MethodShape};
