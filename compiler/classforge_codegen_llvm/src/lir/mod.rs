pub mod ir_types;
pub mod linkage_ext;
