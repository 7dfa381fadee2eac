//! Target triples, ABI-driven size/alignment rules, and the function-ABI
//! vocabulary (`FnAbi`/`ArgAbi`/`PassMode`) that the rest of the `classforge`
//! crates build on.
//!
//! This crate has no notion of managed types or class files: it only knows
//! about target platforms and the low-level shapes (`Size`, `Align`,
//! `TyAndLayout`) a backend needs. `classforge_ir` is the crate that maps
//! managed types onto these shapes.

pub mod calling_convention;
pub mod layout;
pub mod size_and_align;
pub mod target;

pub use layout::{BackendRepr, Layout, Primitive, TyAndLayout};
pub use size_and_align::{AbiAndPrefAlign, Align, AlignError, Size};
pub use target::{AddressSpace, BackendKind, CompileTarget, TargetDataLayout, TargetTriple, TargetTripleError};
