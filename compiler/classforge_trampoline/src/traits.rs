//! The seam a backend implements to turn trampolines into declared stubs.
//!
//! Instruction lowering (basic blocks, places, operands) has no
//! counterpart here — this subsystem stops at *declaring* linkage, it
//! never lowers a function body. What's left is the "given a type/
//! trampoline, produce the backend's handle for it" shape.

use classforge_abi::calling_convention::function::FnAbi;
use classforge_ir::IrType;

use crate::trampoline::Trampoline;

/// Backend-specific handles this crate is generic over: a function type and
/// a declared function/global value. A backend (e.g. `classforge_codegen_llvm`)
/// implements this with its own concrete types (`inkwell::types::FunctionType`,
/// `inkwell::values::FunctionValue`, ...).
pub trait TrampolineBackendTypes {
    type FunctionType: Clone;
    type FunctionValue: Clone;
}

/// Derives a backend function type from an IR-level function shape.
pub trait FunctionTypeOf: TrampolineBackendTypes {
    fn function_type_of(&self, abi: &FnAbi<IrType>) -> Self::FunctionType;
}

/// Declares (but does not define) the stub a trampoline needs, returning
/// the backend's handle to the resulting symbol. Implementations are
/// expected to be idempotent: declaring the same trampoline's mangled
/// symbol twice returns the existing declaration rather than redeclaring.
pub trait StubLinkageOf: TrampolineBackendTypes + FunctionTypeOf {
    fn declare_stub(&mut self, trampoline: &Trampoline, abi: &FnAbi<IrType>) -> Self::FunctionValue;
}
