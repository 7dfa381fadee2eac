use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::Deref;

use classforge_abi::calling_convention::function::FnAbi;
use classforge_abi::target::CompileTarget;
use classforge_ir::{IrType, TypeArena};
use classforge_trampoline::traits::{FunctionTypeOf, StubLinkageOf, TrampolineBackendTypes};
use classforge_trampoline::Trampoline;
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::targets::{TargetData, TargetTriple as LlvmTargetTriple};
use inkwell::types::FunctionType;
use inkwell::values::FunctionValue;
use tracing::{debug, instrument};

use crate::lir::ir_types::function_type_of;
use crate::lir::linkage_ext::{CallConvUtils, LinkageUtils, UnnamedAddressUtils, VisibilityUtils};

/// Everything a single compilation unit's trampoline declarations are
/// emitted against: the LLVM context/module pair, the type arena resolving
/// this unit's named structures, and a cache from mangled symbol to the
/// already-declared function value so `declare_stub` is idempotent.
pub struct CodegenCtx<'ll> {
    pub ll_context: &'ll Context,
    pub ll_module: Module<'ll>,
    pub type_arena: TypeArena,
    declared: RefCell<HashMap<String, FunctionValue<'ll>>>,
}

impl<'ll> Deref for CodegenCtx<'ll> {
    type Target = Context;

    fn deref(&self) -> &Self::Target {
        self.ll_context
    }
}

impl<'ll> CodegenCtx<'ll> {
    #[instrument(skip(target, ll_context, ll_module))]
    pub fn new(
        unit_name: &str,
        target: &CompileTarget,
        ll_context: &'ll Context,
        type_arena: TypeArena,
    ) -> CodegenCtx<'ll> {
        let ll_module = ll_context.create_module(unit_name);

        if let Some(triple) = target.target_triple_string() {
            ll_module.set_triple(&LlvmTargetTriple::create(&triple));
        }
        ll_module.set_data_layout(&TargetData::create(&target.data_layout_string()).get_data_layout());

        CodegenCtx {
            ll_context,
            ll_module,
            type_arena,
            declared: RefCell::new(HashMap::new()),
        }
    }

    pub fn get_declared(&self, mangled_symbol: &str) -> Option<FunctionValue<'ll>> {
        if let Some(f) = self.declared.borrow().get(mangled_symbol) {
            return Some(*f);
        }
        self.ll_module.get_function(mangled_symbol)
    }
}

impl<'ll> TrampolineBackendTypes for CodegenCtx<'ll> {
    type FunctionType = FunctionType<'ll>;
    type FunctionValue = FunctionValue<'ll>;
}

impl<'ll> FunctionTypeOf for CodegenCtx<'ll> {
    fn function_type_of(&self, abi: &FnAbi<IrType>) -> FunctionType<'ll> {
        let params: Vec<IrType> = abi.args.iter().map(|a| a.layout.ty.clone()).collect();
        function_type_of(&params, &abi.ret.layout.ty, self)
    }
}

impl<'ll> StubLinkageOf for CodegenCtx<'ll> {
    fn declare_stub(&mut self, trampoline: &Trampoline, abi: &FnAbi<IrType>) -> FunctionValue<'ll> {
        let symbol = trampoline.mangled_symbol();

        if let Some(existing) = self.get_declared(&symbol) {
            debug!("declare_stub({}) already declared", symbol);
            return existing;
        }

        let fn_ty = self.function_type_of(abi);
        let linkage = classforge_ir::linkage::Linkage::External.into_llvm_linkage();
        let fn_val = self.ll_module.add_function(&symbol, fn_ty, Some(linkage));

        let global = fn_val.as_global_value();
        global.set_visibility(classforge_ir::linkage::Visibility::Default.into_llvm_visibility());
        global.set_unnamed_address(classforge_ir::linkage::UnnamedAddress::None.into_llvm_unnamed_address());
        fn_val.set_call_conventions(classforge_ir::linkage::CallConv::C.into_llvm_call_conv());

        debug!("declare_stub({}) kind={:?} declared", symbol, trampoline.kind);
        self.declared.borrow_mut().insert(symbol, fn_val);
        fn_val
    }
}
