use std::path::Path;
use std::sync::Arc;

use classforge_abi::target::{BackendKind, CompileTarget, TargetTriple};
use classforge_codegen_llvm::constexpr::lower_const_expr;
use classforge_codegen_llvm::{trivial_fn_abi, CodegenCtx};
use classforge_ir::class::{instance_layout, ClassTable, ManagedClass, ManagedField};
use classforge_ir::constexpr::ConstExpr;
use classforge_ir::descriptor::{parse_method_descriptor, FieldDescriptor};
use classforge_ir::signature::{build_signature, MethodShape};
use classforge_ir::{IrType, LayoutCtx, TypeArena};
use classforge_trampoline::traits::StubLinkageOf;
use classforge_trampoline::{Trampoline, TrampolineSet};
use inkwell::context::Context;
use tracing::debug;

/// A small standalone demonstration: lay out a two-field managed class,
/// build its getter's signature, collect the trampolines a caller in
/// another class would need, and declare the corresponding LLVM stubs.
///
/// `CLASSFORGE_FILTER=debug cargo run -p classforge` to see the layout and
/// declaration trace.
fn main() {
    init_classforge_logger();
    debug!("logging initialized");

    let triple = TargetTriple::parse("x86_64-unknown-linux-gnu").expect("known triple");
    let target = CompileTarget::from_triple(BackendKind::Llvm, triple);

    let arena = TypeArena::new();
    let layout_ctx = LayoutCtx::new(&target.data_layout, &arena);

    let point_class = ManagedClass {
        name: Arc::from("com/example/Point"),
        super_class: None,
        fields: vec![
            ManagedField::new("x", FieldDescriptor::Int, false),
            ManagedField::new("y", FieldDescriptor::Int, false),
            ManagedField::new("label", FieldDescriptor::Reference(Arc::from("java/lang/String")), false),
        ],
    };

    let table = ClassTable::new();
    let layout = instance_layout(&point_class, &table, target.target_triple.as_ref(), &layout_ctx)
        .expect("Point has no unresolved supertype");

    println!("Point instance size: {} bytes, align: {}", layout.size, layout.align);
    for field in &layout.fields {
        println!("  {} @ offset {}", field.name, field.offset);
    }

    let getter_descriptor = parse_method_descriptor("()I").expect("valid descriptor");
    let getter_signature = build_signature(
        &getter_descriptor,
        MethodShape {
            is_static: false,
            is_native: false,
        },
    );
    println!("getX signature: {getter_signature}");

    let mut trampolines = TrampolineSet::new();
    trampolines.insert(Trampoline::new_invoke_virtual(
        "com/example/Main",
        "com/example/Point",
        "getX",
        "()I",
    ));
    trampolines.insert(Trampoline::new_get_field(
        "com/example/Main",
        "com/example/Point",
        "x",
        "I",
    ));
    trampolines.insert(Trampoline::new_new("com/example/Main", "com/example/Point"));
    trampolines.insert(Trampoline::new_native_call(
        "com/example/Point",
        "com/example/Point",
        "hashCode0",
        "()I",
    ));

    let ll_context = Context::create();
    let mut ctx = CodegenCtx::new("demo_unit", &target, &ll_context, TypeArena::new());

    for trampoline in trampolines.iter() {
        let signature = trampoline
            .function_type()
            .expect("demo trampolines carry well-formed descriptors");
        let (params, ret) = match &signature {
            IrType::Function { params, ret, .. } => (params.clone(), (**ret).clone()),
            _ => unreachable!("function_type always returns IrType::Function"),
        };
        let abi = trivial_fn_abi(&params, &ret);
        let declared = ctx.declare_stub(trampoline, &abi);
        debug!("declared {} as {:?}", trampoline.mangled_symbol(), declared);
    }

    let i32_size = lower_const_expr(&ConstExpr::SizeOf(IrType::i32()), &ctx);
    debug!("sizeof(i32) lowered to a link-time constant: {:?}", i32_size);

    ctx.ll_module
        .print_to_file(Path::new("demo_unit.ll"))
        .expect("module should be printable");
}

fn init_classforge_logger() {
    let cfg = classforge_log::LoggerConfig::from_env("CLASSFORGE").unwrap_or_else(|_| classforge_log::LoggerConfig {
        log_writer: classforge_log::LogWriter::Stderr,
        filter: Err(std::env::VarError::NotPresent),
        color: Err(std::env::VarError::NotPresent),
        line_numbers: Err(std::env::VarError::NotPresent),
    });
    if let Err(err) = classforge_log::Logger::init_logger(cfg) {
        eprintln!("error initializing logger: {err}");
        std::process::exit(1);
    }
}
