use pretty_assertions::assert_eq;
use sg_core::descriptors::DescriptorStore;
use sg_core::ir::{
    Annotation, AnnotationArg, BinOp, Block, Body, Call, ClassDecl, ClassKind, Decl, DeclId, Expr,
    ExprKind, File, FunctionDecl, IdAllocator, Module, Origin, Param, ReturnTarget, Stmt, Ty,
    VarDecl, When, WhenBranch,
};
use sg_core::source_map::{InMemorySourceProvider, SourceCache};
use sg_core::span::{FileId, Span};
use sg_core::trace::TraceType;
use sg_core::Result;
use sg_interpret::{HostFunctions, Interpreter, TraceEvent, TraceRecorder, Value};
use sg_transform::{Pipeline, TransformOptions};
use std::sync::Arc;

const SOURCE_FILE: FileId = FileId(0);
const SOURCE_PATH: &str = "Main.kt";
const RUNTIME_FILE: FileId = FileId(50);
const TRACER_FILE: FileId = FileId(51);

const SOURCE: &str = "@Traced([\"function-enter\", \"function-leave\"])
fun classify(n: Int): String {
    if (n < 0) return \"negative\"
    return \"n=\" + n
}
fun main(): String = classify(-1) + classify(2)
fun inspect(p: Int): FrameSnapshot {
    val x = p + 1
    return frameSnapshot()
}
suspend fun fetch(k: Int): Int = k * 2
fun load(): Int = fetch(20)
";

fn nth(needle: &str, n: usize) -> Span {
    let (start, _) = SOURCE
        .match_indices(needle)
        .nth(n)
        .unwrap_or_else(|| panic!("`{needle}` #{n} not found"));
    Span::new(SOURCE_FILE, start as i32, (start + needle.len()) as i32)
}

fn at(needle: &str) -> Span {
    nth(needle, 0)
}

/// `spyglass.frameSnapshot` plus the `spyglass.trace.Tracer` hooks, all body-less.
fn runtime(ids: &mut IdAllocator) -> (Vec<File>, DeclId) {
    let snapshot = ids.decl();
    let intrinsics = File::new(RUNTIME_FILE, "spyglass/Intrinsics.kt", "spyglass")
        .with_declarations(vec![Decl::function(
            snapshot,
            Span::undefined(RUNTIME_FILE),
            FunctionDecl::new("frameSnapshot", Ty::class("spyglass.FrameSnapshot")),
        )
        .with_origin(Origin::Library)
        .with_annotation(
            Annotation::new("spyglass.Intrinsic", Span::undefined(RUNTIME_FILE))
                .with_argument("kind", AnnotationArg::string("frame-snapshot")),
        )]);

    let function = Ty::class("spyglass.FunctionInfo");
    let location = Ty::class("spyglass.SourceLocation");
    let hooks: [(&str, Vec<Ty>); 8] = [
        ("enterFunction", vec![function.clone()]),
        ("leaveFunction", vec![function.clone()]),
        ("beforeCall", vec![function.clone(), location.clone()]),
        ("afterCall", vec![function.clone(), location.clone()]),
        ("suspensionPoint", vec![function, location]),
        ("spanEnter", vec![Ty::String]),
        ("spanLeave", vec![Ty::String]),
        ("event", vec![Ty::String]),
    ];
    let members = hooks
        .into_iter()
        .map(|(name, params)| {
            let params = params
                .into_iter()
                .enumerate()
                .map(|(index, ty)| {
                    Param::new(ids.var(), format!("arg{index}"), ty, Span::undefined(TRACER_FILE))
                })
                .collect();
            Decl::function(
                ids.decl(),
                Span::undefined(TRACER_FILE),
                FunctionDecl::new(name, Ty::Unit).with_params(params),
            )
            .with_origin(Origin::Library)
        })
        .collect();
    let tracer = Decl::class(
        ids.decl(),
        Span::undefined(TRACER_FILE),
        ClassDecl::new("Tracer")
            .with_kind(ClassKind::Object)
            .with_members(members),
    )
    .with_origin(Origin::Library);
    let tracer_file = File::new(TRACER_FILE, "spyglass/trace/Tracer.kt", "spyglass.trace")
        .with_declarations(vec![tracer]);

    (vec![intrinsics, tracer_file], snapshot)
}

fn build() -> (Module, SourceCache) {
    let mut ids = IdAllocator::new();
    let (external, snapshot) = runtime(&mut ids);
    let classify = ids.decl();

    let n = ids.var();
    let negative = Expr::binary(
        at("n < 0"),
        Ty::Boolean,
        BinOp::Lt,
        Expr::get_var(at("n < 0"), Ty::Int, n),
        Expr::int(at("0"), 0),
    );
    let early = Expr::new(
        at("if (n < 0) return \"negative\""),
        Ty::Unit,
        ExprKind::When(When {
            branches: vec![WhenBranch {
                condition: negative,
                result: Expr::ret(
                    at("return \"negative\""),
                    ReturnTarget::Function(classify),
                    Expr::string(at("\"negative\""), "negative"),
                ),
            }],
            otherwise: None,
        }),
    );
    let described = Expr::binary(
        at("\"n=\" + n"),
        Ty::String,
        BinOp::Add,
        Expr::string(at("\"n=\""), "n="),
        Expr::get_var(at("+ n").to_synthetic(), Ty::Int, n),
    );
    let classify_decl = Decl::function(
        classify,
        at("fun classify"),
        FunctionDecl::new("classify", Ty::String)
            .with_params(vec![Param::new(n, "n", Ty::Int, at("n: Int"))])
            .with_body(Body::Block(Block::new(vec![
                Stmt::Expr(early),
                Stmt::Expr(Expr::ret(
                    at("return \"n=\" + n"),
                    ReturnTarget::Function(classify),
                    described,
                )),
            ]))),
    )
    .with_annotation(
        Annotation::new("spyglass.trace.Traced", at("@Traced")).with_argument(
            "types",
            AnnotationArg::strings(["function-enter", "function-leave"]),
        ),
    );

    let call_classify = |span: Span, arg: i32, arg_span: Span| {
        Expr::call(
            span,
            Ty::String,
            Call::new(classify, vec![Some(Expr::int(arg_span, arg))]),
        )
    };
    let main = Decl::function(
        ids.decl(),
        at("fun main"),
        FunctionDecl::new("main", Ty::String).with_body(Body::Expression(Expr::binary(
            at("classify(-1) + classify(2)"),
            Ty::String,
            BinOp::Add,
            call_classify(at("classify(-1)"), -1, at("-1")),
            call_classify(at("classify(2)"), 2, at("2)")),
        ))),
    );

    let inspect = ids.decl();
    let p = ids.var();
    let x = ids.var();
    let next = Expr::binary(
        at("p + 1"),
        Ty::Int,
        BinOp::Add,
        Expr::get_var(at("p + 1"), Ty::Int, p),
        Expr::int(at("1\n"), 1),
    );
    let inspect_decl = Decl::function(
        inspect,
        at("fun inspect"),
        FunctionDecl::new("inspect", Ty::class("spyglass.FrameSnapshot"))
            .with_params(vec![Param::new(p, "p", Ty::Int, at("p: Int"))])
            .with_body(Body::Block(Block::new(vec![
                Stmt::Var(VarDecl::new(x, "x", Ty::Int, Some(next), at("val x"))),
                Stmt::Expr(Expr::ret(
                    at("return frameSnapshot()"),
                    ReturnTarget::Function(inspect),
                    Expr::call(
                        at("frameSnapshot()"),
                        Ty::class("spyglass.FrameSnapshot"),
                        Call::new(snapshot, Vec::new()),
                    ),
                )),
            ]))),
    );

    let fetch = ids.decl();
    let k = ids.var();
    let fetch_decl = Decl::function(
        fetch,
        at("suspend fun fetch"),
        FunctionDecl::new("fetch", Ty::Int)
            .suspending()
            .with_params(vec![Param::new(k, "k", Ty::Int, at("k: Int"))])
            .with_body(Body::Expression(Expr::binary(
                at("k * 2"),
                Ty::Int,
                BinOp::Mul,
                Expr::get_var(at("k * 2"), Ty::Int, k),
                Expr::int(at("2\n"), 2),
            ))),
    );
    let load = Decl::function(
        ids.decl(),
        at("fun load"),
        FunctionDecl::new("load", Ty::Int).with_body(Body::Expression(Expr::call(
            at("fetch(20)"),
            Ty::Int,
            Call::new(fetch, vec![Some(Expr::int(at("20"), 20))]),
        ))),
    );

    let mut module = Module::new("app");
    module.files = vec![File::new(SOURCE_FILE, SOURCE_PATH, "")
        .with_declarations(vec![classify_decl, main, inspect_decl, fetch_decl, load])];
    module.external = external;
    module.ids = ids;
    let sources =
        SourceCache::from_provider(InMemorySourceProvider::new().with_file(SOURCE_PATH, SOURCE));
    (module, sources)
}

fn transformed(
    module: &Module,
    sources: &SourceCache,
    options: TransformOptions,
) -> Result<Module> {
    let mut module = module.clone();
    Pipeline::new(options)
        .with_store(Arc::new(DescriptorStore::new()))
        .run(&mut module, sources)?;
    Ok(module)
}

fn recording(options: &TransformOptions) -> (HostFunctions, TraceRecorder) {
    let recorder = TraceRecorder::new();
    let mut host = HostFunctions::new();
    recorder.install(&mut host, &options.tracing.hooks);
    (host, recorder)
}

#[test]
fn instrumentation_preserves_results() -> Result<()> {
    let (module, sources) = build();
    let plain = Interpreter::new(&module).call_by_name("main", Vec::new())?;
    assert_eq!(plain, Value::string("negativen=2"));

    let options = TransformOptions::default();
    let traced = transformed(&module, &sources, options.clone())?;
    let (host, recorder) = recording(&options);
    let result = Interpreter::new(&traced)
        .with_host(host)
        .call_by_name("main", Vec::new())?;
    assert_eq!(result, plain);

    let events = recorder.events();
    let Some(TraceEvent::Enter(classify)) = events.first().cloned() else {
        panic!("classify must enter first, got {events:?}");
    };
    assert_eq!(
        events,
        vec![
            TraceEvent::Enter(classify),
            TraceEvent::Leave(classify),
            TraceEvent::Enter(classify),
            TraceEvent::Leave(classify),
        ]
    );
    Ok(())
}

#[test]
fn call_hooks_bracket_each_call() -> Result<()> {
    let (module, sources) = build();
    let mut options = TransformOptions::default();
    options.tracing.default_types = vec![TraceType::BeforeCall, TraceType::AfterCall];
    let traced = transformed(&module, &sources, options.clone())?;
    let (host, recorder) = recording(&options);
    let result = Interpreter::new(&traced)
        .with_host(host)
        .call_by_name("main", Vec::new())?;
    assert_eq!(result, Value::string("negativen=2"));

    let order: Vec<TraceType> = recorder
        .events()
        .iter()
        .map(TraceEvent::trace_type)
        .collect();
    let one_call = [
        TraceType::BeforeCall,
        TraceType::FunctionEnter,
        TraceType::FunctionLeave,
        TraceType::AfterCall,
    ];
    assert_eq!(order, [one_call, one_call].concat());

    let events = recorder.events();
    let (TraceEvent::BeforeCall { callee, .. }, TraceEvent::Enter(entered)) =
        (&events[0], &events[1])
    else {
        panic!("unexpected events {events:?}");
    };
    assert_eq!(callee, entered);
    Ok(())
}

#[test]
fn frame_snapshots_hold_local_values() -> Result<()> {
    let (module, sources) = build();
    let traced = transformed(&module, &sources, TransformOptions::default())?;
    let value = Interpreter::new(&traced).call_by_name("inspect", vec![Value::Int(40)])?;
    let Value::Snapshot(snapshot) = value else {
        panic!("inspect returns a snapshot, got {value}");
    };
    let values: Vec<Value> = snapshot.values.iter().map(|(_, value)| value.clone()).collect();
    assert_eq!(values, vec![Value::Int(40), Value::Int(41)]);
    Ok(())
}

#[test]
fn bodyless_calls_need_a_host_function() {
    let (module, _) = build();
    let err = Interpreter::new(&module)
        .call_by_name("inspect", vec![Value::Int(1)])
        .expect_err("frameSnapshot is only a declaration");
    assert!(
        err.to_string()
            .contains("`spyglass.frameSnapshot` has no body and no host function"),
        "{err}"
    );
}

#[test]
fn host_functions_shadow_bodies() -> Result<()> {
    let (module, _) = build();
    let mut interpreter = Interpreter::new(&module);
    interpreter
        .host_mut()
        .register("classify", |_| Ok(Value::string("stub")));
    assert_eq!(
        interpreter.call_by_name("main", Vec::new())?,
        Value::string("stubstub")
    );
    Ok(())
}

#[test]
fn suspend_calls_report_the_suspending_function() -> Result<()> {
    let (module, sources) = build();
    let mut options = TransformOptions::default();
    options.tracing.default_types = vec![
        TraceType::BeforeCall,
        TraceType::AfterCall,
        TraceType::SuspensionPoint,
    ];
    let store = Arc::new(DescriptorStore::new());
    let mut traced = module.clone();
    Pipeline::new(options.clone())
        .with_store(store.clone())
        .run(&mut traced, &sources)?;
    let (host, recorder) = recording(&options);
    let result = Interpreter::new(&traced)
        .with_host(host)
        .call_by_name("load", Vec::new())?;
    assert_eq!(result, Value::Int(40));

    let events = recorder.events();
    let [
        TraceEvent::BeforeCall { callee, at: before_at },
        TraceEvent::Suspension { function, at },
        TraceEvent::AfterCall {
            callee: after_callee,
            at: after_at,
        },
    ] = events.as_slice()
    else {
        panic!("expected before, suspension, after; got {events:?}");
    };
    assert_eq!(store.functions.resolve(*callee)?.simple_name, "fetch");
    assert_eq!(store.functions.resolve(*function)?.simple_name, "load");
    assert_eq!(after_callee, callee);
    assert_eq!((before_at, after_at), (at, at));
    assert_eq!(store.locations.resolve(*at)?.line(), 12);
    Ok(())
}
