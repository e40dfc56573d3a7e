mod common;

use common::{callees, source_decl, TestModule};
use pretty_assertions::assert_eq;
use sg_core::descriptors::DescriptorStore;
use sg_core::error::Error;
use sg_core::ir::{
    Annotation, AnnotationArg, Block, Body, ClassDecl, Const, Decl, Expr, ExprKind, FunctionDecl,
    FunctionKind, Module, Stmt, Ty, VarDecl,
};
use sg_core::source_map::SourceCache;
use sg_core::trace::TraceType;
use sg_core::Result;
use sg_transform::{Pipeline, TransformOptions};
use std::sync::Arc;

const SOURCE: &str = "@Traced([\"span-enter\"])
class Service {
    @Traced([\"function-enter\", \"function-leave\"])
    fun quiet() {
        spanEnter(\"a\")
        run {
            event(\"b\")
        }
        spanLeave(\"a\")
    }
    fun brief() = event(\"c\")
}
";

fn traced(test: &TestModule, n: usize, types: &[&str]) -> Annotation {
    Annotation::new("spyglass.trace.Traced", test.nth("@Traced", n))
        .with_argument("types", AnnotationArg::strings(types.iter().copied()))
}

fn service_module() -> (Module, SourceCache, common::Runtime) {
    let mut test = TestModule::new(SOURCE);
    let rt = test.runtime.clone();
    let nested = Expr::block(
        test.at("run {"),
        Ty::Unit,
        vec![Stmt::Expr(rt.trace_call(TraceType::Event, test.at("event(\"b\")"), "b"))],
    );
    let quiet = Decl::function(
        test.ids.decl(),
        test.at("fun quiet"),
        FunctionDecl::new("quiet", Ty::Unit).with_body(Body::Block(Block::new(vec![
            Stmt::Expr(rt.trace_call(TraceType::SpanEnter, test.at("spanEnter"), "a")),
            Stmt::Expr(nested),
            Stmt::Expr(rt.trace_call(TraceType::SpanLeave, test.at("spanLeave"), "a")),
        ]))),
    )
    .with_annotation(traced(&test, 1, &["function-enter", "function-leave"]));
    let brief = Decl::function(
        test.ids.decl(),
        test.at("fun brief"),
        FunctionDecl::new("brief", Ty::Unit).with_body(Body::Expression(rt.trace_call(
            TraceType::Event,
            test.at("event(\"c\")"),
            "c",
        ))),
    );
    let service = Decl::class(
        test.ids.decl(),
        test.at("class Service"),
        ClassDecl::new("Service").with_members(vec![quiet, brief]),
    )
    .with_annotation(traced(&test, 0, &["span-enter"]));
    let (module, sources) = test.finish(vec![service]);
    (module, sources, rt)
}

fn count(found: &[sg_core::ir::DeclId], id: sg_core::ir::DeclId) -> usize {
    found.iter().filter(|callee| **callee == id).count()
}

#[test]
fn inactive_calls_are_removed_at_any_depth() -> Result<()> {
    let (mut module, sources, rt) = service_module();
    let report = Pipeline::new(TransformOptions::default())
        .with_store(Arc::new(DescriptorStore::new()))
        .run(&mut module, &sources)?;
    assert_eq!(report.changes_of("trace-removal"), 3);

    let quiet = callees(&source_decl(&module, "quiet"));
    assert_eq!(count(&quiet, rt.hook(TraceType::SpanEnter)), 1);
    assert_eq!(count(&quiet, rt.hook(TraceType::SpanLeave)), 0);
    assert_eq!(count(&quiet, rt.hook(TraceType::Event)), 0);
    assert_eq!(count(&quiet, rt.hook(TraceType::FunctionEnter)), 1);

    let brief = source_decl(&module, "brief");
    let body = brief.as_function().and_then(|function| function.body.as_ref());
    let Some(Body::Expression(expr)) = body else {
        panic!("brief keeps its expression body, found {body:?}");
    };
    assert_eq!(expr.kind, ExprKind::Const(Const::Unit));
    Ok(())
}

#[test]
fn default_types_keep_everything() -> Result<()> {
    let (mut module, sources, rt) = service_module();
    let mut options = TransformOptions::default();
    options.tracing.default_types = vec![TraceType::SpanLeave, TraceType::Event];
    let report = Pipeline::new(options)
        .with_store(Arc::new(DescriptorStore::new()))
        .run(&mut module, &sources)?;
    assert_eq!(report.changes_of("trace-removal"), 0);
    let quiet = callees(&source_decl(&module, "quiet"));
    assert_eq!(count(&quiet, rt.hook(TraceType::Event)), 1);
    Ok(())
}

const SETUP_SOURCE: &str = "fun setup() {
    val s = spanEnter(\"d\")
}
";

#[test]
fn calls_in_value_positions_cannot_be_removed() {
    let mut test = TestModule::new(SETUP_SOURCE);
    let rt = test.runtime.clone();
    let span = test.at("spanEnter(\"d\")");
    let binding = VarDecl::new(
        test.ids.var(),
        "s",
        Ty::Unit,
        Some(rt.trace_call(TraceType::SpanEnter, span, "d")),
        test.at("val s"),
    );
    let setup = Decl::function(
        test.ids.decl(),
        test.at("fun setup"),
        FunctionDecl::new("setup", Ty::Unit)
            .with_body(Body::Block(Block::new(vec![Stmt::Var(binding)]))),
    );
    let (mut module, sources) = test.finish(vec![setup]);

    let err = Pipeline::new(TransformOptions::default())
        .with_store(Arc::new(DescriptorStore::new()))
        .run(&mut module, &sources)
        .expect_err("an initializer cannot lose its value");
    match err {
        Error::UnsupportedContainer {
            callee,
            container,
            span: at,
        } => {
            assert_eq!(callee, "spyglass.trace.Tracer.spanEnter");
            assert_eq!(container, "an initializer");
            assert_eq!(at, span);
        }
        other => panic!("unexpected error {other}"),
    }
}

const LAMBDA_SOURCE: &str = "fun record() {
    val f = { event(\"z\") }
}
";

#[test]
fn lambda_expression_bodies_keep_their_calls() {
    let mut test = TestModule::new(LAMBDA_SOURCE);
    let rt = test.runtime.clone();
    let span = test.at("event(\"z\")");
    let lambda = Decl::function(
        test.ids.decl(),
        test.at("{ event"),
        FunctionDecl::new("<anonymous>", Ty::Unit)
            .with_kind(FunctionKind::Lambda)
            .with_body(Body::Expression(rt.trace_call(TraceType::Event, span, "z"))),
    );
    let binding = VarDecl::new(
        test.ids.var(),
        "f",
        Ty::Any,
        Some(Expr::new(
            test.at("{ event(\"z\") }"),
            Ty::Any,
            ExprKind::Lambda(Box::new(lambda)),
        )),
        test.at("val f"),
    );
    let record = Decl::function(
        test.ids.decl(),
        test.at("fun record"),
        FunctionDecl::new("record", Ty::Unit)
            .with_body(Body::Block(Block::new(vec![Stmt::Var(binding)]))),
    );
    let (mut module, sources) = test.finish(vec![record]);

    let err = Pipeline::new(TransformOptions::default())
        .with_store(Arc::new(DescriptorStore::new()))
        .run(&mut module, &sources)
        .expect_err("a lambda cannot lose its value");
    match err {
        Error::UnsupportedContainer {
            callee,
            container,
            span: at,
        } => {
            assert_eq!(callee, "spyglass.trace.Tracer.event");
            assert_eq!(container, "a lambda expression body");
            assert_eq!(at, span);
        }
        other => panic!("unexpected error {other}"),
    }
}
