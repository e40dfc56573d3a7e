mod common;

use common::{callees, source_decl, Runtime, TestModule};
use pretty_assertions::assert_eq;
use sg_core::descriptors::DescriptorStore;
use sg_core::error::Error;
use sg_core::ir::{
    Annotation, AnnotationArg, Block, Body, Call, Decl, DeclId, Expr, ExprKind, FunctionDecl,
    Param, ReturnTarget, Stmt, SymbolTable, Ty, When, WhenBranch,
};
use sg_core::source_map::{InMemorySourceProvider, SourceCache};
use sg_core::span::Span;
use sg_core::trace::TraceType;
use sg_core::Result;
use sg_transform::context::{Frame, TraversalContext};
use sg_transform::passes::{PassEnv, TracingInstrumenter};
use sg_transform::visit::{MutVisitor, Slot};
use sg_transform::{DescriptorFactory, Pipeline, RuntimeIndex, TransformOptions};
use std::sync::Arc;

const SOURCE: &str = "@Traced
fun pick(flag: Boolean): Int {
    if (flag) return 1
    return compute()
}
fun compute(): Int = 2
fun fail(): Nothing
@Traced([\"function-leave\"])
fun tick() {
    println(\"x\")
}
@Traced([\"after-call\"])
fun guarded(): Int {
    fail()
    return compute()
}
@Traced([\"function-enter\", \"function-leave\"])
fun answer(): Int = compute()
";

fn traced(span: Span, types: Option<&[&str]>) -> Annotation {
    let annotation = Annotation::new("spyglass.trace.Traced", span);
    match types {
        Some(types) => {
            annotation.with_argument("types", AnnotationArg::strings(types.iter().copied()))
        }
        None => annotation,
    }
}

struct Functions {
    pick: DeclId,
    compute: DeclId,
    fail: DeclId,
}

fn call(callee: DeclId, span: Span, ty: Ty) -> Expr {
    Expr::call(span, ty, Call::new(callee, Vec::new()))
}

fn build(test: &mut TestModule) -> (Vec<Decl>, Functions) {
    let rt: Runtime = test.runtime.clone();
    let pick = test.ids.decl();
    let compute = test.ids.decl();
    let fail = test.ids.decl();

    let flag = test.ids.var();
    let early_return = Expr::ret(
        test.at("return 1"),
        ReturnTarget::Function(pick),
        Expr::int(test.nth("1", 0), 1),
    );
    let branch = Expr::new(
        test.at("if (flag) return 1"),
        Ty::Unit,
        ExprKind::When(When {
            branches: vec![WhenBranch {
                condition: Expr::get_var(test.at("flag)"), Ty::Boolean, flag),
                result: early_return,
            }],
            otherwise: None,
        }),
    );
    let pick_decl = Decl::function(
        pick,
        test.at("fun pick"),
        FunctionDecl::new("pick", Ty::Int)
            .with_params(vec![Param::new(flag, "flag", Ty::Boolean, test.at("flag: Boolean"))])
            .with_body(Body::Block(Block::new(vec![
                Stmt::Expr(branch),
                Stmt::Expr(Expr::ret(
                    test.at("return compute()"),
                    ReturnTarget::Function(pick),
                    call(compute, test.nth("compute()", 0), Ty::Int),
                )),
            ]))),
    )
    .with_annotation(traced(test.nth("@Traced", 0), None));

    let compute_decl = Decl::function(
        compute,
        test.at("fun compute"),
        FunctionDecl::new("compute", Ty::Int)
            .with_body(Body::Expression(Expr::int(test.at("2"), 2))),
    );
    let fail_decl = Decl::function(
        fail,
        test.at("fun fail"),
        FunctionDecl::new("fail", Ty::Nothing),
    );

    let tick = Decl::function(
        test.ids.decl(),
        test.at("fun tick"),
        FunctionDecl::new("tick", Ty::Unit).with_body(Body::Block(Block::new(vec![Stmt::Expr(
            rt.println(test.at("println(\"x\")"), Expr::string(test.at("\"x\""), "x")),
        )]))),
    )
    .with_annotation(traced(test.nth("@Traced", 1), Some(&["function-leave"])));

    let guarded_id = test.ids.decl();
    let guarded = Decl::function(
        guarded_id,
        test.at("fun guarded"),
        FunctionDecl::new("guarded", Ty::Int).with_body(Body::Block(Block::new(vec![
            Stmt::Expr(call(fail, test.at("fail()"), Ty::Nothing)),
            Stmt::Expr(Expr::ret(
                test.nth("return compute()", 1),
                ReturnTarget::Function(guarded_id),
                call(compute, test.nth("compute()", 2), Ty::Int),
            )),
        ]))),
    )
    .with_annotation(traced(test.nth("@Traced", 2), Some(&["after-call"])));

    let answer = Decl::function(
        test.ids.decl(),
        test.at("fun answer"),
        FunctionDecl::new("answer", Ty::Int).with_body(Body::Expression(call(
            compute,
            test.nth("compute()", 3),
            Ty::Int,
        ))),
    )
    .with_annotation(traced(
        test.nth("@Traced", 3),
        Some(&["function-enter", "function-leave"]),
    ));

    (
        vec![pick_decl, compute_decl, fail_decl, tick, guarded, answer],
        Functions {
            pick,
            compute,
            fail,
        },
    )
}

fn instrumented() -> Result<(sg_core::ir::Module, Runtime, Functions)> {
    let mut test = TestModule::new(SOURCE);
    let (decls, functions) = build(&mut test);
    let runtime = test.runtime.clone();
    let (mut module, sources) = test.finish(decls);
    Pipeline::new(TransformOptions::default())
        .with_store(Arc::new(DescriptorStore::new()))
        .run(&mut module, &sources)?;
    Ok((module, runtime, functions))
}

fn count(callees: &[DeclId], id: DeclId) -> usize {
    callees.iter().filter(|callee| **callee == id).count()
}

fn body_stmts(decl: &Decl) -> &[Stmt] {
    match decl.as_function().and_then(|function| function.body.as_ref()) {
        Some(Body::Block(block)) => &block.stmts,
        other => panic!("expected a block body, found {other:?}"),
    }
}

#[test]
fn every_return_runs_the_leave_hook() -> Result<()> {
    let (module, rt, functions) = instrumented()?;
    let pick = source_decl(&module, "pick");
    let found = callees(&pick);
    assert_eq!(count(&found, rt.hook(TraceType::FunctionEnter)), 1);
    assert_eq!(count(&found, rt.hook(TraceType::FunctionLeave)), 2);
    assert_eq!(count(&found, rt.hook(TraceType::BeforeCall)), 1);
    assert_eq!(count(&found, rt.hook(TraceType::AfterCall)), 1);
    assert_eq!(count(&found, functions.compute), 1);

    let stmts = body_stmts(&pick);
    let first = stmts[0].as_expr().and_then(Expr::as_call).map(|call| call.callee);
    assert_eq!(first, Some(rt.hook(TraceType::FunctionEnter)));

    // `return v` becomes `return { val tmp = v; leave(); tmp }`
    let Some(ExprKind::Return(ret)) = stmts.last().and_then(Stmt::as_expr).map(|expr| &expr.kind)
    else {
        panic!("pick must still end with a return");
    };
    assert_eq!(ret.target, ReturnTarget::Function(functions.pick));
    let ExprKind::Block(block) = &ret.value.kind else {
        panic!("return value must be wrapped");
    };
    assert!(matches!(block.stmts[0], Stmt::Var(_)));
    let leave = block.stmts[1].as_expr().and_then(Expr::as_call).map(|call| call.callee);
    assert_eq!(leave, Some(rt.hook(TraceType::FunctionLeave)));
    assert!(matches!(block.last_expr().map(|expr| &expr.kind), Some(ExprKind::GetVar(_))));
    assert_eq!(ret.value.ty, Ty::Int);
    Ok(())
}

#[test]
fn unit_functions_leave_at_the_tail() -> Result<()> {
    let (module, rt, _) = instrumented()?;
    let tick = source_decl(&module, "tick");
    let stmts = body_stmts(&tick);
    assert_eq!(stmts.len(), 2);
    let last = stmts[1].as_expr().and_then(Expr::as_call).map(|call| call.callee);
    assert_eq!(last, Some(rt.hook(TraceType::FunctionLeave)));
    let found = callees(&tick);
    assert_eq!(count(&found, rt.hook(TraceType::FunctionEnter)), 0);
    assert_eq!(count(&found, rt.hook(TraceType::BeforeCall)), 0);
    Ok(())
}

#[test]
fn nothing_typed_calls_have_no_after_hook() -> Result<()> {
    let (module, rt, functions) = instrumented()?;
    let guarded = source_decl(&module, "guarded");
    let found = callees(&guarded);
    assert_eq!(count(&found, rt.hook(TraceType::AfterCall)), 1);
    assert_eq!(count(&found, functions.fail), 1);
    assert_eq!(
        body_stmts(&guarded)[0].as_expr().and_then(Expr::as_call).map(|call| call.callee),
        Some(functions.fail)
    );
    Ok(())
}

#[test]
fn expression_bodies_are_promoted_to_blocks() -> Result<()> {
    let (module, rt, functions) = instrumented()?;
    let answer = source_decl(&module, "answer");
    let stmts = body_stmts(&answer);
    assert_eq!(stmts.len(), 4);
    let callee = |stmt: &Stmt| stmt.as_expr().and_then(Expr::as_call).map(|call| call.callee);
    assert_eq!(callee(&stmts[0]), Some(rt.hook(TraceType::FunctionEnter)));
    let Stmt::Var(tmp) = &stmts[1] else {
        panic!("the value is bound before leaving");
    };
    assert_eq!(
        tmp.init.as_ref().and_then(Expr::as_call).map(|call| call.callee),
        Some(functions.compute)
    );
    assert_eq!(callee(&stmts[2]), Some(rt.hook(TraceType::FunctionLeave)));
    assert!(stmts[3].as_expr().is_some_and(Expr::is_return));
    Ok(())
}

#[test]
fn missing_hooks_fail_before_any_rewrite() {
    let mut test = TestModule::with_hooks(SOURCE, &[TraceType::SpanEnter, TraceType::SpanLeave]);
    let (decls, _) = build(&mut test);
    let (mut module, sources) = test.finish(decls);
    let before = module.clone();

    let err = Pipeline::new(TransformOptions::default())
        .with_store(Arc::new(DescriptorStore::new()))
        .run(&mut module, &sources)
        .expect_err("hooks are missing");
    match err {
        Error::Linkage { symbol } => assert!(symbol.starts_with("spyglass.trace.Tracer.")),
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(module, before);
}

#[test]
fn calls_outside_any_executable_are_skipped() -> Result<()> {
    let mut test = TestModule::new(SOURCE);
    let (decls, functions) = build(&mut test);
    let (module, _) = test.finish(decls);

    let mut options = TransformOptions::default();
    options.tracing.default_types = vec![TraceType::BeforeCall, TraceType::AfterCall];
    let symbols = SymbolTable::build(&module);
    let runtime = RuntimeIndex::build(&symbols, &options)?;
    let store = DescriptorStore::new();
    let sources = SourceCache::from_provider(InMemorySourceProvider::new());
    let env = PassEnv {
        options: &options,
        symbols: &symbols,
        runtime: &runtime,
        factory: DescriptorFactory::new(&store, &symbols, &sources, "app"),
    };

    let mut instrumenter = TracingInstrumenter::new(&env);
    let mut cx = TraversalContext::new(&symbols, module.ids);
    cx.scopes.push(Frame::class(functions.pick));
    let original = call(functions.compute, Span::synthetic(common::SOURCE_FILE), Ty::Int);
    let mut expr = original.clone();
    instrumenter.visit_expr(&mut expr, Slot::Statement, &mut cx)?;
    assert_eq!(expr, original);
    assert_eq!(instrumenter.calls, 0);
    Ok(())
}
