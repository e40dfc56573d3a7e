mod common;

use common::{source_decl, TestModule};
use pretty_assertions::assert_eq;
use sg_core::descriptors::{DescriptorRef, DescriptorStore};
use sg_core::error::Error;
use sg_core::intrinsics::IntrinsicKind;
use sg_core::ir::{
    Annotation, AnnotationArg, AnnotationsExt, Block, Body, Call, Const, Decl, Expr, ExprKind,
    File, FunctionDecl, Origin, Param, Stmt, Ty,
};
use sg_core::span::{FileId, Span};
use sg_core::Result;
use sg_transform::passes::NO_CAPTURE;
use sg_transform::{Pipeline, TransformOptions};
use std::sync::Arc;

const SOURCE: &str = "fun log(message: String, at: SourceLocation = here()) {
    println(at)
}
fun main() {
    log(\"a\")
    log(\"b\")
    log(\"c\", null)
}
";

const MARKER: &str = "spyglass.internal.CallerCapture";

fn location_ty() -> Ty {
    Ty::class("spyglass.SourceLocation")
}

fn arguments_of(module: &sg_core::ir::Module, function: &str) -> Vec<Vec<Option<Expr>>> {
    common::expressions(&source_decl(module, function))
        .into_iter()
        .filter_map(|expr| match expr.kind {
            ExprKind::Call(call) if call.args.len() == 2 => Some(call.args),
            _ => None,
        })
        .collect()
}

fn log_module() -> (sg_core::ir::Module, sg_core::source_map::SourceCache) {
    let mut test = TestModule::new(SOURCE);
    let rt = test.runtime.clone();
    let log = test.ids.decl();
    let message = Param::new(test.ids.var(), "message", Ty::String, test.at("message"));
    let at_var = test.ids.var();
    let at = Param::new(at_var, "at", location_ty(), test.at("at:")).with_default(
        rt.call_intrinsic(IntrinsicKind::Here, test.at("here()"), Vec::new()),
    );
    let log_decl = Decl::function(
        log,
        test.at("fun log"),
        FunctionDecl::new("log", Ty::Unit)
            .with_params(vec![message, at])
            .with_body(Body::Block(Block::new(vec![Stmt::Expr(rt.println(
                test.at("println(at)"),
                Expr::get_var(test.at("at)"), location_ty(), at_var),
            ))]))),
    );
    let call = |needle: &str, args: Vec<Option<Expr>>| {
        Stmt::Expr(Expr::call(test.at(needle), Ty::Unit, Call::new(log, args)))
    };
    let body = Block::new(vec![
        call("log(\"a\")", vec![Some(Expr::string(test.at("\"a\""), "a"))]),
        call("log(\"b\")", vec![Some(Expr::string(test.at("\"b\""), "b"))]),
        call(
            "log(\"c\", null)",
            vec![
                Some(Expr::string(test.at("\"c\""), "c")),
                Some(Expr::constant(test.at("null"), Const::Null)),
            ],
        ),
    ]);
    let main = Decl::function(
        test.ids.decl(),
        test.at("fun main"),
        FunctionDecl::new("main", Ty::Unit).with_body(Body::Block(body)),
    );
    test.finish(vec![log_decl, main])
}

#[test]
fn omitted_arguments_capture_each_call_site() -> Result<()> {
    let (mut module, sources) = log_module();
    let store = Arc::new(DescriptorStore::new());
    let report = Pipeline::new(TransformOptions::default())
        .with_store(store.clone())
        .run(&mut module, &sources)?;
    assert_eq!(report.changes_of("extract-caller-defaults"), 1);
    assert_eq!(report.changes_of("inject-caller-arguments"), 2);

    let log = source_decl(&module, "log");
    let marker = log
        .annotations
        .find_annotation(MARKER)
        .and_then(|marker| marker.argument("modes"))
        .and_then(AnnotationArg::as_strings);
    assert_eq!(marker, Some(vec![NO_CAPTURE, "here"]));
    let function = log.as_function().expect("log is a function");
    assert!(function.params.iter().all(|param| param.default.is_none()));

    let calls = arguments_of(&module, "main");
    assert_eq!(calls.len(), 3);
    let lines = calls[..2]
        .iter()
        .map(|args| match args[1].as_ref().map(|arg| &arg.kind) {
            Some(ExprKind::Descriptor(DescriptorRef::Location(handle))) => {
                Ok(store.locations.resolve(*handle)?.line())
            }
            other => panic!("expected a captured location, found {other:?}"),
        })
        .collect::<Result<Vec<_>>>()?;
    assert_eq!(lines, vec![5, 6]);
    assert_eq!(
        calls[2][1].as_ref().map(|arg| &arg.kind),
        Some(&ExprKind::Const(Const::Null))
    );
    Ok(())
}

#[test]
fn rerunning_the_pipeline_changes_nothing() -> Result<()> {
    let (mut module, sources) = log_module();
    let pipeline = Pipeline::new(TransformOptions::default())
        .with_store(Arc::new(DescriptorStore::new()));
    pipeline.run(&mut module, &sources)?;
    let once = module.clone();

    let report = pipeline.run(&mut module, &sources)?;
    assert_eq!(report.total_changes, 0);
    assert_eq!(module, once);
    Ok(())
}

fn library_function(
    test: &mut TestModule,
    name: &str,
    modes: &[&str],
) -> (sg_core::ir::DeclId, File) {
    let file = FileId(103);
    let id = test.ids.decl();
    let params = vec![
        Param::new(test.ids.var(), "value", Ty::Int, Span::undefined(file)),
        Param::new(test.ids.var(), "at", location_ty(), Span::undefined(file)),
    ];
    let decl = Decl::function(
        id,
        Span::undefined(file),
        FunctionDecl::new(name, Ty::Unit).with_params(params),
    )
    .with_origin(Origin::Library)
    .with_annotation(
        Annotation::new(MARKER, Span::synthetic(file))
            .with_argument("modes", AnnotationArg::strings(modes.iter().copied())),
    );
    (
        id,
        File::new(file, "lib/Remote.kt", "lib").with_declarations(vec![decl]),
    )
}

const REMOTE_SOURCE: &str = "fun main() {
    remote(1)
}
";

fn remote_module(modes: &[&str]) -> (sg_core::ir::Module, sg_core::source_map::SourceCache) {
    let mut test = TestModule::new(REMOTE_SOURCE);
    let (remote, library) = library_function(&mut test, "remote", modes);
    let span = test.at("remote(1)");
    let call = Expr::call(
        span,
        Ty::Unit,
        Call::new(remote, vec![Some(Expr::int(test.at("1"), 1))]),
    );
    let main = Decl::function(
        test.ids.decl(),
        test.at("fun main"),
        FunctionDecl::new("main", Ty::Unit).with_body(Body::Block(Block::new(vec![Stmt::Expr(
            call,
        )]))),
    );
    let (mut module, sources) = test.finish(vec![main]);
    module.external.push(library);
    (module, sources)
}

#[test]
fn markers_from_other_modules_are_honored() -> Result<()> {
    let (mut module, sources) = remote_module(&[NO_CAPTURE, "here"]);
    Pipeline::new(TransformOptions::default())
        .with_store(Arc::new(DescriptorStore::new()))
        .run(&mut module, &sources)?;
    let calls = arguments_of(&module, "main");
    assert_eq!(calls.len(), 1);
    assert!(matches!(
        calls[0][1].as_ref().map(|arg| &arg.kind),
        Some(ExprKind::Descriptor(DescriptorRef::Location(_)))
    ));
    Ok(())
}

#[test]
fn mode_list_must_match_the_parameters() {
    let (mut module, sources) = remote_module(&["here"]);
    let err = Pipeline::new(TransformOptions::default())
        .with_store(Arc::new(DescriptorStore::new()))
        .run(&mut module, &sources)
        .expect_err("one mode for two parameters");
    match err {
        Error::ModeListMismatch {
            function,
            modes,
            params,
        } => {
            assert_eq!(function, "lib.remote");
            assert_eq!((modes, params), (1, 2));
        }
        other => panic!("unexpected error {other}"),
    }
}

const TYPED_SOURCE: &str = "fun describe(value: Int, ty: TypeInfo = typeOf<Int>()) {
    println(ty)
}
fun main() {
    describe(1)
}
";

#[test]
fn type_arguments_of_a_default_reach_the_call_site() -> Result<()> {
    let mut test = TestModule::new(TYPED_SOURCE);
    let rt = test.runtime.clone();
    let describe = test.ids.decl();
    let ty_var = test.ids.var();
    let type_info = common::shape_ty(IntrinsicKind::TypeOf);
    let params = vec![
        Param::new(test.ids.var(), "value", Ty::Int, test.at("value")),
        Param::new(ty_var, "ty", type_info.clone(), test.at("ty:")).with_default(
            rt.call_typed_intrinsic(IntrinsicKind::TypeOf, test.at("typeOf<Int>()"), Ty::Int),
        ),
    ];
    let describe_decl = Decl::function(
        describe,
        test.at("fun describe"),
        FunctionDecl::new("describe", Ty::Unit)
            .with_params(params)
            .with_body(Body::Block(Block::new(vec![Stmt::Expr(rt.println(
                test.at("println(ty)"),
                Expr::get_var(test.at("ty)"), type_info, ty_var),
            ))]))),
    );
    let call = Expr::call(
        test.at("describe(1)"),
        Ty::Unit,
        Call::new(describe, vec![Some(Expr::int(test.at("1)"), 1))]),
    );
    let main = Decl::function(
        test.ids.decl(),
        test.at("fun main"),
        FunctionDecl::new("main", Ty::Unit)
            .with_body(Body::Block(Block::new(vec![Stmt::Expr(call)]))),
    );
    let (mut module, sources) = test.finish(vec![describe_decl, main]);

    let store = Arc::new(DescriptorStore::new());
    let report = Pipeline::new(TransformOptions::default())
        .with_store(store.clone())
        .run(&mut module, &sources)?;
    assert_eq!(report.changes_of("extract-caller-defaults"), 1);
    assert_eq!(report.changes_of("inject-caller-arguments"), 1);

    let describe = source_decl(&module, "describe");
    let modes = describe
        .annotations
        .find_annotation(MARKER)
        .and_then(|marker| marker.argument("modes"))
        .and_then(AnnotationArg::as_strings);
    assert_eq!(modes, Some(vec![NO_CAPTURE, "type-of"]));

    let calls = arguments_of(&module, "main");
    assert_eq!(calls.len(), 1);
    let Some(ExprKind::Descriptor(DescriptorRef::Type(handle))) =
        calls[0][1].as_ref().map(|arg| &arg.kind)
    else {
        panic!("expected a type descriptor, found {:?}", calls[0][1]);
    };
    assert_eq!(store.types.resolve(*handle)?.qualified_name, "Int");
    Ok(())
}
