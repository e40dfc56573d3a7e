#![allow(dead_code)]

use sg_core::intrinsics::{IntrinsicKind, ResultShape};
use sg_core::ir::visit::{walk_expr, Visitor};
use sg_core::ir::{
    Annotation, AnnotationArg, Call, ClassDecl, ClassKind, Decl, DeclId, Expr, File,
    FunctionDecl, IdAllocator, Module, Origin, Param, Ty,
};
use sg_core::source_map::{InMemorySourceProvider, SourceCache};
use sg_core::span::{FileId, Span};
use sg_core::trace::TraceType;
use std::collections::HashMap;

pub const SOURCE_FILE: FileId = FileId(0);
pub const SOURCE_PATH: &str = "Foo.kt";
pub const MODULE_NAME: &str = "app";

const INTRINSICS_FILE: FileId = FileId(100);
const TRACER_FILE: FileId = FileId(101);
const CONSOLE_FILE: FileId = FileId(102);

pub fn shape_ty(kind: IntrinsicKind) -> Ty {
    match kind.shape() {
        ResultShape::Location => Ty::class("spyglass.SourceLocation"),
        ResultShape::Type => Ty::class("spyglass.TypeInfo"),
        ResultShape::Class => Ty::class("spyglass.ClassInfo"),
        ResultShape::Function => Ty::class("spyglass.FunctionInfo"),
        ResultShape::Property => Ty::class("spyglass.PropertyInfo"),
        ResultShape::Snapshot => Ty::class("spyglass.FrameSnapshot"),
        ResultShape::Int => Ty::Int,
        ResultShape::String => Ty::String,
    }
}

fn hook_function(ty: TraceType) -> (&'static str, Vec<(&'static str, Ty)>) {
    let function = Ty::class("spyglass.FunctionInfo");
    let location = Ty::class("spyglass.SourceLocation");
    match ty {
        TraceType::FunctionEnter => ("enterFunction", vec![("function", function)]),
        TraceType::FunctionLeave => ("leaveFunction", vec![("function", function)]),
        TraceType::BeforeCall => ("beforeCall", vec![("callee", function), ("at", location)]),
        TraceType::AfterCall => ("afterCall", vec![("callee", function), ("at", location)]),
        TraceType::SuspensionPoint => (
            "suspensionPoint",
            vec![("function", function), ("at", location)],
        ),
        TraceType::SpanEnter => ("spanEnter", vec![("name", Ty::String)]),
        TraceType::SpanLeave => ("spanLeave", vec![("name", Ty::String)]),
        TraceType::Event => ("event", vec![("name", Ty::String)]),
    }
}

/// Declarations of the runtime library a test module links against.
#[derive(Debug, Clone)]
pub struct Runtime {
    pub intrinsics: HashMap<IntrinsicKind, DeclId>,
    pub hooks: HashMap<TraceType, DeclId>,
    pub println: DeclId,
}

impl Runtime {
    pub fn intrinsic(&self, kind: IntrinsicKind) -> DeclId {
        self.intrinsics[&kind]
    }

    pub fn hook(&self, ty: TraceType) -> DeclId {
        self.hooks[&ty]
    }

    /// A call of the intrinsic, typed the way the host types it.
    pub fn call_intrinsic(&self, kind: IntrinsicKind, span: Span, args: Vec<Expr>) -> Expr {
        Expr::call(
            span,
            shape_ty(kind),
            Call::new(self.intrinsic(kind), args.into_iter().map(Some).collect()),
        )
    }

    pub fn call_typed_intrinsic(&self, kind: IntrinsicKind, span: Span, ty: Ty) -> Expr {
        Expr::call(
            span,
            shape_ty(kind),
            Call::new(self.intrinsic(kind), Vec::new()).with_type_args(vec![ty]),
        )
    }

    pub fn println(&self, span: Span, arg: Expr) -> Expr {
        Expr::call(span, Ty::Unit, Call::new(self.println, vec![Some(arg)]))
    }

    /// `spanEnter("name")`, `event("name")`, ...
    pub fn trace_call(&self, ty: TraceType, span: Span, name: &str) -> Expr {
        Expr::call(
            span,
            Ty::Unit,
            Call::new(self.hook(ty), vec![Some(Expr::string(span, name))]),
        )
    }

    pub fn is_hook(&self, callee: DeclId) -> Option<TraceType> {
        self.hooks
            .iter()
            .find(|(_, id)| **id == callee)
            .map(|(ty, _)| *ty)
    }
}

fn runtime_files(ids: &mut IdAllocator, hooks: &[TraceType]) -> (Vec<File>, Runtime) {
    let mut intrinsics = HashMap::new();
    let mut declarations = Vec::new();
    for kind in IntrinsicKind::all() {
        let symbol = kind.spec().canonical_symbol;
        let name = symbol.rsplit_once('.').map_or(symbol, |(_, name)| name);
        let params = match kind {
            IntrinsicKind::FunctionOf
            | IntrinsicKind::FunctionOfHash
            | IntrinsicKind::PropertyOf => vec![Param::new(
                ids.var(),
                "reference",
                Ty::Any,
                Span::undefined(INTRINSICS_FILE),
            )],
            _ => Vec::new(),
        };
        let id = ids.decl();
        intrinsics.insert(kind, id);
        declarations.push(
            Decl::function(
                id,
                Span::undefined(INTRINSICS_FILE),
                FunctionDecl::new(name, shape_ty(kind)).with_params(params),
            )
            .with_origin(Origin::Library)
            .with_annotation(
                Annotation::new("spyglass.Intrinsic", Span::undefined(INTRINSICS_FILE))
                    .with_argument("kind", AnnotationArg::string(kind.name())),
            ),
        );
    }
    let intrinsics_file = File::new(INTRINSICS_FILE, "spyglass/Intrinsics.kt", "spyglass")
        .with_declarations(declarations);

    let mut hook_ids = HashMap::new();
    let mut members = Vec::new();
    for ty in hooks {
        let (name, params) = hook_function(*ty);
        let params = params
            .into_iter()
            .map(|(name, ty)| Param::new(ids.var(), name, ty, Span::undefined(TRACER_FILE)))
            .collect();
        let id = ids.decl();
        hook_ids.insert(*ty, id);
        members.push(
            Decl::function(
                id,
                Span::undefined(TRACER_FILE),
                FunctionDecl::new(name, Ty::Unit).with_params(params),
            )
            .with_origin(Origin::Library),
        );
    }
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

    let println = ids.decl();
    let message = Param::new(ids.var(), "message", Ty::Any, Span::undefined(CONSOLE_FILE));
    let console_file = File::new(CONSOLE_FILE, "kotlin/io/Console.kt", "kotlin.io")
        .with_declarations(vec![Decl::function(
            println,
            Span::undefined(CONSOLE_FILE),
            FunctionDecl::new("println", Ty::Unit).with_params(vec![message]),
        )
        .with_origin(Origin::Library)]);

    (
        vec![intrinsics_file, tracer_file, console_file],
        Runtime {
            intrinsics,
            hooks: hook_ids,
            println,
        },
    )
}

/// Builds a one-file module over `text`; spans are located by searching the text.
pub struct TestModule {
    pub text: &'static str,
    pub ids: IdAllocator,
    pub runtime: Runtime,
    external: Vec<File>,
}

impl TestModule {
    pub fn new(text: &'static str) -> Self {
        Self::with_hooks(text, &TraceType::ALL)
    }

    pub fn with_hooks(text: &'static str, hooks: &[TraceType]) -> Self {
        let mut ids = IdAllocator::new();
        let (external, runtime) = runtime_files(&mut ids, hooks);
        Self {
            text,
            ids,
            runtime,
            external,
        }
    }

    /// Span of the first occurrence of `needle`.
    pub fn at(&self, needle: &str) -> Span {
        self.nth(needle, 0)
    }

    pub fn nth(&self, needle: &str, n: usize) -> Span {
        let (start, _) = self
            .text
            .match_indices(needle)
            .nth(n)
            .unwrap_or_else(|| panic!("`{needle}` #{n} not found in the test source"));
        Span::new(SOURCE_FILE, start as i32, (start + needle.len()) as i32)
    }

    pub fn finish(self, declarations: Vec<Decl>) -> (Module, SourceCache) {
        let mut module = Module::new(MODULE_NAME);
        module.files =
            vec![File::new(SOURCE_FILE, SOURCE_PATH, "").with_declarations(declarations)];
        module.external = self.external;
        module.ids = self.ids;
        let sources = SourceCache::from_provider(
            InMemorySourceProvider::new().with_file(SOURCE_PATH, self.text),
        );
        (module, sources)
    }
}

pub fn source_decl(module: &Module, name: &str) -> Decl {
    fn find(decls: &[Decl], name: &str) -> Option<Decl> {
        decls.iter().find_map(|decl| {
            if decl.name() == Some(name) {
                return Some(decl.clone());
            }
            decl.as_class().and_then(|class| find(&class.members, name))
        })
    }
    find(&module.files[0].declarations, name)
        .unwrap_or_else(|| panic!("declaration `{name}` not found"))
}

/// Every expression under `decl`, in pre-order.
pub fn expressions(decl: &Decl) -> Vec<Expr> {
    struct Collector(Vec<Expr>);

    impl<'ir> Visitor<'ir> for Collector {
        fn visit_expr(&mut self, expr: &'ir Expr) {
            self.0.push(expr.clone());
            walk_expr(self, expr);
        }
    }

    let mut collector = Collector(Vec::new());
    collector.visit_decl(decl);
    collector.0
}

/// Callees of every call under `decl`, in pre-order.
pub fn callees(decl: &Decl) -> Vec<DeclId> {
    expressions(decl)
        .iter()
        .filter_map(|expr| expr.as_call().map(|call| call.callee))
        .collect()
}
