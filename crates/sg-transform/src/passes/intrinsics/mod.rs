//! Intrinsic dispatch: replaces calls of intrinsic declarations with the
//! value their handler resolves at the call site.

mod handlers;

use crate::context::{ScopeStack, TraversalContext};
use crate::error::invalid_state;
use crate::lowering::descriptor_expr;
use crate::passes::{Pass, PassEnv};
use crate::visit::{walk_expr, walk_module, MutVisitor, Slot};
use sg_core::descriptors::DescriptorRef;
use sg_core::error::{Error, Result};
use sg_core::intrinsics::{IntrinsicKind, ResultShape};
use sg_core::ir::{Call, Expr, ExprKind, FrameCapture, Module, Ty};
use sg_core::span::Span;
use std::collections::HashMap;
use std::sync::Arc;

/// Compile-time value an intrinsic call is replaced with.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Descriptor(DescriptorRef),
    Snapshot(FrameCapture),
    Int(i32),
    String(String),
}

impl Resolved {
    pub fn shape_name(&self) -> &'static str {
        match self {
            Resolved::Descriptor(DescriptorRef::Location(_)) => ResultShape::Location.name(),
            Resolved::Descriptor(DescriptorRef::Type(_)) => ResultShape::Type.name(),
            Resolved::Descriptor(DescriptorRef::Class(_)) => ResultShape::Class.name(),
            Resolved::Descriptor(DescriptorRef::Function(_)) => ResultShape::Function.name(),
            Resolved::Descriptor(DescriptorRef::Property(_)) => ResultShape::Property.name(),
            Resolved::Descriptor(other) => other.kind_name(),
            Resolved::Snapshot(_) => ResultShape::Snapshot.name(),
            Resolved::Int(_) => ResultShape::Int.name(),
            Resolved::String(_) => ResultShape::String.name(),
        }
    }

    pub fn has_shape(&self, shape: ResultShape) -> bool {
        matches!(
            (self, shape),
            (Resolved::Descriptor(DescriptorRef::Location(_)), ResultShape::Location)
                | (Resolved::Descriptor(DescriptorRef::Type(_)), ResultShape::Type)
                | (Resolved::Descriptor(DescriptorRef::Class(_)), ResultShape::Class)
                | (Resolved::Descriptor(DescriptorRef::Function(_)), ResultShape::Function)
                | (Resolved::Descriptor(DescriptorRef::Property(_)), ResultShape::Property)
                | (Resolved::Snapshot(_), ResultShape::Snapshot)
                | (Resolved::Int(_), ResultShape::Int)
                | (Resolved::String(_), ResultShape::String)
        )
    }

    fn into_expr(self, span: Span, ty: Ty) -> Expr {
        match self {
            Resolved::Descriptor(descriptor) => {
                let mut expr = descriptor_expr(descriptor, span);
                expr.ty = ty;
                expr
            }
            Resolved::Snapshot(capture) => Expr::new(span, ty, ExprKind::CaptureFrame(capture)),
            Resolved::Int(value) => Expr::int(span, value),
            Resolved::String(value) => Expr::string(span, value),
        }
    }
}

/// A call being resolved.
pub struct IntrinsicCall<'c> {
    pub kind: IntrinsicKind,
    pub span: Span,
    pub call: &'c Call,
    /// Static type of the call expression.
    pub ty: &'c Ty,
}

impl IntrinsicCall<'_> {
    /// First value argument, if one was passed.
    pub fn argument(&self) -> Option<&Expr> {
        self.call.args.first().and_then(Option::as_ref)
    }
}

pub trait IntrinsicHandler: Send + Sync {
    fn resolve(
        &self,
        call: &IntrinsicCall<'_>,
        scopes: &ScopeStack,
        env: &PassEnv<'_>,
    ) -> Result<Resolved>;
}

impl<F> IntrinsicHandler for F
where
    F: Fn(&IntrinsicCall<'_>, &ScopeStack, &PassEnv<'_>) -> Result<Resolved> + Send + Sync,
{
    fn resolve(
        &self,
        call: &IntrinsicCall<'_>,
        scopes: &ScopeStack,
        env: &PassEnv<'_>,
    ) -> Result<Resolved> {
        self(call, scopes, env)
    }
}

#[derive(Clone, Default)]
pub struct IntrinsicRegistry {
    handlers: HashMap<IntrinsicKind, Arc<dyn IntrinsicHandler>>,
}

impl IntrinsicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a handler for every catalogued kind.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        handlers::register_defaults(&mut registry);
        registry
    }

    /// Install `handler` for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: IntrinsicKind, handler: impl IntrinsicHandler + 'static) {
        self.handlers.insert(kind, Arc::new(handler));
    }

    pub fn get(&self, kind: IntrinsicKind) -> Option<&dyn IntrinsicHandler> {
        self.handlers.get(&kind).map(|handler| handler.as_ref())
    }
}

pub struct IntrinsicDispatch {
    registry: Arc<IntrinsicRegistry>,
}

impl IntrinsicDispatch {
    pub fn new(registry: Arc<IntrinsicRegistry>) -> Self {
        Self { registry }
    }
}

impl Pass for IntrinsicDispatch {
    fn name(&self) -> &'static str {
        "intrinsic-dispatch"
    }

    fn run(&self, module: &mut Module, env: &PassEnv<'_>) -> Result<usize> {
        let mut dispatcher = Dispatcher {
            registry: &self.registry,
            env,
            replaced: 0,
        };
        let mut cx = TraversalContext::new(env.symbols, module.ids);
        walk_module(&mut dispatcher, module, &mut cx)?;
        Ok(dispatcher.replaced)
    }
}

struct Dispatcher<'p, 'e> {
    registry: &'p IntrinsicRegistry,
    env: &'p PassEnv<'e>,
    replaced: usize,
}

impl MutVisitor for Dispatcher<'_, '_> {
    fn visit_expr(
        &mut self,
        expr: &mut Expr,
        _slot: Slot,
        cx: &mut TraversalContext<'_>,
    ) -> Result<()> {
        walk_expr(self, expr, cx)?;
        let Some(call) = expr.as_call() else {
            return Ok(());
        };
        let Some(kind) = self.env.runtime.intrinsic_kind(call.callee) else {
            return Ok(());
        };
        if !self.env.options.accepts(kind) {
            return Ok(());
        }
        let handler = self
            .registry
            .get(kind)
            .ok_or_else(|| invalid_state(format!("no handler registered for `{kind}`")))?;
        let request = IntrinsicCall {
            kind,
            span: expr.span,
            call,
            ty: &expr.ty,
        };
        let resolved = handler.resolve(&request, &cx.scopes, self.env)?;
        if !resolved.has_shape(kind.shape()) {
            return Err(Error::ShapeMismatch {
                intrinsic: kind.name().to_string(),
                expected: kind.shape().name(),
                found: resolved.shape_name(),
            });
        }
        sg_core::trace!("resolved `{}` at {}", kind, expr.span);
        let (span, ty) = (expr.span, expr.ty.clone());
        *expr = resolved.into_expr(span, ty);
        self.replaced += 1;
        Ok(())
    }
}
