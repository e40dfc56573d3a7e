//! Trace removal: strips span and event calls whose trace type is not active
//! where they appear.
//!
//! The first sweep only collects; the second deletes the collected calls
//! from statement lists and blanks them out of function expression bodies.
//! Calls in any other position, lambda expression bodies included, cannot be
//! removed without changing the shape of the surrounding code and are
//! rejected.

use crate::context::TraversalContext;
use crate::passes::trace_scope::active_types;
use crate::passes::{Pass, PassEnv};
use crate::visit::{walk_block, walk_decl, walk_expr, walk_module, MutVisitor, Slot};
use sg_core::error::{Error, Result};
use sg_core::ir::{
    Block, Body, Call, Decl, DeclId, DeclKind, Expr, FunctionKind, Module, Stmt,
};
use sg_core::span::Span;
use std::collections::HashSet;

/// Identity of a call across the two sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CallKey {
    owner: Option<DeclId>,
    span: Span,
    callee: DeclId,
}

pub struct TraceRemoval;

impl Pass for TraceRemoval {
    fn name(&self) -> &'static str {
        "trace-removal"
    }

    fn run(&self, module: &mut Module, env: &PassEnv<'_>) -> Result<usize> {
        let mut collector = RemovalCollector {
            env,
            scheduled: HashSet::new(),
        };
        let mut cx = TraversalContext::new(env.symbols, module.ids);
        walk_module(&mut collector, module, &mut cx)?;
        if collector.scheduled.is_empty() {
            return Ok(0);
        }

        let mut remover = Remover {
            scheduled: collector.scheduled,
            removed: 0,
        };
        let mut cx = TraversalContext::new(env.symbols, module.ids);
        walk_module(&mut remover, module, &mut cx)?;
        sg_core::debug!("removed {} inactive trace calls", remover.removed);
        Ok(remover.removed)
    }
}

struct RemovalCollector<'p, 'e> {
    env: &'p PassEnv<'e>,
    scheduled: HashSet<CallKey>,
}

impl RemovalCollector<'_, '_> {
    /// A lambda's expression body is its value, so it cannot become `Unit`.
    fn in_lambda(&self, cx: &TraversalContext<'_>) -> bool {
        cx.scopes
            .innermost_decl()
            .and_then(|id| self.env.symbols.function(id))
            .is_some_and(|(_, function)| function.kind == FunctionKind::Lambda)
    }
}

impl MutVisitor for RemovalCollector<'_, '_> {
    fn visit_expr(
        &mut self,
        expr: &mut Expr,
        slot: Slot,
        cx: &mut TraversalContext<'_>,
    ) -> Result<()> {
        walk_expr(self, expr, cx)?;
        let Some(call) = expr.as_call() else {
            return Ok(());
        };
        let Some(ty) = self.env.runtime.hook_kind(call.callee) else {
            return Ok(());
        };
        if !ty.is_user_call() || active_types(cx, self.env.options)?.has(ty) {
            return Ok(());
        }
        let container = match slot {
            Slot::Statement => None,
            Slot::ExpressionBody if self.in_lambda(cx) => Some("a lambda expression body"),
            Slot::ExpressionBody => None,
            other => Some(other.name()),
        };
        if let Some(container) = container {
            return Err(Error::UnsupportedContainer {
                callee: self.env.options.tracing.hooks.get(ty).to_string(),
                container,
                span: expr.span,
            });
        }
        sg_core::trace!("scheduling removal of {} at {}", ty, expr.span);
        self.scheduled.insert(CallKey {
            owner: cx.scopes.innermost_decl(),
            span: expr.span,
            callee: call.callee,
        });
        Ok(())
    }
}

struct Remover {
    scheduled: HashSet<CallKey>,
    removed: usize,
}

impl Remover {
    fn is_scheduled(&self, expr: &Expr, owner: Option<DeclId>) -> bool {
        expr.as_call().is_some_and(|call: &Call| {
            self.scheduled.contains(&CallKey {
                owner,
                span: expr.span,
                callee: call.callee,
            })
        })
    }
}

impl MutVisitor for Remover {
    fn visit_decl(&mut self, decl: &mut Decl, cx: &mut TraversalContext<'_>) -> Result<()> {
        let owner = Some(decl.id);
        if let DeclKind::Function(function) = &mut decl.kind {
            if let Some(Body::Expression(expr)) = function.body.as_mut() {
                if self.is_scheduled(expr, owner) {
                    *expr = Expr::unit(expr.span.to_synthetic());
                    self.removed += 1;
                }
            }
        }
        walk_decl(self, decl, cx)
    }

    fn visit_block(&mut self, block: &mut Block, cx: &mut TraversalContext<'_>) -> Result<()> {
        let owner = cx.scopes.innermost_decl();
        let before = block.stmts.len();
        block
            .stmts
            .retain(|stmt| !matches!(stmt, Stmt::Expr(expr) if self.is_scheduled(expr, owner)));
        self.removed += before - block.stmts.len();
        walk_block(self, block, cx)
    }
}
