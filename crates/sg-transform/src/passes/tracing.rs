//! Tracing instrumentation.
//!
//! Wraps call sites with before/after-call and suspension hooks and function
//! bodies with enter/leave hooks, according to the trace types active at each
//! point. Every value an instrumented node produced before is produced
//! unchanged afterwards, evaluated exactly once.

use crate::context::{Executable, TraversalContext};
use crate::lowering::{block_with_result, descriptor_expr, hook_call, materialize_temporary};
use crate::passes::trace_scope::{active_types, declared_types};
use crate::passes::{Pass, PassEnv};
use crate::visit::{walk_decl, walk_expr, walk_module, MutVisitor, Slot};
use sg_core::descriptors::{DescriptorRef, FunctionInfo, Handle};
use sg_core::error::{Error, Result};
use sg_core::ir::{
    Block, Body, ClassKind, DeclId, Decl, DeclKind, Expr, ExprKind, IdAllocator, Module, Origin,
    ReturnTarget, Stmt, SymbolKind, Ty,
};
use sg_core::span::Span;
use sg_core::trace::{TraceType, TraceTypes};

pub struct TracingInstrumentation;

impl Pass for TracingInstrumentation {
    fn name(&self) -> &'static str {
        "tracing-instrumentation"
    }

    fn run(&self, module: &mut Module, env: &PassEnv<'_>) -> Result<usize> {
        let mut instrumenter = TracingInstrumenter::new(env);
        let mut cx = TraversalContext::new(env.symbols, module.ids);
        walk_module(&mut instrumenter, module, &mut cx)?;
        sg_core::debug!(
            "instrumented {} call sites and {} function bodies",
            instrumenter.calls,
            instrumenter.bodies
        );
        Ok(instrumenter.calls + instrumenter.bodies)
    }
}

pub struct TracingInstrumenter<'p, 'e> {
    env: &'p PassEnv<'e>,
    pub calls: usize,
    pub bodies: usize,
}

impl<'p, 'e> TracingInstrumenter<'p, 'e> {
    pub fn new(env: &'p PassEnv<'e>) -> Self {
        Self {
            env,
            calls: 0,
            bodies: 0,
        }
    }

    fn hook(&self, ty: TraceType) -> Result<DeclId> {
        self.env.runtime.hook(ty).ok_or_else(|| Error::Linkage {
            symbol: self.env.options.tracing.hooks.get(ty).to_string(),
        })
    }

    fn function_descriptor(&self, handle: Handle<FunctionInfo>, span: Span) -> Expr {
        descriptor_expr(DescriptorRef::Function(handle), span.to_synthetic())
    }

    fn location_descriptor(&self, span: Span) -> Result<Expr> {
        let location = self.env.factory.location(span)?;
        Ok(descriptor_expr(
            DescriptorRef::Location(location),
            span.to_synthetic(),
        ))
    }

    /// Compiler-internal calls that are not meaningful trace points.
    fn is_exempt(&self, callee: DeclId) -> bool {
        if self.env.runtime.is_runtime_call(callee) {
            return true;
        }
        let symbols = self.env.symbols;
        let Some((symbol, function)) = symbols.function(callee) else {
            return true;
        };
        if symbol.origin == Origin::Synthetic && function.is_constructor() {
            return true;
        }
        function.is_constructor()
            && symbol
                .parent
                .and_then(|parent| symbols.class(parent))
                .is_some_and(|(_, class)| class.kind == ClassKind::AnonymousObject)
    }

    fn instrument_call(&mut self, expr: &mut Expr, cx: &mut TraversalContext<'_>) -> Result<()> {
        let Some(call) = expr.as_call() else {
            return Ok(());
        };
        let callee = call.callee;
        if self.is_exempt(callee) {
            return Ok(());
        }
        let types = active_types(cx, self.env.options)?;
        let is_suspend = self
            .env
            .symbols
            .function(callee)
            .is_some_and(|(_, function)| function.is_suspend);
        let before = types.has(TraceType::BeforeCall);
        let after = types.has(TraceType::AfterCall) && !expr.ty.is_nothing();
        let suspension = types.has(TraceType::SuspensionPoint) && is_suspend;
        if !(before || after || suspension) {
            return Ok(());
        }
        let Some(executable) = cx.scopes.current_executable() else {
            sg_core::trace!("skipping call at {}: no enclosing executable", expr.span);
            return Ok(());
        };

        let span = expr.span;
        let callee_info = self.env.factory.function_info(callee)?;
        let mut stmts = Vec::new();
        if before {
            stmts.push(Stmt::Expr(hook_call(
                self.hook(TraceType::BeforeCall)?,
                vec![
                    self.function_descriptor(callee_info, span),
                    self.location_descriptor(span)?,
                ],
                span,
            )));
        }
        if suspension {
            stmts.push(Stmt::Expr(self.suspension_hook(executable, span)?));
        }
        let original = expr.take();
        let result = if after {
            let after_hook = hook_call(
                self.hook(TraceType::AfterCall)?,
                vec![
                    self.function_descriptor(callee_info, span),
                    self.location_descriptor(span)?,
                ],
                span,
            );
            if original.ty.is_trivial() {
                stmts.push(Stmt::Expr(original));
                stmts.push(Stmt::Expr(after_hook));
                Expr::unit(span.to_synthetic())
            } else {
                let (read, binding) = materialize_temporary(original, &mut cx.ids);
                stmts.push(binding);
                stmts.push(Stmt::Expr(after_hook));
                read
            }
        } else {
            original
        };
        *expr = block_with_result(stmts, result, span);
        sg_core::trace!("wrapped call at {}", span);
        self.calls += 1;
        Ok(())
    }

    fn suspension_hook(&self, executable: Executable, span: Span) -> Result<Expr> {
        let current = self.env.factory.executable_info(executable)?;
        Ok(hook_call(
            self.hook(TraceType::SuspensionPoint)?,
            vec![
                self.function_descriptor(current, span),
                self.location_descriptor(span)?,
            ],
            span,
        ))
    }

    fn instrument_body(&mut self, decl: &mut Decl, cx: &mut TraversalContext<'_>) -> Result<()> {
        let id = decl.id;
        let span = decl.span;
        let DeclKind::Function(function) = &mut decl.kind else {
            return Ok(());
        };
        if function.body.is_none() || decl.origin == Origin::FakeOverride {
            return Ok(());
        }
        let types: TraceTypes = active_types(cx, self.env.options)?
            | declared_types(&decl.annotations, self.env.options)?;
        let enter = types.has(TraceType::FunctionEnter);
        let leave = types.has(TraceType::FunctionLeave);
        if !(enter || leave) {
            return Ok(());
        }

        let info = self.env.factory.function_info(id)?;
        let enter_hook = if enter {
            Some(hook_call(
                self.hook(TraceType::FunctionEnter)?,
                vec![self.function_descriptor(info, span)],
                span,
            ))
        } else {
            None
        };
        let leave_hook = if leave {
            Some(hook_call(
                self.hook(TraceType::FunctionLeave)?,
                vec![self.function_descriptor(info, span)],
                span,
            ))
        } else {
            None
        };

        let return_ty = function.return_ty.clone();
        let body = function.body.take();
        let body = match body {
            Some(Body::Block(mut block)) => {
                if let Some(leave_hook) = &leave_hook {
                    let mut rewriter = ReturnRewriter {
                        target: id,
                        leave: leave_hook,
                        ids: &mut cx.ids,
                    };
                    rewriter.block(&mut block);
                    if return_ty == Ty::Unit && !block.ends_with_return() {
                        block.stmts.push(Stmt::Expr(leave_hook.clone()));
                    }
                }
                if let Some(enter_hook) = enter_hook {
                    block.stmts.insert(0, Stmt::Expr(enter_hook));
                }
                Body::Block(block)
            }
            Some(Body::Expression(mut expr)) => {
                let mut stmts: Vec<Stmt> = enter_hook.into_iter().map(Stmt::Expr).collect();
                match leave_hook {
                    Some(leave_hook) => {
                        let mut rewriter = ReturnRewriter {
                            target: id,
                            leave: &leave_hook,
                            ids: &mut cx.ids,
                        };
                        rewriter.expr(&mut expr);
                        if expr.ty.is_nothing() {
                            stmts.push(Stmt::Expr(expr));
                        } else if expr.ty.is_trivial() {
                            stmts.push(Stmt::Expr(expr));
                            stmts.push(Stmt::Expr(leave_hook));
                        } else {
                            let value_span = expr.span;
                            let (read, binding) = materialize_temporary(expr, &mut cx.ids);
                            stmts.push(binding);
                            stmts.push(Stmt::Expr(leave_hook));
                            stmts.push(Stmt::Expr(Expr::ret(
                                value_span.to_synthetic(),
                                ReturnTarget::Function(id),
                                read,
                            )));
                        }
                    }
                    None if return_ty.is_trivial() => stmts.push(Stmt::Expr(expr)),
                    None => stmts.push(Stmt::Expr(Expr::ret(
                        expr.span.to_synthetic(),
                        ReturnTarget::Function(id),
                        expr,
                    ))),
                }
                Body::Block(Block::new(stmts))
            }
            None => return Ok(()),
        };
        function.body = Some(body);
        sg_core::trace!("instrumented body of {}", function.name);
        self.bodies += 1;
        Ok(())
    }
}

impl MutVisitor for TracingInstrumenter<'_, '_> {
    fn visit_decl(&mut self, decl: &mut Decl, cx: &mut TraversalContext<'_>) -> Result<()> {
        walk_decl(self, decl, cx)?;
        self.instrument_body(decl, cx)
    }

    fn visit_expr(
        &mut self,
        expr: &mut Expr,
        _slot: Slot,
        cx: &mut TraversalContext<'_>,
    ) -> Result<()> {
        walk_expr(self, expr, cx)?;
        self.instrument_call(expr, cx)
    }
}

/// Rewrites every `return` targeting one function, at any depth, so the
/// leave hook runs after the returned value is computed.
struct ReturnRewriter<'a> {
    target: DeclId,
    leave: &'a Expr,
    ids: &'a mut IdAllocator,
}

impl ReturnRewriter<'_> {
    fn block(&mut self, block: &mut Block) {
        for stmt in &mut block.stmts {
            match stmt {
                Stmt::Expr(expr) => self.expr(expr),
                Stmt::Var(var) => {
                    if let Some(init) = var.init.as_mut() {
                        self.expr(init);
                    }
                }
                Stmt::Decl(decl) => self.decl(decl),
            }
        }
    }

    fn decl(&mut self, decl: &mut Decl) {
        match &mut decl.kind {
            DeclKind::Function(function) => match function.body.as_mut() {
                Some(Body::Block(block)) => self.block(block),
                Some(Body::Expression(expr)) => self.expr(expr),
                None => {}
            },
            DeclKind::Class(class) => {
                for member in &mut class.members {
                    self.decl(member);
                }
            }
            DeclKind::Property(_) | DeclKind::Field(_) | DeclKind::Initializer(_) => {}
        }
    }

    fn expr(&mut self, expr: &mut Expr) {
        match &mut expr.kind {
            ExprKind::Const(_)
            | ExprKind::GetVar(_)
            | ExprKind::FunctionReference(_)
            | ExprKind::PropertyReference(_)
            | ExprKind::Descriptor(_)
            | ExprKind::CaptureFrame(_) => {}
            ExprKind::SetVar(set) => self.expr(&mut set.value),
            ExprKind::Call(call) => {
                if let Some(receiver) = call.receiver.as_mut() {
                    self.expr(receiver);
                }
                for arg in call.args.iter_mut().flatten() {
                    self.expr(arg);
                }
            }
            ExprKind::Block(block) => self.block(block),
            ExprKind::ReturnableBlock(block) => self.block(&mut block.block),
            ExprKind::Return(ret) => {
                self.expr(&mut ret.value);
                if ret.target == ReturnTarget::Function(self.target) && !ret.value.ty.is_nothing()
                {
                    let value = std::mem::replace(
                        ret.value.as_mut(),
                        Expr::unit(expr.span.to_synthetic()),
                    );
                    *ret.value = self.with_leave(value);
                }
            }
            ExprKind::When(when) => {
                for branch in &mut when.branches {
                    self.expr(&mut branch.condition);
                    self.expr(&mut branch.result);
                }
                if let Some(otherwise) = when.otherwise.as_mut() {
                    self.expr(otherwise);
                }
            }
            ExprKind::While(looped) => {
                self.expr(&mut looped.condition);
                self.expr(&mut looped.body);
            }
            ExprKind::Binary(binary) => {
                self.expr(&mut binary.lhs);
                self.expr(&mut binary.rhs);
            }
            ExprKind::Not(inner) => self.expr(inner),
            ExprKind::StringConcat(parts) => {
                for part in parts {
                    self.expr(part);
                }
            }
            ExprKind::Lambda(decl) => self.decl(decl),
        }
    }

    /// `{ val tmp = value; leave(); tmp }`, or `{ value; leave(); Unit }` for
    /// trivial values.
    fn with_leave(&mut self, value: Expr) -> Expr {
        let span = value.span;
        if value.ty.is_trivial() {
            let unit = Expr::unit(span.to_synthetic());
            return block_with_result(
                vec![Stmt::Expr(value), Stmt::Expr(self.leave.clone())],
                unit,
                span,
            );
        }
        let (read, binding) = materialize_temporary(value, self.ids);
        block_with_result(vec![binding, Stmt::Expr(self.leave.clone())], read, span)
    }
}
