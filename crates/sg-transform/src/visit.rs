//! Mutable IR traversal that keeps the scope stack in sync with the walk.
//!
//! Every `walk_*` function pushes the frames its node opens before visiting
//! children, so an overriding `visit_*` method sees the enclosing scopes of
//! the node it is handed.

use crate::context::{Frame, TraversalContext, VisibleLocal};
use sg_core::error::Result;
use sg_core::ir::{Block, Body, Decl, DeclKind, Expr, ExprKind, Module, Param, Stmt, VarDecl};

/// Position of an expression within its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Directly in a statement list.
    Statement,
    /// The whole body of an expression-bodied function.
    ExpressionBody,
    /// Initial value of a local, field or property.
    Initializer,
    /// Default value of a parameter.
    DefaultValue,
    /// Any other operand position.
    Operand,
}

impl Slot {
    pub fn name(&self) -> &'static str {
        match self {
            Slot::Statement => "a statement list",
            Slot::ExpressionBody => "an expression body",
            Slot::Initializer => "an initializer",
            Slot::DefaultValue => "a default value",
            Slot::Operand => "an operand position",
        }
    }
}

pub trait MutVisitor: Sized {
    fn visit_decl(&mut self, decl: &mut Decl, cx: &mut TraversalContext<'_>) -> Result<()> {
        walk_decl(self, decl, cx)
    }

    fn visit_param(&mut self, param: &mut Param, cx: &mut TraversalContext<'_>) -> Result<()> {
        walk_param(self, param, cx)
    }

    fn visit_block(&mut self, block: &mut Block, cx: &mut TraversalContext<'_>) -> Result<()> {
        walk_block(self, block, cx)
    }

    fn visit_var(&mut self, var: &mut VarDecl, cx: &mut TraversalContext<'_>) -> Result<()> {
        walk_var(self, var, cx)
    }

    fn visit_expr(
        &mut self,
        expr: &mut Expr,
        _slot: Slot,
        cx: &mut TraversalContext<'_>,
    ) -> Result<()> {
        walk_expr(self, expr, cx)
    }
}

/// Visit every declaration of the module's own files (external files are
/// never rewritten). Temporaries allocated on the way are written back to
/// `module.ids`.
pub fn walk_module<V: MutVisitor>(
    visitor: &mut V,
    module: &mut Module,
    cx: &mut TraversalContext<'_>,
) -> Result<()> {
    cx.ids = module.ids;
    let result = module.files.iter_mut().try_for_each(|file| {
        cx.file = file.id;
        file.declarations
            .iter_mut()
            .try_for_each(|decl| visitor.visit_decl(decl, cx))
    });
    module.ids = cx.ids;
    result
}

pub fn walk_decl<V: MutVisitor>(
    visitor: &mut V,
    decl: &mut Decl,
    cx: &mut TraversalContext<'_>,
) -> Result<()> {
    let id = decl.id;
    match &mut decl.kind {
        DeclKind::Class(class) => {
            let mut cx = cx.enter(Frame::class(id));
            for member in &mut class.members {
                visitor.visit_decl(member, &mut cx)?;
            }
        }
        DeclKind::Function(function) => {
            let params = function
                .params
                .iter()
                .map(|param| VisibleLocal {
                    var: param.id,
                    name: param.name.clone(),
                    ty: param.ty.clone(),
                    span: param.span,
                    mutable: false,
                })
                .collect();
            let mut cx = cx.enter(Frame::function(id, params));
            for param in &mut function.params {
                visitor.visit_param(param, &mut cx)?;
            }
            walk_body(visitor, function.body.as_mut(), &mut cx)?;
        }
        DeclKind::Property(property) => {
            for accessor in [
                &mut property.backing_field,
                &mut property.getter,
                &mut property.setter,
            ]
            .into_iter()
            .flatten()
            {
                visitor.visit_decl(accessor, cx)?;
            }
        }
        DeclKind::Field(field) => {
            if let Some(init) = field.initializer.as_mut() {
                let mut cx = cx.enter(Frame::initializer(id));
                visitor.visit_expr(init, Slot::Initializer, &mut cx)?;
            }
        }
        DeclKind::Initializer(init) => {
            let mut cx = cx.enter(Frame::initializer(id));
            visitor.visit_block(&mut init.body, &mut cx)?;
        }
    }
    Ok(())
}

/// Visit a function body inside the already entered function frame.
pub fn walk_body<V: MutVisitor>(
    visitor: &mut V,
    body: Option<&mut Body>,
    cx: &mut TraversalContext<'_>,
) -> Result<()> {
    match body {
        Some(Body::Block(block)) => visitor.visit_block(block, cx),
        Some(Body::Expression(expr)) => visitor.visit_expr(expr, Slot::ExpressionBody, cx),
        None => Ok(()),
    }
}

pub fn walk_param<V: MutVisitor>(
    visitor: &mut V,
    param: &mut Param,
    cx: &mut TraversalContext<'_>,
) -> Result<()> {
    match param.default.as_mut() {
        Some(default) => visitor.visit_expr(default, Slot::DefaultValue, cx),
        None => Ok(()),
    }
}

pub fn walk_block<V: MutVisitor>(
    visitor: &mut V,
    block: &mut Block,
    cx: &mut TraversalContext<'_>,
) -> Result<()> {
    let mut cx = cx.enter(Frame::body());
    for stmt in &mut block.stmts {
        walk_stmt(visitor, stmt, &mut cx)?;
    }
    Ok(())
}

pub fn walk_stmt<V: MutVisitor>(
    visitor: &mut V,
    stmt: &mut Stmt,
    cx: &mut TraversalContext<'_>,
) -> Result<()> {
    match stmt {
        Stmt::Expr(expr) => visitor.visit_expr(expr, Slot::Statement, cx),
        Stmt::Var(var) => {
            visitor.visit_var(var, cx)?;
            cx.scopes.declare_local(VisibleLocal {
                var: var.id,
                name: var.name.clone(),
                ty: var.ty.clone(),
                span: var.span,
                mutable: var.mutable,
            });
            Ok(())
        }
        Stmt::Decl(decl) => visitor.visit_decl(decl, cx),
    }
}

pub fn walk_var<V: MutVisitor>(
    visitor: &mut V,
    var: &mut VarDecl,
    cx: &mut TraversalContext<'_>,
) -> Result<()> {
    match var.init.as_mut() {
        Some(init) => visitor.visit_expr(init, Slot::Initializer, cx),
        None => Ok(()),
    }
}

pub fn walk_expr<V: MutVisitor>(
    visitor: &mut V,
    expr: &mut Expr,
    cx: &mut TraversalContext<'_>,
) -> Result<()> {
    match &mut expr.kind {
        ExprKind::Const(_)
        | ExprKind::GetVar(_)
        | ExprKind::FunctionReference(_)
        | ExprKind::PropertyReference(_)
        | ExprKind::Descriptor(_)
        | ExprKind::CaptureFrame(_) => Ok(()),
        ExprKind::SetVar(set) => visitor.visit_expr(&mut set.value, Slot::Operand, cx),
        ExprKind::Call(call) => {
            if let Some(receiver) = call.receiver.as_mut() {
                visitor.visit_expr(receiver, Slot::Operand, cx)?;
            }
            for arg in call.args.iter_mut().flatten() {
                visitor.visit_expr(arg, Slot::Operand, cx)?;
            }
            Ok(())
        }
        ExprKind::Block(block) => visitor.visit_block(block, cx),
        ExprKind::ReturnableBlock(block) => visitor.visit_block(&mut block.block, cx),
        ExprKind::Return(ret) => visitor.visit_expr(&mut ret.value, Slot::Operand, cx),
        ExprKind::When(when) => {
            for branch in &mut when.branches {
                visitor.visit_expr(&mut branch.condition, Slot::Operand, cx)?;
                visitor.visit_expr(&mut branch.result, Slot::Operand, cx)?;
            }
            match when.otherwise.as_mut() {
                Some(otherwise) => visitor.visit_expr(otherwise, Slot::Operand, cx),
                None => Ok(()),
            }
        }
        ExprKind::While(looped) => {
            visitor.visit_expr(&mut looped.condition, Slot::Operand, cx)?;
            visitor.visit_expr(&mut looped.body, Slot::Operand, cx)
        }
        ExprKind::Binary(binary) => {
            visitor.visit_expr(&mut binary.lhs, Slot::Operand, cx)?;
            visitor.visit_expr(&mut binary.rhs, Slot::Operand, cx)
        }
        ExprKind::Not(inner) => visitor.visit_expr(inner, Slot::Operand, cx),
        ExprKind::StringConcat(parts) => {
            for part in parts {
                visitor.visit_expr(part, Slot::Operand, cx)?;
            }
            Ok(())
        }
        ExprKind::Lambda(decl) => visitor.visit_decl(decl, cx),
    }
}
