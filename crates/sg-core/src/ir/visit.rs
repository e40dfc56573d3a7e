//! Read-only traversal over the IR. Rewriting passes use the scope-aware
//! mutable walker in `sg-transform` instead.

use crate::ir::{
    Block, Body, Decl, DeclKind, Expr, ExprKind, IdAllocator, Param, Stmt, VarDecl,
};

pub trait Visitor<'ir>: Sized {
    fn visit_decl(&mut self, decl: &'ir Decl) {
        walk_decl(self, decl)
    }

    fn visit_param(&mut self, param: &'ir Param) {
        walk_param(self, param)
    }

    fn visit_stmt(&mut self, stmt: &'ir Stmt) {
        walk_stmt(self, stmt)
    }

    fn visit_var(&mut self, var: &'ir VarDecl) {
        walk_var(self, var)
    }

    fn visit_expr(&mut self, expr: &'ir Expr) {
        walk_expr(self, expr)
    }
}

pub fn walk_decl<'ir, V: Visitor<'ir>>(visitor: &mut V, decl: &'ir Decl) {
    match &decl.kind {
        DeclKind::Class(class) => {
            for member in &class.members {
                visitor.visit_decl(member);
            }
        }
        DeclKind::Function(function) => {
            for param in &function.params {
                visitor.visit_param(param);
            }
            match &function.body {
                Some(Body::Block(block)) => walk_block(visitor, block),
                Some(Body::Expression(expr)) => visitor.visit_expr(expr),
                None => {}
            }
        }
        DeclKind::Property(property) => {
            for accessor in [&property.backing_field, &property.getter, &property.setter]
                .into_iter()
                .flatten()
            {
                visitor.visit_decl(accessor);
            }
        }
        DeclKind::Field(field) => {
            if let Some(init) = &field.initializer {
                visitor.visit_expr(init);
            }
        }
        DeclKind::Initializer(init) => walk_block(visitor, &init.body),
    }
}

pub fn walk_param<'ir, V: Visitor<'ir>>(visitor: &mut V, param: &'ir Param) {
    if let Some(default) = &param.default {
        visitor.visit_expr(default);
    }
}

pub fn walk_block<'ir, V: Visitor<'ir>>(visitor: &mut V, block: &'ir Block) {
    for stmt in &block.stmts {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_stmt<'ir, V: Visitor<'ir>>(visitor: &mut V, stmt: &'ir Stmt) {
    match stmt {
        Stmt::Expr(expr) => visitor.visit_expr(expr),
        Stmt::Var(var) => visitor.visit_var(var),
        Stmt::Decl(decl) => visitor.visit_decl(decl),
    }
}

pub fn walk_var<'ir, V: Visitor<'ir>>(visitor: &mut V, var: &'ir VarDecl) {
    if let Some(init) = &var.init {
        visitor.visit_expr(init);
    }
}

pub fn walk_expr<'ir, V: Visitor<'ir>>(visitor: &mut V, expr: &'ir Expr) {
    match &expr.kind {
        ExprKind::Const(_)
        | ExprKind::GetVar(_)
        | ExprKind::FunctionReference(_)
        | ExprKind::PropertyReference(_)
        | ExprKind::Descriptor(_)
        | ExprKind::CaptureFrame(_) => {}
        ExprKind::SetVar(set) => visitor.visit_expr(&set.value),
        ExprKind::Call(call) => {
            if let Some(receiver) = &call.receiver {
                visitor.visit_expr(receiver);
            }
            for arg in call.args.iter().flatten() {
                visitor.visit_expr(arg);
            }
        }
        ExprKind::Block(block) => walk_block(visitor, block),
        ExprKind::ReturnableBlock(block) => walk_block(visitor, &block.block),
        ExprKind::Return(ret) => visitor.visit_expr(&ret.value),
        ExprKind::When(when) => {
            for branch in &when.branches {
                visitor.visit_expr(&branch.condition);
                visitor.visit_expr(&branch.result);
            }
            if let Some(otherwise) = &when.otherwise {
                visitor.visit_expr(otherwise);
            }
        }
        ExprKind::While(looped) => {
            visitor.visit_expr(&looped.condition);
            visitor.visit_expr(&looped.body);
        }
        ExprKind::Binary(binary) => {
            visitor.visit_expr(&binary.lhs);
            visitor.visit_expr(&binary.rhs);
        }
        ExprKind::Not(inner) => visitor.visit_expr(inner),
        ExprKind::StringConcat(parts) => {
            for part in parts {
                visitor.visit_expr(part);
            }
        }
        ExprKind::Lambda(decl) => visitor.visit_decl(decl),
    }
}

/// Records the highest id of every kind into an allocator.
pub(crate) struct IdCollector<'a> {
    pub(crate) ids: &'a mut IdAllocator,
}

impl<'ir> Visitor<'ir> for IdCollector<'_> {
    fn visit_decl(&mut self, decl: &'ir Decl) {
        self.ids.observe_decl(decl.id);
        walk_decl(self, decl)
    }

    fn visit_param(&mut self, param: &'ir Param) {
        self.ids.observe_var(param.id);
        walk_param(self, param)
    }

    fn visit_var(&mut self, var: &'ir VarDecl) {
        self.ids.observe_var(var.id);
        walk_var(self, var)
    }

    fn visit_expr(&mut self, expr: &'ir Expr) {
        if let ExprKind::ReturnableBlock(block) = &expr.kind {
            self.ids.observe_block(block.id);
        }
        walk_expr(self, expr)
    }
}
