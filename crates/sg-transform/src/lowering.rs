//! Node builders shared by the rewriting passes.

use sg_core::descriptors::DescriptorRef;
use sg_core::ir::{Call, DeclId, Expr, IdAllocator, Origin, Stmt, Ty, VarDecl};
use sg_core::span::Span;

/// Bind `expr` to a fresh immutable temporary. Returns a read of the
/// temporary and the binding statement that must run first.
pub fn materialize_temporary(expr: Expr, ids: &mut IdAllocator) -> (Expr, Stmt) {
    let var = ids.var();
    let span = expr.span.to_synthetic();
    let ty = expr.ty.clone();
    let mut binding = VarDecl::new(var, format!("tmp${}", var.0), ty.clone(), Some(expr), span);
    binding.origin = Origin::Synthetic;
    (Expr::get_var(span, ty, var), Stmt::Var(binding))
}

/// A `Unit` call of a runtime hook with positional arguments.
pub fn hook_call(hook: DeclId, args: Vec<Expr>, span: Span) -> Expr {
    Expr::call(
        span.to_synthetic(),
        Ty::Unit,
        Call::new(hook, args.into_iter().map(Some).collect()),
    )
}

/// Reference to a cached descriptor, typed as its runtime class.
pub fn descriptor_expr(descriptor: DescriptorRef, span: Span) -> Expr {
    Expr::descriptor(span, descriptor.runtime_ty(), descriptor)
}

/// Block expression of `stmts` whose value is `result`.
pub fn block_with_result(mut stmts: Vec<Stmt>, result: Expr, span: Span) -> Expr {
    let ty = result.ty.clone();
    stmts.push(Stmt::Expr(result));
    Expr::block(span, ty, stmts)
}
