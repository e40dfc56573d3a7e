use crate::descriptors::{DescriptorRef, Handle, LocalInfo, SourceLocation};
use crate::ir::{Annotation, BlockId, Decl, DeclId, Origin, Ty, VarId};
use crate::span::Span;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Const {
    Null,
    Unit,
    Boolean(bool),
    Int(i32),
    Long(i64),
    String(String),
}

impl Const {
    pub fn ty(&self) -> Ty {
        match self {
            Const::Null => Ty::Any,
            Const::Unit => Ty::Unit,
            Const::Boolean(_) => Ty::Boolean,
            Const::Int(_) => Ty::Int,
            Const::Long(_) => Ty::Long,
            Const::String(_) => Ty::String,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub span: Span,
    pub ty: Ty,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Const(Const),
    GetVar(VarId),
    SetVar(SetVar),
    Call(Call),
    FunctionReference(DeclId),
    PropertyReference(DeclId),
    Block(Block),
    ReturnableBlock(ReturnableBlock),
    Return(Return),
    When(When),
    While(While),
    Binary(Binary),
    Not(Box<Expr>),
    StringConcat(Vec<Expr>),
    Lambda(Box<Decl>),
    Descriptor(DescriptorRef),
    CaptureFrame(FrameCapture),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetVar {
    pub var: VarId,
    pub value: Box<Expr>,
}

/// A call or constructor invocation. `None` marks an argument the caller omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub callee: DeclId,
    #[serde(default)]
    pub receiver: Option<Box<Expr>>,
    #[serde(default)]
    pub type_args: Vec<Ty>,
    #[serde(default)]
    pub args: Vec<Option<Expr>>,
}

impl Call {
    pub fn new(callee: DeclId, args: Vec<Option<Expr>>) -> Self {
        Self {
            callee,
            receiver: None,
            type_args: Vec::new(),
            args,
        }
    }

    pub fn with_type_args(mut self, type_args: Vec<Ty>) -> Self {
        self.type_args = type_args;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }

    pub fn last_expr(&self) -> Option<&Expr> {
        match self.stmts.last() {
            Some(Stmt::Expr(expr)) => Some(expr),
            _ => None,
        }
    }

    /// Whether control never falls off the end of the block.
    pub fn ends_with_return(&self) -> bool {
        matches!(self.last_expr(), Some(expr) if matches!(expr.kind, ExprKind::Return(_)))
    }
}

/// A block that `return` expressions can target, e.g. an inlined function body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnableBlock {
    pub id: BlockId,
    pub block: Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnTarget {
    Function(DeclId),
    Block(BlockId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Return {
    pub target: ReturnTarget,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhenBranch {
    pub condition: Expr,
    pub result: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct When {
    pub branches: Vec<WhenBranch>,
    #[serde(default)]
    pub otherwise: Option<Box<Expr>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct While {
    pub condition: Box<Expr>,
    pub body: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binary {
    pub op: BinOp,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
}

/// Captures the listed variables into a frame snapshot when evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameCapture {
    pub location: Handle<SourceLocation>,
    pub entries: Vec<CapturedLocal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapturedLocal {
    pub local: Handle<LocalInfo>,
    pub var: VarId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub id: VarId,
    pub name: String,
    pub ty: Ty,
    #[serde(default)]
    pub mutable: bool,
    #[serde(default)]
    pub init: Option<Expr>,
    pub span: Span,
    #[serde(default)]
    pub origin: Origin,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl VarDecl {
    pub fn new(id: VarId, name: impl Into<String>, ty: Ty, init: Option<Expr>, span: Span) -> Self {
        Self {
            id,
            name: name.into(),
            ty,
            mutable: false,
            init,
            span,
            origin: Origin::Source,
            annotations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Expr(Expr),
    Var(VarDecl),
    Decl(Box<Decl>),
}

impl Stmt {
    pub fn as_expr(&self) -> Option<&Expr> {
        match self {
            Stmt::Expr(expr) => Some(expr),
            _ => None,
        }
    }
}

impl From<Expr> for Stmt {
    fn from(expr: Expr) -> Self {
        Stmt::Expr(expr)
    }
}

impl Expr {
    pub fn new(span: Span, ty: Ty, kind: ExprKind) -> Self {
        Self { span, ty, kind }
    }

    pub fn constant(span: Span, value: Const) -> Self {
        Expr::new(span, value.ty(), ExprKind::Const(value))
    }

    pub fn unit(span: Span) -> Self {
        Expr::constant(span, Const::Unit)
    }

    pub fn int(span: Span, value: i32) -> Self {
        Expr::constant(span, Const::Int(value))
    }

    pub fn string(span: Span, value: impl Into<String>) -> Self {
        Expr::constant(span, Const::String(value.into()))
    }

    pub fn boolean(span: Span, value: bool) -> Self {
        Expr::constant(span, Const::Boolean(value))
    }

    pub fn get_var(span: Span, ty: Ty, var: VarId) -> Self {
        Expr::new(span, ty, ExprKind::GetVar(var))
    }

    pub fn call(span: Span, ty: Ty, call: Call) -> Self {
        Expr::new(span, ty, ExprKind::Call(call))
    }

    pub fn block(span: Span, ty: Ty, stmts: Vec<Stmt>) -> Self {
        Expr::new(span, ty, ExprKind::Block(Block::new(stmts)))
    }

    pub fn ret(span: Span, target: ReturnTarget, value: Expr) -> Self {
        Expr::new(
            span,
            Ty::Nothing,
            ExprKind::Return(Return {
                target,
                value: Box::new(value),
            }),
        )
    }

    pub fn binary(span: Span, ty: Ty, op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::new(
            span,
            ty,
            ExprKind::Binary(Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            }),
        )
    }

    pub fn descriptor(span: Span, ty: Ty, descriptor: DescriptorRef) -> Self {
        Expr::new(span, ty, ExprKind::Descriptor(descriptor))
    }

    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut ExprKind {
        &mut self.kind
    }

    pub fn as_call(&self) -> Option<&Call> {
        match &self.kind {
            ExprKind::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_call_mut(&mut self) -> Option<&mut Call> {
        match &mut self.kind {
            ExprKind::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn is_return(&self) -> bool {
        matches!(self.kind, ExprKind::Return(_))
    }

    /// Swap this node for `Unit`, handing back the original.
    pub fn take(&mut self) -> Expr {
        let placeholder = Expr::unit(self.span.to_synthetic());
        std::mem::replace(self, placeholder)
    }
}
