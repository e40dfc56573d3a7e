use crate::ir::{Annotation, Block, DeclId, Expr, Ty, VarId};
use crate::span::Span;
use serde::{Deserialize, Serialize};

/// Where a declaration came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    #[default]
    Source,
    /// Created by the compiler or by one of our passes.
    Synthetic,
    /// Inherited member without a body of its own.
    FakeOverride,
    /// Declared in a dependency; no source text is available.
    Library,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Internal,
    Private,
    Local,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modality {
    #[default]
    Final,
    Open,
    Abstract,
    Sealed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Object,
    AnonymousObject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructuralKind {
    Enum,
    Data,
    Value,
    Annotation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionKind {
    #[default]
    Function,
    Constructor {
        primary: bool,
    },
    Getter,
    Setter,
    Lambda,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decl {
    pub id: DeclId,
    pub span: Span,
    #[serde(default)]
    pub origin: Origin,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    pub kind: DeclKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeclKind {
    Class(ClassDecl),
    Function(FunctionDecl),
    Property(PropertyDecl),
    Field(FieldDecl),
    Initializer(InitializerDecl),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default)]
    pub kind: ClassKind,
    #[serde(default)]
    pub is_companion: bool,
    #[serde(default)]
    pub structural: Option<StructuralKind>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub modality: Modality,
    #[serde(default)]
    pub type_params: Vec<String>,
    #[serde(default)]
    pub members: Vec<Decl>,
}

impl ClassDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ClassKind::Class,
            is_companion: false,
            structural: None,
            visibility: Visibility::Public,
            modality: Modality::Final,
            type_params: Vec::new(),
            members: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: ClassKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_members(mut self, members: Vec<Decl>) -> Self {
        self.members = members;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub id: VarId,
    pub name: String,
    pub ty: Ty,
    #[serde(default)]
    pub default: Option<Expr>,
    pub span: Span,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Param {
    pub fn new(id: VarId, name: impl Into<String>, ty: Ty, span: Span) -> Self {
        Self {
            id,
            name: name.into(),
            ty,
            default: None,
            span,
            annotations: Vec::new(),
        }
    }

    pub fn with_default(mut self, default: Expr) -> Self {
        self.default = Some(default);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Body {
    Block(Block),
    /// `fun f() = expr`
    Expression(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    #[serde(default)]
    pub kind: FunctionKind,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub modality: Modality,
    #[serde(default)]
    pub type_params: Vec<String>,
    #[serde(default)]
    pub params: Vec<Param>,
    pub return_ty: Ty,
    #[serde(default)]
    pub is_suspend: bool,
    #[serde(default)]
    pub is_expect: bool,
    #[serde(default)]
    pub body: Option<Body>,
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>, return_ty: Ty) -> Self {
        Self {
            name: name.into(),
            kind: FunctionKind::Function,
            visibility: Visibility::Public,
            modality: Modality::Final,
            type_params: Vec::new(),
            params: Vec::new(),
            return_ty,
            is_suspend: false,
            is_expect: false,
            body: None,
        }
    }

    pub fn with_kind(mut self, kind: FunctionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_params(mut self, params: Vec<Param>) -> Self {
        self.params = params;
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    pub fn suspending(mut self) -> Self {
        self.is_suspend = true;
        self
    }

    pub fn is_constructor(&self) -> bool {
        matches!(self.kind, FunctionKind::Constructor { .. })
    }

    pub fn is_primary_constructor(&self) -> bool {
        matches!(self.kind, FunctionKind::Constructor { primary: true })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub name: String,
    #[serde(default)]
    pub mutable: bool,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub modality: Modality,
    #[serde(default)]
    pub getter: Option<Box<Decl>>,
    #[serde(default)]
    pub setter: Option<Box<Decl>>,
    #[serde(default)]
    pub backing_field: Option<Box<Decl>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: Ty,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_external: bool,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub initializer: Option<Expr>,
}

/// Anonymous `init { ... }` block of a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializerDecl {
    pub body: Block,
}

impl Decl {
    pub fn new(id: DeclId, span: Span, kind: DeclKind) -> Self {
        Self {
            id,
            span,
            origin: Origin::Source,
            annotations: Vec::new(),
            kind,
        }
    }

    pub fn function(id: DeclId, span: Span, function: FunctionDecl) -> Self {
        Decl::new(id, span, DeclKind::Function(function))
    }

    pub fn class(id: DeclId, span: Span, class: ClassDecl) -> Self {
        Decl::new(id, span, DeclKind::Class(class))
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            DeclKind::Class(class) => Some(&class.name),
            DeclKind::Function(function) => Some(&function.name),
            DeclKind::Property(property) => Some(&property.name),
            DeclKind::Field(field) => Some(&field.name),
            DeclKind::Initializer(_) => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionDecl> {
        match &self.kind {
            DeclKind::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_function_mut(&mut self) -> Option<&mut FunctionDecl> {
        match &mut self.kind {
            DeclKind::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassDecl> {
        match &self.kind {
            DeclKind::Class(class) => Some(class),
            _ => None,
        }
    }
}
