use crate::descriptors::{AnnotationMap, Handle, SourceLocation, TypeInfo};
use crate::ir::Ty;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldKey {
    pub qualified_name: String,
    pub ty: Ty,
    pub enclosing: u64,
}

/// Identity of a local or parameter within its owning function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariableKey {
    pub owner: u64,
    pub name: String,
    pub ty: Ty,
    pub offset: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldInfo {
    pub location: Handle<SourceLocation>,
    pub qualified_name: String,
    pub simple_name: String,
    pub ty: Handle<TypeInfo>,
    pub is_static: bool,
    pub is_external: bool,
    pub is_final: bool,
    pub annotations: AnnotationMap,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalInfo {
    pub location: Handle<SourceLocation>,
    pub qualified_name: String,
    pub simple_name: String,
    pub ty: Handle<TypeInfo>,
    pub mutable: bool,
    pub annotations: AnnotationMap,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterInfo {
    pub location: Handle<SourceLocation>,
    pub qualified_name: String,
    pub simple_name: String,
    pub ty: Handle<TypeInfo>,
    pub index: usize,
    pub annotations: AnnotationMap,
}
