use crate::descriptors::{
    fold_hash, stable_hash, AnnotationMap, ClassInfo, Handle, LocalInfo, ParameterInfo,
    SourceLocation, TypeInfo,
};
use crate::ir::{Modality, Ty, Visibility};
use std::hash::{Hash, Hasher};

/// Identity of a function: overloads differ by signature, same-named
/// functions in different scopes by the enclosing-declaration hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionKey {
    pub qualified_name: String,
    pub return_type: Ty,
    pub parameter_types: Vec<Ty>,
    pub enclosing: u64,
}

#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub key: FunctionKey,
    pub location: Handle<SourceLocation>,
    pub qualified_name: String,
    pub simple_name: String,
    pub type_parameters: Vec<String>,
    pub return_type: Handle<TypeInfo>,
    pub parameters: Vec<Handle<ParameterInfo>>,
    pub visibility: Visibility,
    pub modality: Modality,
    pub locals: Vec<Handle<LocalInfo>>,
    pub is_expect: bool,
    pub is_suspend: bool,
    pub declaring_class: Option<Handle<ClassInfo>>,
    pub annotations: AnnotationMap,
}

impl FunctionInfo {
    pub fn structural_hash(&self) -> i32 {
        fold_hash(stable_hash(&self.key))
    }
}

impl PartialEq for FunctionInfo {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for FunctionInfo {}

impl Hash for FunctionInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state)
    }
}
