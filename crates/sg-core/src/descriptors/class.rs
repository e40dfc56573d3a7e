use crate::descriptors::{
    fold_hash, stable_hash, AnnotationMap, FunctionInfo, Handle, PropertyInfo, SourceLocation,
};
use crate::ir::{Modality, StructuralKind, Visibility};
use std::hash::{Hash, Hasher};

/// A class, identified by its qualified name (its type handle).
#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub location: Handle<SourceLocation>,
    pub qualified_name: String,
    pub simple_name: String,
    pub type_parameters: Vec<String>,
    pub companions: Vec<Handle<ClassInfo>>,
    pub functions: Vec<Handle<FunctionInfo>>,
    pub properties: Vec<Handle<PropertyInfo>>,
    pub is_interface: bool,
    pub is_object: bool,
    pub is_companion: bool,
    pub visibility: Visibility,
    pub modality: Modality,
    pub structural_kind: Option<StructuralKind>,
    pub annotations: AnnotationMap,
}

impl ClassInfo {
    pub fn structural_hash(&self) -> i32 {
        fold_hash(stable_hash(&self.qualified_name))
    }
}

impl PartialEq for ClassInfo {
    fn eq(&self, other: &Self) -> bool {
        self.qualified_name == other.qualified_name
    }
}

impl Eq for ClassInfo {}

impl Hash for ClassInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.qualified_name.hash(state)
    }
}
