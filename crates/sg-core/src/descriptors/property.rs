use crate::descriptors::{
    AnnotationMap, DescriptorStore, FieldInfo, FunctionInfo, Handle, SourceLocation, TypeInfo,
};
use crate::ir::{Modality, Visibility};
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyKey {
    pub qualified_name: String,
    pub enclosing: u64,
}

/// A property. Its type is never stored: it comes from the getter, the setter
/// or the backing field, at least one of which is present.
#[derive(Debug, Clone)]
pub struct PropertyInfo {
    pub key: PropertyKey,
    pub location: Handle<SourceLocation>,
    pub qualified_name: String,
    pub simple_name: String,
    pub mutable: bool,
    pub visibility: Visibility,
    pub modality: Modality,
    pub getter: Option<Handle<FunctionInfo>>,
    pub setter: Option<Handle<FunctionInfo>>,
    pub backing_field: Option<Handle<FieldInfo>>,
    pub annotations: AnnotationMap,
}

impl PropertyInfo {
    pub fn ty(&self, store: &DescriptorStore) -> Option<Handle<TypeInfo>> {
        if let Some(getter) = self.getter.and_then(|handle| store.functions.get(handle)) {
            return Some(getter.return_type);
        }
        if let Some(setter) = self.setter.and_then(|handle| store.functions.get(handle)) {
            let value = setter.parameters.last()?;
            return store.parameters.get(*value).map(|param| param.ty);
        }
        let field = store.fields.get(self.backing_field?)?;
        Some(field.ty)
    }
}

impl PartialEq for PropertyInfo {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for PropertyInfo {}

impl Hash for PropertyInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state)
    }
}
