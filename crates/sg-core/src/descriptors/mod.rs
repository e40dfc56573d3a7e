//! Compile-time descriptors of declarations and their process-wide caches.
//!
//! Every descriptor kind lives in its own [`DescriptorArena`]; IR nodes refer
//! to descriptors through [`DescriptorRef`] handles, so two requests with the
//! same identity key always produce the same instance.

mod annotations;
mod arena;
mod class;
mod function;
mod location;
mod property;
mod snapshot;
mod types;
mod variables;

pub use annotations::*;
pub use arena::*;
pub use class::*;
pub use function::*;
pub use location::*;
pub use property::*;
pub use snapshot::*;
pub use types::*;
pub use variables::*;

use crate::error::Result;
use crate::ir::Ty;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Reference from an IR node to a cached descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DescriptorRef {
    Location(Handle<SourceLocation>),
    Type(Handle<TypeInfo>),
    Class(Handle<ClassInfo>),
    Function(Handle<FunctionInfo>),
    Property(Handle<PropertyInfo>),
    Field(Handle<FieldInfo>),
    Local(Handle<LocalInfo>),
    Parameter(Handle<ParameterInfo>),
}

impl DescriptorRef {
    pub fn kind_name(&self) -> &'static str {
        match self {
            DescriptorRef::Location(_) => "location",
            DescriptorRef::Type(_) => "type",
            DescriptorRef::Class(_) => "class",
            DescriptorRef::Function(_) => "function",
            DescriptorRef::Property(_) => "property",
            DescriptorRef::Field(_) => "field",
            DescriptorRef::Local(_) => "local",
            DescriptorRef::Parameter(_) => "parameter",
        }
    }

    /// Runtime class the descriptor is materialised as.
    pub fn runtime_class(&self) -> &'static str {
        match self {
            DescriptorRef::Location(_) => "spyglass.SourceLocation",
            DescriptorRef::Type(_) => "spyglass.TypeInfo",
            DescriptorRef::Class(_) => "spyglass.ClassInfo",
            DescriptorRef::Function(_) => "spyglass.FunctionInfo",
            DescriptorRef::Property(_) => "spyglass.PropertyInfo",
            DescriptorRef::Field(_) => "spyglass.FieldInfo",
            DescriptorRef::Local(_) => "spyglass.LocalInfo",
            DescriptorRef::Parameter(_) => "spyglass.ParameterInfo",
        }
    }

    pub fn runtime_ty(&self) -> Ty {
        Ty::class(self.runtime_class())
    }
}

#[derive(Debug, Default)]
pub struct DescriptorStore {
    pub locations: DescriptorArena<SourceLocation, SourceLocation>,
    pub types: DescriptorArena<Ty, TypeInfo>,
    pub classes: DescriptorArena<String, ClassInfo>,
    pub functions: DescriptorArena<FunctionKey, FunctionInfo>,
    pub properties: DescriptorArena<PropertyKey, PropertyInfo>,
    pub fields: DescriptorArena<FieldKey, FieldInfo>,
    pub locals: DescriptorArena<VariableKey, LocalInfo>,
    pub parameters: DescriptorArena<VariableKey, ParameterInfo>,
}

impl DescriptorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn location(&self, location: SourceLocation) -> Result<Handle<SourceLocation>> {
        let key = location.clone();
        self.locations.get_or_create(key, |_| Ok(location))
    }

    /// One-line human readable summary of a referenced descriptor.
    pub fn describe(&self, descriptor: &DescriptorRef) -> Option<String> {
        let text = match descriptor {
            DescriptorRef::Location(handle) => self.locations.get(*handle)?.to_string(),
            DescriptorRef::Type(handle) => {
                format!("type {}", self.types.get(*handle)?.qualified_name)
            }
            DescriptorRef::Class(handle) => {
                format!("class {}", self.classes.get(*handle)?.qualified_name)
            }
            DescriptorRef::Function(handle) => {
                format!("function {}", self.functions.get(*handle)?.qualified_name)
            }
            DescriptorRef::Property(handle) => {
                format!("property {}", self.properties.get(*handle)?.qualified_name)
            }
            DescriptorRef::Field(handle) => {
                format!("field {}", self.fields.get(*handle)?.qualified_name)
            }
            DescriptorRef::Local(handle) => {
                format!("local {}", self.locals.get(*handle)?.qualified_name)
            }
            DescriptorRef::Parameter(handle) => {
                format!("parameter {}", self.parameters.get(*handle)?.qualified_name)
            }
        };
        Some(text)
    }
}

static GLOBAL_DESCRIPTOR_STORE: Lazy<Arc<DescriptorStore>> =
    Lazy::new(|| Arc::new(DescriptorStore::new()));

/// Process-wide descriptor caches shared by every module transformed in this process.
pub fn descriptor_store() -> Arc<DescriptorStore> {
    GLOBAL_DESCRIPTOR_STORE.clone()
}

/// Deterministic 64-bit hash, independent of process-random hasher seeds.
pub fn stable_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Fold a 64-bit hash into the 32-bit integer the hash intrinsics produce.
pub fn fold_hash(hash: u64) -> i32 {
    ((hash >> 32) ^ hash) as u32 as i32
}
