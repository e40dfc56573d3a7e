use crate::error::interpretation_error;
use sg_core::descriptors::{DescriptorRef, FrameSnapshot};
use sg_core::error::Result;
use sg_core::ir::Const;
use std::fmt;
use std::sync::Arc;

/// Runtime value of the interpreter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unit,
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    String(String),
    Descriptor(DescriptorRef),
    Snapshot(Arc<FrameSnapshot<Value>>),
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Value::String(value.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "Unit",
            Value::Null => "Null",
            Value::Bool(_) => "Boolean",
            Value::Int(_) => "Int",
            Value::Long(_) => "Long",
            Value::String(_) => "String",
            Value::Descriptor(_) => "Descriptor",
            Value::Snapshot(_) => "FrameSnapshot",
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(value) => Ok(*value),
            other => Err(interpretation_error(format!(
                "expected a Boolean, found {}",
                other.type_name()
            ))),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_descriptor(&self) -> Option<DescriptorRef> {
        match self {
            Value::Descriptor(descriptor) => Some(*descriptor),
            _ => None,
        }
    }
}

impl From<&Const> for Value {
    fn from(value: &Const) -> Self {
        match value {
            Const::Null => Value::Null,
            Const::Unit => Value::Unit,
            Const::Boolean(value) => Value::Bool(*value),
            Const::Int(value) => Value::Int(*value),
            Const::Long(value) => Value::Long(*value),
            Const::String(value) => Value::String(value.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "kotlin.Unit"),
            Value::Null => write!(f, "null"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Long(value) => write!(f, "{value}"),
            Value::String(value) => write!(f, "{value}"),
            Value::Descriptor(descriptor) => write!(f, "<{}>", descriptor.kind_name()),
            Value::Snapshot(snapshot) => write!(f, "<frame of {} locals>", snapshot.len()),
        }
    }
}
