//! Shared vocabulary of compile-time intrinsics.
//!
//! Runtime declarations are marked as intrinsics with an annotation naming
//! their kind; passes identify them through this catalog and substitute the
//! resolved value at every call site.

mod catalog;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use catalog::{all_specs, lookup_by_name, lookup_by_symbol, spec_for, IntrinsicSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntrinsicKind {
    Here,
    CurrentFile,
    CurrentLine,
    CurrentFunction,
    CurrentFunctionHash,
    CurrentClass,
    CurrentClassHash,
    ClassOf,
    ClassOfHash,
    TypeOf,
    FunctionOf,
    FunctionOfHash,
    PropertyOf,
    FrameSnapshot,
}

/// What a resolved intrinsic must be replaced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultShape {
    Location,
    Type,
    Class,
    Function,
    Property,
    Snapshot,
    Int,
    String,
}

impl ResultShape {
    pub fn name(&self) -> &'static str {
        match self {
            ResultShape::Location => "source location",
            ResultShape::Type => "type descriptor",
            ResultShape::Class => "class descriptor",
            ResultShape::Function => "function descriptor",
            ResultShape::Property => "property descriptor",
            ResultShape::Snapshot => "frame snapshot",
            ResultShape::Int => "integer",
            ResultShape::String => "string",
        }
    }
}

impl IntrinsicKind {
    pub fn spec(&self) -> &'static IntrinsicSpec {
        spec_for(*self)
    }

    /// Kebab-case name used in annotations and caller-capture mode lists.
    pub fn name(&self) -> &'static str {
        self.spec().name
    }

    pub fn shape(&self) -> ResultShape {
        self.spec().shape
    }

    pub fn all() -> impl Iterator<Item = IntrinsicKind> {
        all_specs().iter().map(|spec| spec.kind)
    }
}

impl fmt::Display for IntrinsicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IntrinsicKind {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup_by_name(s)
            .map(|spec| spec.kind)
            .ok_or_else(|| crate::error::Error::Config(format!("unknown intrinsic kind `{s}`")))
    }
}
