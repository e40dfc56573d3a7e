use crate::source_map::LineColumn;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `(module, file, line, column)`; the tuple is also the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub module: String,
    pub file: String,
    pub position: LineColumn,
}

impl SourceLocation {
    pub fn new(module: impl Into<String>, file: impl Into<String>, position: LineColumn) -> Self {
        Self {
            module: module.into(),
            file: file.into(),
            position,
        }
    }

    pub fn line(&self) -> i32 {
        self.position.line()
    }

    pub fn column(&self) -> i32 {
        self.position.column()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.module, self.file, self.position)
    }
}
