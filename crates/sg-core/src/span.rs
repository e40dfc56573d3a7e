use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Start/end offset used when a node has no source at all (library or stub declarations).
pub const UNDEFINED_OFFSET: i32 = -1;
/// Start/end offset used for nodes generated by a transformation.
pub const SYNTHETIC_OFFSET: i32 = -2;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    Display,
)]
#[display("#{_0}")]
#[serde(transparent)]
pub struct FileId(pub u32);

/// Character offsets into a source file. `start`/`end` are absolute from the
/// beginning of the file, or one of the sentinel offsets above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub file: FileId,
    pub start: i32,
    pub end: i32,
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.start {
            UNDEFINED_OFFSET => write!(f, "{}:<undefined>", self.file),
            SYNTHETIC_OFFSET => write!(f, "{}:<synthetic>", self.file),
            _ => write!(f, "{}:{}-{}", self.file, self.start, self.end),
        }
    }
}

impl Span {
    pub fn new(file: FileId, start: i32, end: i32) -> Span {
        Span { file, start, end }
    }

    pub fn undefined(file: FileId) -> Span {
        Span::new(file, UNDEFINED_OFFSET, UNDEFINED_OFFSET)
    }

    pub fn synthetic(file: FileId) -> Span {
        Span::new(file, SYNTHETIC_OFFSET, SYNTHETIC_OFFSET)
    }

    pub fn is_undefined(&self) -> bool {
        self.start == UNDEFINED_OFFSET
    }

    pub fn is_synthetic(&self) -> bool {
        self.start == SYNTHETIC_OFFSET
    }

    /// Whether the offsets point into real source text.
    pub fn is_real(&self) -> bool {
        self.start >= 0 && self.end >= self.start
    }

    /// Synthetic span in the same file, for nodes a pass creates next to this one.
    pub fn to_synthetic(self) -> Span {
        Span::synthetic(self.file)
    }
}
