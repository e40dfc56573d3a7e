//! Tree-shaped IR handed over by the host compiler.
//!
//! Declarations carry stable [`DeclId`]s; expressions are plain owned trees that
//! passes rewrite in place.

mod annotation;
mod decl;
mod expr;
mod ids;
pub mod pretty;
mod symbols;
mod ty;
pub mod visit;

pub use annotation::*;
pub use decl::*;
pub use expr::*;
pub use ids::*;
pub use symbols::*;
pub use ty::*;

use crate::span::FileId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub id: FileId,
    pub path: String,
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub declarations: Vec<Decl>,
}

impl File {
    pub fn new(id: FileId, path: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
            package: package.into(),
            declarations: Vec::new(),
        }
    }

    pub fn with_declarations(mut self, declarations: Vec<Decl>) -> Self {
        self.declarations = declarations;
        self
    }
}

/// A compilation unit. `external` files are dependency declarations that are
/// indexed for lookups but never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    #[serde(default)]
    pub files: Vec<File>,
    #[serde(default)]
    pub external: Vec<File>,
    #[serde(default)]
    pub ids: IdAllocator,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: Vec::new(),
            external: Vec::new(),
            ids: IdAllocator::new(),
        }
    }

    pub fn file(&self, id: FileId) -> Option<&File> {
        self.files
            .iter()
            .chain(self.external.iter())
            .find(|file| file.id == id)
    }

    /// Advance the id allocator past every id already present in the tree.
    pub fn sync_ids(&mut self) {
        let mut ids = self.ids;
        {
            let mut collector = visit::IdCollector { ids: &mut ids };
            for file in self.files.iter().chain(self.external.iter()) {
                for decl in &file.declarations {
                    visit::Visitor::visit_decl(&mut collector, decl);
                }
            }
        }
        self.ids = ids;
    }
}
