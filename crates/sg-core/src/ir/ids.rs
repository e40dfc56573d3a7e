use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Stable identity of a declaration (class, function, property, field, initializer).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[display("d{_0}")]
#[serde(transparent)]
pub struct DeclId(pub u32);

/// Identity of a local variable or value parameter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[display("v{_0}")]
#[serde(transparent)]
pub struct VarId(pub u32);

/// Identity of a returnable block.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[display("b{_0}")]
#[serde(transparent)]
pub struct BlockId(pub u32);

/// Hands out fresh ids. Each counter holds the next unused value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next_decl: u32,
    next_var: u32,
    next_block: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decl(&mut self) -> DeclId {
        let id = DeclId(self.next_decl);
        self.next_decl += 1;
        id
    }

    pub fn var(&mut self) -> VarId {
        let id = VarId(self.next_var);
        self.next_var += 1;
        id
    }

    pub fn block(&mut self) -> BlockId {
        let id = BlockId(self.next_block);
        self.next_block += 1;
        id
    }

    pub fn observe_decl(&mut self, id: DeclId) {
        self.next_decl = self.next_decl.max(id.0 + 1);
    }

    pub fn observe_var(&mut self, id: VarId) {
        self.next_var = self.next_var.max(id.0 + 1);
    }

    pub fn observe_block(&mut self, id: BlockId) {
        self.next_block = self.next_block.max(id.0 + 1);
    }
}
