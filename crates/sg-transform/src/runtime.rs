//! Linkage against the runtime library: intrinsic declarations and trace hooks,
//! resolved by annotation and qualified name against the symbol table.

use crate::options::TransformOptions;
use sg_core::error::{Error, Result};
use sg_core::intrinsics::{self, IntrinsicKind};
use sg_core::ir::{AnnotationsExt, DeclId, Symbol, SymbolKind, SymbolTable};
use sg_core::trace::TraceType;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct RuntimeIndex {
    intrinsic_kinds: HashMap<DeclId, IntrinsicKind>,
    intrinsic_decls: HashMap<IntrinsicKind, DeclId>,
    hooks: HashMap<TraceType, DeclId>,
    hook_kinds: HashMap<DeclId, TraceType>,
}

impl RuntimeIndex {
    pub fn build(symbols: &SymbolTable, options: &TransformOptions) -> Result<Self> {
        let mut index = RuntimeIndex::default();
        for symbol in symbols.iter() {
            if !matches!(symbol.kind, SymbolKind::Function(_)) {
                continue;
            }
            if let Some(kind) = intrinsic_kind_of(symbol, &options.intrinsics.annotation)? {
                index.intrinsic_kinds.insert(symbol.id, kind);
                let canonical = kind.spec().canonical_symbol == symbol.fq_name;
                if canonical || !index.intrinsic_decls.contains_key(&kind) {
                    index.intrinsic_decls.insert(kind, symbol.id);
                }
            }
        }
        for ty in TraceType::ALL {
            if let Some(id) = symbols.lookup_function(options.tracing.hooks.get(ty)) {
                index.hooks.insert(ty, id);
                index.hook_kinds.insert(id, ty);
            }
        }
        sg_core::debug!(
            "runtime index: {} intrinsic declarations, {} trace hooks",
            index.intrinsic_kinds.len(),
            index.hooks.len()
        );
        Ok(index)
    }

    pub fn intrinsic_kind(&self, callee: DeclId) -> Option<IntrinsicKind> {
        self.intrinsic_kinds.get(&callee).copied()
    }

    /// Declaration a synthesized call of `kind` targets.
    pub fn intrinsic_decl(&self, kind: IntrinsicKind) -> Result<DeclId> {
        self.intrinsic_decls
            .get(&kind)
            .copied()
            .ok_or_else(|| Error::Linkage {
                symbol: kind.spec().canonical_symbol.to_string(),
            })
    }

    pub fn hook(&self, ty: TraceType) -> Option<DeclId> {
        self.hooks.get(&ty).copied()
    }

    pub fn hook_kind(&self, callee: DeclId) -> Option<TraceType> {
        self.hook_kinds.get(&callee).copied()
    }

    pub fn is_runtime_call(&self, callee: DeclId) -> bool {
        self.hook_kinds.contains_key(&callee) || self.intrinsic_kinds.contains_key(&callee)
    }

    /// Fail with a linkage error unless every hook in `required` is resolved.
    pub fn require_hooks(
        &self,
        required: impl IntoIterator<Item = TraceType>,
        options: &TransformOptions,
    ) -> Result<()> {
        for ty in required {
            if !self.hooks.contains_key(&ty) {
                return Err(Error::Linkage {
                    symbol: options.tracing.hooks.get(ty).to_string(),
                });
            }
        }
        Ok(())
    }
}

fn intrinsic_kind_of(symbol: &Symbol, annotation: &str) -> Result<Option<IntrinsicKind>> {
    let Some(marker) = symbol.annotations.find_annotation(annotation) else {
        return Ok(None);
    };
    if let Some(kind) = marker.argument("kind") {
        let name = kind.as_str().ok_or_else(|| {
            Error::Config(format!(
                "`kind` of the intrinsic marker on {} must be a string",
                symbol.fq_name
            ))
        })?;
        return name.parse().map(Some);
    }
    intrinsics::lookup_by_symbol(&symbol.fq_name)
        .map(|spec| Some(spec.kind))
        .ok_or_else(|| {
            Error::Config(format!(
                "intrinsic marker on {} names no kind and the declaration is not in the catalog",
                symbol.fq_name
            ))
        })
}
