use super::{IntrinsicKind, ResultShape};
use std::collections::HashMap;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntrinsicSpec {
    pub kind: IntrinsicKind,
    pub name: &'static str,
    /// Runtime declaration a synthesized call of this kind targets.
    pub canonical_symbol: &'static str,
    pub aliases: &'static [&'static str],
    pub shape: ResultShape,
}

const INTRINSIC_SPECS: &[IntrinsicSpec] = &[
    IntrinsicSpec {
        kind: IntrinsicKind::Here,
        name: "here",
        canonical_symbol: "spyglass.here",
        aliases: &["spyglass.sourceLocation"],
        shape: ResultShape::Location,
    },
    IntrinsicSpec {
        kind: IntrinsicKind::CurrentFile,
        name: "current-file",
        canonical_symbol: "spyglass.currentFile",
        aliases: &[],
        shape: ResultShape::String,
    },
    IntrinsicSpec {
        kind: IntrinsicKind::CurrentLine,
        name: "current-line",
        canonical_symbol: "spyglass.currentLine",
        aliases: &[],
        shape: ResultShape::Int,
    },
    IntrinsicSpec {
        kind: IntrinsicKind::CurrentFunction,
        name: "current-function",
        canonical_symbol: "spyglass.currentFunction",
        aliases: &["spyglass.thisFunction"],
        shape: ResultShape::Function,
    },
    IntrinsicSpec {
        kind: IntrinsicKind::CurrentFunctionHash,
        name: "current-function-hash",
        canonical_symbol: "spyglass.currentFunctionHash",
        aliases: &[],
        shape: ResultShape::Int,
    },
    IntrinsicSpec {
        kind: IntrinsicKind::CurrentClass,
        name: "current-class",
        canonical_symbol: "spyglass.currentClass",
        aliases: &["spyglass.thisClass"],
        shape: ResultShape::Class,
    },
    IntrinsicSpec {
        kind: IntrinsicKind::CurrentClassHash,
        name: "current-class-hash",
        canonical_symbol: "spyglass.currentClassHash",
        aliases: &[],
        shape: ResultShape::Int,
    },
    IntrinsicSpec {
        kind: IntrinsicKind::ClassOf,
        name: "class-of",
        canonical_symbol: "spyglass.classOf",
        aliases: &[],
        shape: ResultShape::Class,
    },
    IntrinsicSpec {
        kind: IntrinsicKind::ClassOfHash,
        name: "class-of-hash",
        canonical_symbol: "spyglass.classHashOf",
        aliases: &[],
        shape: ResultShape::Int,
    },
    IntrinsicSpec {
        kind: IntrinsicKind::TypeOf,
        name: "type-of",
        canonical_symbol: "spyglass.typeOf",
        aliases: &[],
        shape: ResultShape::Type,
    },
    IntrinsicSpec {
        kind: IntrinsicKind::FunctionOf,
        name: "function-of",
        canonical_symbol: "spyglass.functionOf",
        aliases: &[],
        shape: ResultShape::Function,
    },
    IntrinsicSpec {
        kind: IntrinsicKind::FunctionOfHash,
        name: "function-of-hash",
        canonical_symbol: "spyglass.functionHashOf",
        aliases: &[],
        shape: ResultShape::Int,
    },
    IntrinsicSpec {
        kind: IntrinsicKind::PropertyOf,
        name: "property-of",
        canonical_symbol: "spyglass.propertyOf",
        aliases: &[],
        shape: ResultShape::Property,
    },
    IntrinsicSpec {
        kind: IntrinsicKind::FrameSnapshot,
        name: "frame-snapshot",
        canonical_symbol: "spyglass.frameSnapshot",
        aliases: &["spyglass.captureFrame"],
        shape: ResultShape::Snapshot,
    },
];

static LOOKUP_BY_SYMBOL: LazyLock<HashMap<&'static str, &'static IntrinsicSpec>> =
    LazyLock::new(|| {
        let mut map = HashMap::new();
        for spec in INTRINSIC_SPECS {
            map.insert(spec.canonical_symbol, spec);
            for alias in spec.aliases {
                map.insert(*alias, spec);
            }
        }
        map
    });

static LOOKUP_BY_NAME: LazyLock<HashMap<&'static str, &'static IntrinsicSpec>> =
    LazyLock::new(|| INTRINSIC_SPECS.iter().map(|spec| (spec.name, spec)).collect());

pub fn all_specs() -> &'static [IntrinsicSpec] {
    INTRINSIC_SPECS
}

/// Spec of the runtime declaration with this qualified name, if it is a known intrinsic.
pub fn lookup_by_symbol(symbol: &str) -> Option<&'static IntrinsicSpec> {
    LOOKUP_BY_SYMBOL.get(symbol).copied()
}

pub fn lookup_by_name(name: &str) -> Option<&'static IntrinsicSpec> {
    LOOKUP_BY_NAME.get(name).copied()
}

pub fn spec_for(kind: IntrinsicKind) -> &'static IntrinsicSpec {
    INTRINSIC_SPECS
        .iter()
        .find(|spec| spec.kind == kind)
        .unwrap_or_else(|| unreachable!("intrinsic {kind:?} missing from the catalog"))
}
