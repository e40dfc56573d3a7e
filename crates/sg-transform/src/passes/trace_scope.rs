//! Trace types active at a point of the traversal.

use crate::context::TraversalContext;
use crate::options::TransformOptions;
use sg_core::error::{Error, Result};
use sg_core::ir::{Annotation, AnnotationsExt};
use sg_core::trace::{TraceType, TraceTypes};

/// Types selected by one `Traced` usage. Without a `types` argument every
/// type is selected.
pub fn traced_types(annotation: &Annotation) -> Result<TraceTypes> {
    let Some(types) = annotation.argument("types") else {
        return Ok(TraceTypes::all());
    };
    let names = types.as_strings().ok_or_else(|| {
        Error::Config(format!(
            "`types` of `{}` must be an array of trace type names",
            annotation.class
        ))
    })?;
    names
        .into_iter()
        .map(str::parse::<TraceType>)
        .collect::<Result<TraceTypes>>()
}

/// Union of the configured defaults and the types selected on `annotations`.
pub fn declared_types(
    annotations: &[Annotation],
    options: &TransformOptions,
) -> Result<TraceTypes> {
    let mut active = TraceTypes::empty();
    for annotation in annotations.annotations_of(&options.tracing.annotation) {
        active |= traced_types(annotation)?;
    }
    Ok(active)
}

/// Types active at the current point: the defaults plus whatever the
/// enclosing classes and functions select.
pub fn active_types(cx: &TraversalContext<'_>, options: &TransformOptions) -> Result<TraceTypes> {
    let mut active = options.tracing.default_set();
    for decl in cx.scopes.declarations() {
        if let Some(symbol) = cx.symbols.get(decl) {
            active |= declared_types(&symbol.annotations, options)?;
        }
    }
    Ok(active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sg_core::ir::AnnotationArg;
    use sg_core::span::{FileId, Span};

    fn traced(types: &[&str]) -> Annotation {
        Annotation::new("spyglass.trace.Traced", Span::synthetic(FileId(0)))
            .with_argument("types", AnnotationArg::strings(types.iter().copied()))
    }

    #[test]
    fn usages_compose_by_union() -> Result<()> {
        let options = TransformOptions::default();
        let annotations = vec![traced(&["function-enter"]), traced(&["span-enter", "event"])];
        let active = declared_types(&annotations, &options)?;
        assert_eq!(active.to_string(), "[span-enter, function-enter, event]");
        Ok(())
    }

    #[test]
    fn bare_usage_selects_everything() -> Result<()> {
        let bare = Annotation::new("spyglass.trace.Traced", Span::synthetic(FileId(0)));
        assert_eq!(traced_types(&bare)?, TraceTypes::all());
        Ok(())
    }

    #[test]
    fn unknown_type_names_are_rejected() {
        assert!(traced_types(&traced(&["function-exit"])).is_err());
    }
}
