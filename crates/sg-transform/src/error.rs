use sg_core::error::Error;
use sg_core::intrinsics::IntrinsicKind;
use sg_core::span::Span;

/// A scope-dependent intrinsic was resolved with no enclosing `scope`.
pub fn not_in_scope(kind: IntrinsicKind, scope: &'static str, span: Span) -> Error {
    Error::NotInScope {
        intrinsic: kind.name().to_string(),
        scope,
        span,
    }
}

/// The arguments of an intrinsic call do not have the shape its kind needs.
pub fn invalid_argument(kind: IntrinsicKind, message: impl Into<String>, span: Span) -> Error {
    Error::InvalidIntrinsicArgument {
        intrinsic: kind.name().to_string(),
        message: message.into(),
        span,
    }
}

pub fn invalid_state(message: impl Into<String>) -> Error {
    Error::InvalidState(message.into())
}

