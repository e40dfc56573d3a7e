use crate::span::Span;
use miette::Diagnostic;
use std::result;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("unresolved runtime symbol `{symbol}`; is the spyglass runtime on the compilation classpath?")]
    #[diagnostic(code(spyglass::linkage))]
    Linkage { symbol: String },

    #[error("`{intrinsic}` used outside of any {scope} at {span}")]
    #[diagnostic(code(spyglass::not_in_scope))]
    NotInScope {
        intrinsic: String,
        scope: &'static str,
        span: Span,
    },

    #[error("invalid argument for `{intrinsic}` at {span}: {message}")]
    #[diagnostic(code(spyglass::intrinsic_argument))]
    InvalidIntrinsicArgument {
        intrinsic: String,
        message: String,
        span: Span,
    },

    #[error("intrinsic `{intrinsic}` resolved to a {found} but must produce a {expected}")]
    #[diagnostic(code(spyglass::shape_mismatch))]
    ShapeMismatch {
        intrinsic: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("caller-capture marker on `{function}` lists {modes} modes for {params} parameters")]
    #[diagnostic(code(spyglass::mode_list))]
    ModeListMismatch {
        function: String,
        modes: usize,
        params: usize,
    },

    #[error("cannot remove trace call `{callee}` from {container} at {span}")]
    #[diagnostic(code(spyglass::unsupported_container))]
    UnsupportedContainer {
        callee: String,
        container: &'static str,
        span: Span,
    },

    #[error("invalid state: {0}")]
    #[diagnostic(code(spyglass::invalid_state))]
    InvalidState(String),

    #[error("configuration error: {0}")]
    #[diagnostic(code(spyglass::config))]
    Config(String),

    #[error("Generic error: {0}")]
    Generic(String),
}

impl Error {
    /// Source span the error points at, when it has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            Error::NotInScope { span, .. }
            | Error::InvalidIntrinsicArgument { span, .. }
            | Error::UnsupportedContainer { span, .. } => Some(*span),
            _ => None,
        }
    }

    /// Stable diagnostic code, shared with the miette rendering.
    pub fn code_str(&self) -> &'static str {
        match self {
            Error::Linkage { .. } => "spyglass::linkage",
            Error::NotInScope { .. } => "spyglass::not_in_scope",
            Error::InvalidIntrinsicArgument { .. } => "spyglass::intrinsic_argument",
            Error::ShapeMismatch { .. } => "spyglass::shape_mismatch",
            Error::ModeListMismatch { .. } => "spyglass::mode_list",
            Error::UnsupportedContainer { .. } => "spyglass::unsupported_container",
            Error::InvalidState(_) => "spyglass::invalid_state",
            Error::Config(_) => "spyglass::config",
            Error::Generic(_) => "spyglass::generic",
        }
    }
}

pub type Result<T> = result::Result<T, Error>;

// Convert from eyre::Report to our Error type
impl From<eyre::Report> for Error {
    fn from(err: eyre::Report) -> Self {
        Error::Generic(err.to_string())
    }
}

// Convert from std::io::Error to our Error type
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Generic(e.to_string())
    }
}
impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Generic(s)
    }
}
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Generic(e.to_string())
    }
}
