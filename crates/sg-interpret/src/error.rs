use sg_core::error::Error;
use sg_core::span::Span;

/// Create a simple interpretation error
pub fn interpretation_error(message: impl Into<String>) -> Error {
    Error::Generic(message.into())
}

/// Create an interpretation error pointing at a span
pub fn interpretation_error_with_span(message: impl Into<String>, span: Span) -> Error {
    Error::Generic(format!("{} [at {}]", message.into(), span))
}

/// Macro to return early with an interpretation error
#[macro_export]
macro_rules! interp_bail {
    ($message:expr) => {
        return Err($crate::error::interpretation_error($message))
    };
    ($message:expr, $span:expr) => {
        return Err($crate::error::interpretation_error_with_span($message, $span))
    };
}

/// Macro to ensure a condition is true, or return an interpretation error
#[macro_export]
macro_rules! interp_ensure {
    ($cond:expr, $message:expr) => {
        if !($cond) {
            $crate::interp_bail!($message);
        }
    };
    ($cond:expr, $message:expr, $span:expr) => {
        if !($cond) {
            $crate::interp_bail!($message, $span);
        }
    };
}
