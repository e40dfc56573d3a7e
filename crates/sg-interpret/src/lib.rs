//! Spyglass interpreter
//!
//! Evaluates functions of a (transformed) IR module so instrumented code can
//! be executed and checked against the original.

pub mod error;
pub mod host;
pub mod interpreter;
pub mod value;

pub use host::{HostFunctions, TraceEvent, TraceRecorder};
pub use interpreter::Interpreter;
pub use value::Value;
