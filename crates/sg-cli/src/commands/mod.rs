pub mod common;
pub mod symbols;
pub mod transform;

pub use symbols::symbols_command;
pub use transform::transform_command;
