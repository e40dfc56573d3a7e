//! Spyglass CLI library
//!
//! Command implementations behind the `sg` binary. Each command returns the
//! text it would print so it can be driven from tests.

pub mod commands;
pub mod diagnostics;

pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum CliError {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("Invalid input: {0}")]
        InvalidInput(String),

        #[error("Configuration error: {0}")]
        Config(String),

        #[error(transparent)]
        Transform(#[from] sg_core::Error),
    }

    pub type Result<T> = std::result::Result<T, CliError>;
}

pub use error::{CliError, Result};
