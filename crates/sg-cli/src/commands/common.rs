//! Input loading shared by the commands.

use crate::{CliError, Result};
use sg_core::ir::Module;
use sg_core::source_map::{FsSourceProvider, SourceCache};
use sg_transform::TransformOptions;
use std::path::Path;

/// Read an IR module serialised as JSON.
pub fn load_module(path: &Path) -> Result<Module> {
    if !path.is_file() {
        return Err(CliError::InvalidInput(format!(
            "Input file does not exist: {}",
            path.display()
        )));
    }
    let text = std::fs::read_to_string(path)?;
    let mut module: Module = serde_json::from_str(&text)
        .map_err(|e| CliError::InvalidInput(format!("{}: {}", path.display(), e)))?;
    module.sync_ids();
    Ok(module)
}

/// Options from a TOML file when given, defaults otherwise; environment
/// switches apply on top.
pub fn load_options(config: Option<&Path>) -> Result<TransformOptions> {
    let options = match config {
        Some(path) => TransformOptions::from_path(path)?,
        None => TransformOptions::default(),
    };
    Ok(options.with_env_overrides())
}

/// Source files resolve against `root`, or against the module file's directory.
pub fn source_cache(root: Option<&Path>, module_path: &Path) -> SourceCache {
    let root = root
        .map(Path::to_path_buf)
        .or_else(|| module_path.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    tracing::debug!("resolving sources under {}", root.display());
    SourceCache::from_provider(FsSourceProvider::with_root(root))
}
