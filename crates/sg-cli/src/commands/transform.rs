use crate::commands::common::{load_module, load_options, source_cache};
use crate::{CliError, Result};
use clap::{Args, ValueEnum};
use sg_core::ir::pretty::{pretty, PrettyOptions};
use sg_core::ir::SymbolTable;
use sg_transform::Pipeline;
use std::path::PathBuf;
use tracing::info;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum EmitFormat {
    /// Indented pseudo-source
    #[default]
    Pretty,
    /// The transformed module as JSON
    Json,
}

/// Arguments for the transform command
#[derive(Debug, Clone, Args)]
pub struct TransformArgs {
    /// IR module (JSON)
    pub input: PathBuf,

    /// Transformation options (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory that source paths in the module are relative to
    #[arg(long)]
    pub sources: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "pretty")]
    pub emit: EmitFormat,

    /// Print expression types in pretty output
    #[arg(long)]
    pub show_types: bool,
}

pub fn transform_command(args: &TransformArgs) -> Result<String> {
    let mut module = load_module(&args.input)?;
    let options = load_options(args.config.as_deref())?;
    let sources = source_cache(args.sources.as_deref(), &args.input);

    let report = Pipeline::new(options).run(&mut module, &sources)?;
    for outcome in &report.per_pass {
        info!("{}: {} changes", outcome.pass, outcome.changed);
    }
    info!(
        "transformed {} ({} changes)",
        module.name, report.total_changes
    );

    match args.emit {
        EmitFormat::Json => serde_json::to_string_pretty(&module)
            .map_err(|e| CliError::InvalidInput(format!("cannot serialise module: {}", e))),
        EmitFormat::Pretty => {
            let symbols = SymbolTable::build(&module);
            let options = PrettyOptions {
                show_types: args.show_types,
                ..PrettyOptions::default()
            };
            Ok(pretty(&module, options).with_symbols(&symbols).to_string())
        }
    }
}
