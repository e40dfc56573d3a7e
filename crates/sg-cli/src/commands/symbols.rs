use crate::commands::common::load_module;
use crate::Result;
use clap::Args;
use sg_core::ir::{SymbolKind, SymbolTable};
use std::fmt::Write;
use std::path::PathBuf;

/// Arguments for the symbols command
#[derive(Debug, Clone, Args)]
pub struct SymbolsArgs {
    /// IR module (JSON)
    pub input: PathBuf,

    /// Include declarations of linked library files
    #[arg(long)]
    pub all: bool,
}

/// One line per indexed declaration: kind, qualified name, origin.
pub fn symbols_command(args: &SymbolsArgs) -> Result<String> {
    let module = load_module(&args.input)?;
    let symbols = SymbolTable::build(&module);
    let mut out = String::new();
    for symbol in symbols.iter().filter(|symbol| args.all || !symbol.external) {
        let kind = match &symbol.kind {
            SymbolKind::Class(_) => "class",
            SymbolKind::Function(_) => "fun",
            SymbolKind::Property(_) => "property",
            SymbolKind::Field(_) => "field",
            SymbolKind::Initializer => "init",
        };
        let _ = writeln!(out, "{kind:<8} {} {:?}", symbol.fq_name, symbol.origin);
    }
    Ok(out)
}
