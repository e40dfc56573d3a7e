use crate::{CliError, Result};
use sg_core::diagnostics::diagnostic_manager;

/// Install miette as the global error handler
pub fn setup_error_reporting() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .map_err(|e| CliError::Config(format!("Failed to setup error reporting: {}", e)))?;

    Ok(())
}

/// Render a transformation failure together with the diagnostics the pipeline
/// recorded for it. Returns false for errors that have no rich rendering.
pub fn render_cli_error(error: &CliError) -> bool {
    let CliError::Transform(inner) = error else {
        return false;
    };
    let mut rendered = String::new();
    let handler = miette::GraphicalReportHandler::new();
    if handler.render_report(&mut rendered, inner).is_err() {
        return false;
    }
    eprintln!("{rendered}");
    for diagnostic in diagnostic_manager().get_diagnostics() {
        eprintln!("  {diagnostic}");
    }
    true
}
