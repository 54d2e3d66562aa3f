use crate::context::AppContext;
use crate::format::{self, OutputFormat};
use libreap::{Config, Reaper};

/// Run one retention pass and render its summary.
pub async fn run_once(config: &Config, format: OutputFormat) -> Result<String, String> {
    let reaper = Reaper::from_config(config).map_err(|e| e.to_string())?;
    let summary = reaper.run().await.map_err(|e| e.to_string())?;
    format::render_summary(&summary, format)
}

/// Handle the run subcommand
pub async fn handle_run(ctx: &AppContext, format: OutputFormat) {
    if ctx.config.dry_run && format == OutputFormat::Pretty {
        format::warning("Dry run: nothing will be deleted");
    }

    match run_once(&ctx.config, format).await {
        Ok(output) => match format {
            OutputFormat::Pretty => format::success(&output),
            OutputFormat::Json => println!("{}", output),
        },
        Err(e) => {
            format::error(&format!("Run aborted: {}", e));
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
