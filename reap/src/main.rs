use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod context;
mod format;

use context::{AppContext, RunOverrides, VerbosityLevel};

/// Reap - Container Image Retention
///
/// Keeps the most recent images of every repository owned by a cloud
/// project and deletes the rest, tags first.
#[derive(Parser, Debug)]
#[command(name = "reap")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (YAML)
    #[arg(short, long, global = true, env = "REAP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one cleanup pass and print the summary
    Run {
        /// Report what would be deleted without deleting anything
        #[arg(long)]
        dry_run: bool,
        /// Number of images to keep per repository
        #[arg(short, long)]
        keep: Option<usize>,
        /// Output format: pretty, json
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// Serve the HTTP trigger: every request runs one cleanup pass
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "0.0.0.0:8080", env = "REAP_BIND")]
        bind: String,
    },
    /// Display version information
    Version,
    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Install the log subscriber. `RUST_LOG` wins over the `-v` count.
fn init_tracing(verbosity: VerbosityLevel) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_context(cli_config: Option<&std::path::Path>) -> AppContext {
    match AppContext::build(cli_config) {
        Ok(ctx) => ctx,
        Err(e) => {
            format::error(&e);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let verbosity = VerbosityLevel::from_count(cli.verbose);

    match cli.command {
        Commands::Run {
            dry_run,
            keep,
            format,
        } => {
            init_tracing(verbosity);
            let ctx = load_context(cli.config.as_deref())
                .with_overrides(RunOverrides { dry_run, keep });
            let fmt = format::OutputFormat::from(format.as_str());
            commands::run::handle_run(&ctx, fmt).await;
        }
        Commands::Serve { bind } => {
            init_tracing(verbosity.max(VerbosityLevel::Info));
            let ctx = load_context(cli.config.as_deref());
            commands::serve::handle_serve(&ctx, &bind).await;
        }
        Commands::Version => {
            commands::version::print_version();
        }
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        }
    }
}
