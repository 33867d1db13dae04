// ABOUTME: Entry point for the datalab-launcher CLI application.
// ABOUTME: Parses arguments, sets up logging and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::Transition;
use datalab_launcher::config::{self, Settings};
use datalab_launcher::controls::FormInput;
use datalab_launcher::error::Result;
use datalab_launcher::output::{Output, OutputMode};
use std::env;
use std::fs::File;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(&cli);

    let result = run(cli).await;

    if let Err(e) = result {
        tracing::error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Console output honours -v/-d and RUST_LOG; the log file always gets debug.
fn init_tracing(cli: &Cli) {
    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(console_filter);

    let file = open_log_file(cli).map(|file| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .with_filter(EnvFilter::new("datalab_launcher=debug"))
    });

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .init();
}

/// The log file named by the settings, truncated. Skipped when no settings
/// can be found, so `init` and `--help` leave no file behind.
fn open_log_file(cli: &Cli) -> Option<File> {
    if matches!(cli.command, Commands::Init { .. }) {
        return None;
    }
    let cwd = env::current_dir().ok()?;
    let settings = Settings::discover(cli.config.as_deref(), &cwd).ok()?;
    match File::create(&settings.log_file) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!(
                "Warning: cannot open log file {}: {e}",
                settings.log_file.display()
            );
            None
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let output = Output::new(mode);
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Init { local_drive, force } => {
            let cwd = env::current_dir()?;
            let path = config::init_config(&cwd, local_drive.as_deref(), force)?;
            output.success(&format!("Created {}", path.display()));
            Ok(())
        }
        Commands::Check => commands::check(config, output).await,
        Commands::List => commands::list(config, output).await,
        Commands::Create {
            name,
            project,
            deployment,
            gateway,
        } => {
            commands::create(
                config,
                &name,
                &project,
                deployment,
                gateway.as_deref(),
                output,
            )
            .await
        }
        Commands::Start { name } => {
            commands::transition(config, &name, Transition::Start, output).await
        }
        Commands::Stop { name } => {
            commands::transition(config, &name, Transition::Stop, output).await
        }
        Commands::Remove { name } => {
            commands::transition(config, &name, Transition::Remove, output).await
        }
        Commands::Open { name } => commands::open(config, &name, output).await,
        Commands::Update => commands::update(config, output).await,
        Commands::Controls {
            name,
            project,
            deployment,
            gateway,
        } => {
            let input = FormInput {
                name,
                project,
                deployment,
                gateway,
            };
            commands::controls(config, input, output).await
        }
    }
}
