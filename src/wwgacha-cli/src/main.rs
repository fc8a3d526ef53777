mod cli;
mod config;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wwgacha::ConfigurationError;

use cli::Cli;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_level());

    let config = config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let config = config::apply_overrides(config, &cli);

    if cli.init {
        for dir in config::init_dirs(&config).context("Failed to create directories")? {
            println!("Created {}", dir.display());
        }
        println!(
            "Put spreadsheet or JSON exports into {} and run wwgacha again",
            config.input_dir.display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    let summary = match wwgacha::run_batch(&config) {
        Err(e @ ConfigurationError::MissingInputDir(_)) => {
            return Err(e).context("Nothing to convert (run `wwgacha --init` to create it)");
        }
        other => other.context("Conversion aborted")?,
    };

    print!("{}", report::render_summary(&summary));

    if summary.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Log to stderr so the summary on stdout stays clean
fn init_logging(level: Level) {
    let filter = EnvFilter::new(log_directives(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

/// Filter directives for the library and binary events, both under the `wwgacha` target
fn log_directives(level: Level) -> String {
    format!("wwgacha={level}")
}
