//! opcheck - Validate operator bundles before they are published.

mod check;
mod report;

use clap::{Parser, Subcommand};
use opcheck_validation::{DescriptorFailurePolicy, ValidatorConfig};
use report::{FailOn, OutputFormat};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "opcheck")]
#[command(
    author,
    version,
    about = "Check operator bundle manifests for structural and cross-object errors"
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a bundle or package directory
    Validate {
        /// Bundle directory, or a package directory with one bundle per subdirectory
        dir: PathBuf,

        /// Check descriptor names against <name>.v<semver>
        #[arg(long)]
        check_names: bool,

        /// Report a bundle without a descriptor instead of aborting the run
        #[arg(long)]
        continue_on_missing_descriptor: bool,

        /// Which findings make the process exit non-zero
        #[arg(long, value_enum, default_value = "any")]
        fail_on: FailOn,

        /// Report format written to stdout
        #[arg(long, short, value_enum, default_value = "text")]
        output: OutputFormat,
    },
}

fn init_logging(verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Validate {
            dir,
            check_names,
            continue_on_missing_descriptor,
            fail_on,
            output,
        } => {
            let config = ValidatorConfig {
                check_name_format: check_names,
                on_missing_descriptor: if continue_on_missing_descriptor {
                    DescriptorFailurePolicy::Report
                } else {
                    DescriptorFailurePolicy::Abort
                },
            };

            info!("Validating {:?}", dir);
            let results = check::validate_dir(&dir, &config).await?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(report::render(&results, output)?.as_bytes())?;
            stdout.flush()?;

            if fail_on.fails(&results) {
                std::process::exit(1);
            }
            info!("Validation passed");
        }
    }

    Ok(())
}
