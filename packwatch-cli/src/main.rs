//! packwatch -- one-shot package tracking cycle and state inspection.
//!
//! Each invocation loads configuration, initialises logging and runs a single
//! subcommand on a current-thread runtime. Errors are printed to stderr and
//! mapped to exit codes by [`CliError::exit_code`].

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::path::Path;

use clap::Parser;
use packwatch_core::config::{GeneralConfig, PackwatchConfig, Profile};

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

fn main() {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to start runtime: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cli)) {
        tracing::error!(error = %e, exit_code = e.exit_code(), "packwatch failed");
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);
    let profile = cli.profile.map(Profile::from);

    match cli.command {
        Commands::Config(args) => {
            // 로딩 실패 자체를 보고해야 하므로 기본 로깅 설정으로 시작
            let mut general = GeneralConfig::default();
            if let Some(level) = cli.log_level {
                general.log_level = level;
            }
            logging::init_tracing(&general)?;
            commands::config::execute(args, &cli.config, profile, &writer).await
        }
        Commands::Run(args) => {
            let config = bootstrap(&cli.config, profile, cli.log_level).await?;
            commands::run::execute(args, &config, &writer).await
        }
        Commands::Show => {
            let config = bootstrap(&cli.config, profile, cli.log_level).await?;
            commands::show::execute(&config, &writer).await
        }
        Commands::Reset => {
            let config = bootstrap(&cli.config, profile, cli.log_level).await?;
            commands::reset::execute(&config, &writer).await
        }
    }
}

/// Load the configuration, then initialise logging from its `[general]` section.
async fn bootstrap(
    path: &Path,
    profile: Option<Profile>,
    log_level: Option<String>,
) -> Result<PackwatchConfig, CliError> {
    let mut config = PackwatchConfig::load(path, profile).await?;
    if let Some(level) = log_level {
        config.general.log_level = level;
    }
    logging::init_tracing(&config.general)?;
    packwatch_core::metrics::describe_all();

    tracing::info!(
        config = %path.display(),
        profile = %config.general.profile,
        unit = %config.tracker.unit_code,
        "packwatch starting"
    );
    Ok(config)
}
