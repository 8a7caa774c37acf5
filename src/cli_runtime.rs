use anyhow::Result;
use clap::Parser;

use fluxconv::config::ClientConfig;
use fluxconv::logging::{self, LogTarget};

use crate::{Cli, Commands};

pub(crate) fn run() -> Result<()> {
    let cli = Cli::parse();

    let target = match &cli.command {
        Commands::Tui { log_file, .. } => match log_file {
            Some(path) => LogTarget::File(path.clone()),
            None => LogTarget::Off,
        },
        _ => LogTarget::Stderr,
    };
    logging::init(cli.verbose, target)?;

    let config = ClientConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze { file, json } => {
            let config = config.with_overrides(cli.url, None)?;
            crate::cli_exec::analyze(&config, &file, json)
        }
        Commands::Convert {
            file,
            advanced,
            maps,
            fields,
            out,
        } => {
            let config = config.with_overrides(cli.url, out)?;
            crate::cli_exec::convert(
                &config,
                crate::cli_exec::ConvertArgs {
                    file,
                    advanced,
                    maps,
                    fields,
                },
            )
        }
        Commands::Tui { file, .. } => {
            let config = config.with_overrides(cli.url, None)?;
            fluxconv::tui::run_with_options(fluxconv::tui::TuiRunOptions { config, file })
        }
    }
}
