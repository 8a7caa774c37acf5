use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cli_exec;
mod cli_runtime;

#[derive(Parser)]
#[command(name = "fluxconv")]
#[command(about = "Analyze, remap and convert files through a conversion service", long_about = None)]
pub(crate) struct Cli {
    /// Config file (defaults to ./fluxconv.json when present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Conversion service base URL (overrides the config file)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// List the fields the service finds in a file
    Analyze {
        file: PathBuf,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert a file and save the result as converted.json
    Convert {
        file: PathBuf,

        /// Analyze the file first and send a field mapping
        #[arg(long)]
        advanced: bool,

        /// Rename a source field, e.g. `--map user.name=userName`
        #[arg(long = "map", value_name = "SRC=DST", value_parser = parse_pair, requires = "advanced")]
        maps: Vec<(String, String)>,

        /// Extra form field sent with the conversion
        #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_pair)]
        fields: Vec<(String, String)>,

        /// Directory to save converted.json into (overrides the config file)
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },

    /// Interactive terminal UI
    Tui {
        /// Preselect this file
        #[arg(long)]
        file: Option<PathBuf>,

        /// Write logs here; the TUI does not log otherwise
        #[arg(long, value_name = "PATH")]
        log_file: Option<PathBuf>,
    },
}

pub(crate) fn parse_pair(s: &str) -> Result<(String, String), String> {
    let Some((k, v)) = s.split_once('=') else {
        return Err(format!("expected KEY=VALUE, got {:?}", s));
    };
    let k = k.trim();
    if k.is_empty() {
        return Err(format!("empty key in {:?}", s));
    }
    Ok((k.to_string(), v.to_string()))
}

fn main() {
    if let Err(err) = cli_runtime::run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}
