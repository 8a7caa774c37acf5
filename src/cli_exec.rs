use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use fluxconv::config::ClientConfig;
use fluxconv::delivery::DownloadDir;
use fluxconv::headless::{self, ConversionRequest};
use fluxconv::model::SelectedFile;
use fluxconv::remote::ConversionClient;

pub(crate) struct ConvertArgs {
    pub(crate) file: PathBuf,
    pub(crate) advanced: bool,
    pub(crate) maps: Vec<(String, String)>,
    pub(crate) fields: Vec<(String, String)>,
}

pub(crate) fn analyze(config: &ClientConfig, path: &Path, json: bool) -> Result<()> {
    let file = SelectedFile::read(path)?;
    let client = ConversionClient::new(config)?;
    let report = client
        .analyze_file(&file)
        .with_context(|| format!("analyze {} via {}", path.display(), client.base_url()))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serialize analysis json")?
        );
    } else if report.fields.is_empty() {
        println!("No fields");
    } else {
        for field in &report.fields {
            println!("{}", field);
        }
    }
    Ok(())
}

pub(crate) fn convert(config: &ClientConfig, args: ConvertArgs) -> Result<()> {
    let file = SelectedFile::read(&args.file)?;
    let client = ConversionClient::new(config)?;

    let saved = headless::convert(
        Arc::new(client),
        DownloadDir::new(config.download_dir.clone()),
        ConversionRequest {
            file,
            advanced: args.advanced,
            maps: args.maps,
            fields: args.fields,
        },
    )
    .with_context(|| format!("convert {}", args.file.display()))?;

    println!("Saved {}", saved.display());
    Ok(())
}
