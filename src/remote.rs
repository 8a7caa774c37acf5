use anyhow::{Context, Result};

use crate::config::ClientConfig;
use crate::model::{ConversionForm, SelectedFile};

mod http_client;

mod types;
pub use self::types::*;
mod operations;

/// The two calls the conversion service offers.
///
/// The controller only ever talks to this trait; `ConversionClient` is the
/// HTTP implementation, tests plug in fakes.
pub trait Backend: Send + Sync {
    fn analyze(&self, file: &SelectedFile) -> Result<AnalysisReport, RemoteError>;

    fn convert(&self, form: &ConversionForm) -> Result<Vec<u8>, RemoteError>;
}

pub struct ConversionClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl ConversionClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        // No client-side deadline; whatever the transport does governs.
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(None::<std::time::Duration>)
            .build()
            .context("build reqwest client")?;
        Ok(Self {
            base_url: config.base_url.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Backend for ConversionClient {
    fn analyze(&self, file: &SelectedFile) -> Result<AnalysisReport, RemoteError> {
        self.analyze_file(file)
    }

    fn convert(&self, form: &ConversionForm) -> Result<Vec<u8>, RemoteError> {
        self.convert_file(form)
    }
}
