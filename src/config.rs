use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "fluxconv.json";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Where the conversion service lives, e.g. `http://127.0.0.1:8080`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Directory converted files are saved into.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_user_agent() -> String {
    "fluxconv".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            download_dir: default_download_dir(),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Reads `path`, or `fluxconv.json` in the working directory when `path` is
    /// `None`. A missing default file yields the defaults; a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !required && !path.exists() {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            return Ok(Self::default());
        }

        let bytes =
            std::fs::read(&path).with_context(|| format!("read config {}", path.display()))?;
        let cfg: ClientConfig = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg.validated()
    }

    pub fn with_overrides(
        mut self,
        base_url: Option<String>,
        download_dir: Option<PathBuf>,
    ) -> Result<Self> {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        if let Some(dir) = download_dir {
            self.download_dir = dir;
        }
        self.validated()
    }

    fn validated(mut self) -> Result<Self> {
        let url = self.base_url.trim().trim_end_matches('/').to_string();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!(
                "base_url must start with http:// or https:// (got {:?})",
                self.base_url
            );
        }
        self.base_url = url;
        if self.user_agent.trim().is_empty() {
            self.user_agent = default_user_agent();
        }
        Ok(self)
    }
}
