use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Saves delivered payloads into a directory, the terminal stand-in for a
/// browser download.
#[derive(Clone, Debug)]
pub struct DownloadDir {
    dir: PathBuf,
}

impl DownloadDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Writes `payload` as `suggested_name` (file name component only) and
    /// returns the final path. Existing files are replaced.
    pub fn save(&self, payload: &[u8], suggested_name: &str) -> Result<PathBuf> {
        let name = Path::new(suggested_name)
            .file_name()
            .with_context(|| format!("unusable file name {:?}", suggested_name))?;

        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create download dir {}", self.dir.display()))?;

        let path = self.dir.join(name);
        // Staged under a hidden name; only a complete write is renamed into place.
        let tmp = self.dir.join(format!(".{}.part", name.to_string_lossy()));
        std::fs::write(&tmp, payload).with_context(|| format!("write {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("move {} to {}", tmp.display(), path.display()))?;

        tracing::info!(path = %path.display(), bytes = payload.len(), "saved download");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_writes_under_suggested_name() {
        let dir = tempfile::tempdir().unwrap();
        let downloads = DownloadDir::new(dir.path().join("out"));

        let path = downloads.save(b"{\"a\":1}", "converted.json").unwrap();
        assert_eq!(path, dir.path().join("out").join("converted.json"));
        assert_eq!(std::fs::read(&path).unwrap(), b"{\"a\":1}");

        downloads.save(b"{}", "converted.json").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"{}");
        assert!(!dir.path().join("out").join(".converted.json.part").exists());
    }

    #[test]
    fn save_strips_directory_components() {
        let dir = tempfile::tempdir().unwrap();
        let downloads = DownloadDir::new(dir.path());

        let path = downloads.save(b"x", "../../escape.json").unwrap();
        assert_eq!(path, dir.path().join("escape.json"));
    }

    #[test]
    fn save_rejects_names_without_file_component() {
        let dir = tempfile::tempdir().unwrap();
        let err = DownloadDir::new(dir.path()).save(b"x", "..").unwrap_err();
        assert!(err.to_string().contains("unusable file name"), "{}", err);
    }
}
