//! Async file-based config source.
//!
//! [`FileSource`] reads the file at a fixed path via Tokio, picks the
//! deserializer from the file extension, applies defaults, and validates
//! the result. The same source is used for the initial load and for every
//! reload, so a reload always re-reads the path the server started with.

use std::path::{Path, PathBuf};

use super::parse_config_str;
use crate::config::model::Config;
use crate::config::validation::validate;
use crate::error::MockError;
use crate::watch::fingerprint;

#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<Config, MockError> {
        let content = read_config_file(&self.path).await?;
        self.parse(&content)
    }

    /// Blocking variant for one-shot commands.
    pub fn load_sync(&self) -> Result<Config, MockError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        self.parse(&content)
    }

    fn parse(&self, content: &str) -> Result<Config, MockError> {
        let ext = self.path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let mut config = parse_config_str(ext, content, &self.path.display().to_string())?
            .apply_defaults(&self.path);
        config.fingerprint = Some(fingerprint(content.as_bytes()));

        if let Err(errors) = validate(&config) {
            return Err(MockError::ConfigValidation { errors });
        }
        Ok(config)
    }

    fn io_error(&self, e: std::io::Error) -> MockError {
        if e.kind() == std::io::ErrorKind::NotFound {
            MockError::ConfigFileNotFound {
                path: self.path.clone(),
            }
        } else {
            MockError::Io(e)
        }
    }
}

/// Read a file, mapping a missing file to [`MockError::ConfigFileNotFound`].
pub async fn read_config_file(path: &Path) -> Result<String, MockError> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MockError::ConfigFileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            MockError::Io(e)
        }
    })
}
