//! Configuration loading, defaulting, and validation.
//!
//! Submodules provide the data model, validation logic, and the file
//! source used for both the initial load and live reloads.
//! [`resolve_path`] picks the config file from an explicit flag or by
//! auto-detecting a well-known name in the working directory.

pub mod model;
pub mod sources;
pub mod validation;

use std::path::{Path, PathBuf};

use crate::error::MockError;

pub const CANDIDATES: &[&str] = &[
    "mockroute.yaml",
    "mockroute.yml",
    "mockroute.json",
    "mockroute.toml",
];

pub async fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf, MockError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    for name in CANDIDATES {
        let path = PathBuf::from(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!(path = %path.display(), "auto-detected config file");
            return Ok(path);
        }
    }

    Err(MockError::NoConfigSource {
        hint: format!(
            "Expected one of {} in the working directory.\n  \
             Provide --config <file>, or run 'mockroute init' to create one.",
            CANDIDATES.join(", ")
        ),
    })
}
