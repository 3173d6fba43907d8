//! File-based config sources.
//!
//! Provides [`parse_config_str`] for format-specific deserialization
//! (YAML, JSON, TOML gated by feature flags) and the [`FileSource`]
//! that reads, parses, defaults and validates a config file.

pub mod file_source;

pub use file_source::FileSource;

use crate::config::model::Config;
use crate::error::MockError;

/// Parse a config string based on file extension.
pub fn parse_config_str(ext: &str, content: &str, path_display: &str) -> Result<Config, MockError> {
    match ext {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => serde_yml::from_str(content).map_err(|e| MockError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "json")]
        "json" => serde_json::from_str(content).map_err(|e| MockError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "toml")]
        "toml" => toml::from_str(content).map_err(|e| MockError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        other => Err(MockError::UnsupportedFormat(other.to_string())),
    }
}
