//! Unified error types for mockroute.
//!
//! Defines [`MockError`] (the main crate error enum) and
//! [`ValidationError`] for config validation failures. Both use
//! `thiserror` for `Display` and `Error` derives. Error messages
//! include contextual hints to guide the user toward a fix.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub route: String,
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  route {}: {}: {}", self.route, self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_lines<T: std::fmt::Display>(items: &[T]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible (only fails on OOM which is unrecoverable)
        let _ = write!(buf, "{item}");
    }
    buf
}

fn format_io_errors(errors: &[(PathBuf, std::io::Error)]) -> String {
    let lines: Vec<String> = errors
        .iter()
        .map(|(path, e)| format!("  {}: {e}", path.display()))
        .collect();
    format_lines(&lines)
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MockError {
    #[error("No config file found.\n\n  {hint}")]
    NoConfigSource { hint: String },

    #[error("Config file not found: {}", path.display())]
    ConfigFileNotFound { path: PathBuf },

    #[error("Config parse error in {path}:\n  {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Config validation failed:\n{}", format_lines(.errors))]
    ConfigValidation { errors: Vec<ValidationError> },

    #[error("Unsupported config format: '{0}'")]
    UnsupportedFormat(String),

    #[error("Duplicate route pattern '{pattern}' (already defined as '{existing}')")]
    DuplicateRoute { pattern: String, existing: String },

    #[error("Invalid route '{pattern}': {message}")]
    InvalidRoute { pattern: String, message: String },

    #[error("Script for route '{pattern}' does not compile: {source}")]
    Script {
        pattern: String,
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("File already exists: {}", path.display())]
    FileExists { path: PathBuf },

    #[error("Failed to close record files:\n{}", format_io_errors(.errors))]
    RecorderClose {
        errors: Vec<(PathBuf, std::io::Error)>,
    },

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl MockError {
    /// True when the error means the config file is gone.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::ConfigFileNotFound { .. } => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display_includes_suggestion() {
        let err = ValidationError {
            route: "items".into(),
            field: "path".into(),
            message: "path must start with '/'".into(),
            suggestion: Some("did you mean '/items'?".into()),
        };
        assert_eq!(
            err.to_string(),
            "  route items: path: path must start with '/' (did you mean '/items'?)"
        );
    }

    #[test]
    fn recorder_close_lists_every_failure() {
        let err = MockError::RecorderClose {
            errors: vec![
                (PathBuf::from("a.log"), std::io::Error::other("disk full")),
                (PathBuf::from("b.log"), std::io::Error::other("gone")),
            ],
        };
        let text = err.to_string();
        assert!(text.starts_with("Failed to close record files"));
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("a.log: disk full"));
        assert!(text.contains("b.log: gone"));
    }

    #[test]
    fn not_found_covers_io_and_config_variants() {
        assert!(MockError::ConfigFileNotFound {
            path: PathBuf::from("x.yaml")
        }
        .is_not_found());
        assert!(MockError::Io(std::io::Error::from(std::io::ErrorKind::NotFound)).is_not_found());
        assert!(!MockError::UnsupportedFormat("xml".into()).is_not_found());
    }
}
