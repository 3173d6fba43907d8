//! `mockroute validate` — check a configuration file for errors.
//!
//! Loads, defaults and validates the config file, then compiles the
//! route table exactly as `run` would (duplicate routes, wildcard shape,
//! script syntax). Reports in human-readable text or JSON.

use std::path::Path;

use crate::cli::{ValidateArgs, ValidateFormat};
use crate::config::sources::FileSource;
use crate::config::{self, validation};
use crate::error::{MockError, ValidationError};
use crate::routes::RouteTable;

pub async fn execute(args: &ValidateArgs) -> Result<(), MockError> {
    let path = config::resolve_path(args.config.as_deref()).await?;

    let config = match FileSource::new(&path).load_sync() {
        Ok(config) => config,
        Err(MockError::ConfigValidation { errors }) => {
            report_errors(&path, &errors, &args.format);
            return Err(MockError::ConfigValidation { errors });
        }
        Err(e) => return Err(e),
    };

    let table = RouteTable::build(&config)?;

    match args.format {
        ValidateFormat::Text => {
            println!(
                "\u{2713} {}",
                validation::format_validation_report(&path.display().to_string(), &config)
            );
        }
        ValidateFormat::Json => {
            let scripted = table.routes().filter(|r| r.is_scripted()).count();
            println!(
                "{}",
                serde_json::json!({
                    "valid": true,
                    "routes": table.len(),
                    "scripted": scripted,
                    "recorded": config.recorded_routes(),
                })
            );
        }
    }

    Ok(())
}

fn report_errors(path: &Path, errors: &[ValidationError], format: &ValidateFormat) {
    match format {
        ValidateFormat::Text => {
            eprintln!("\u{2717} {} has {} errors\n", path.display(), errors.len());
            for error in errors {
                eprintln!("{error}");
            }
        }
        ValidateFormat::Json => {
            let json_errors: Vec<serde_json::Value> = errors
                .iter()
                .map(|e| {
                    serde_json::json!({
                        "route": e.route,
                        "field": e.field,
                        "message": e.message,
                        "suggestion": e.suggestion,
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::json!({
                    "valid": false,
                    "errors": json_errors,
                })
            );
        }
    }
}
