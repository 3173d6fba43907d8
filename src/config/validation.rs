//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed and defaulted [`Config`]
//! for structural errors such as an empty route list, malformed route
//! patterns, unknown HTTP methods, out-of-range status codes, and header
//! names that cannot be sent. Returns a list of [`ValidationError`]
//! values with per-field suggestions.

use http::header::HeaderName;
use http::HeaderValue;

use super::model::{parse_listen_addr, Config};
use crate::error::ValidationError;
use crate::routes::table::split_pattern;

pub const VALID_METHODS: &[&str] = &[
    "GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS",
];

/// Validate a route pattern. Returns `Ok(())` or a human-readable error.
pub fn validate_pattern(pattern: &str) -> Result<(), String> {
    if pattern.trim().is_empty() {
        return Err("path cannot be empty".into());
    }
    let (method, path) = split_pattern(pattern);
    if let Some(method) = method {
        validate_method(method)?;
    }
    if !path.starts_with('/') {
        return Err(format!("path must start with '/' (got '{path}')"));
    }
    Ok(())
}

/// Validate an HTTP method string. Returns `Ok(())` or a human-readable error.
pub fn validate_method(method: &str) -> Result<(), String> {
    if VALID_METHODS.contains(&method) {
        Ok(())
    } else if VALID_METHODS.contains(&method.to_uppercase().as_str()) {
        Err(format!("method '{method}' must be upper case"))
    } else {
        Err(format!("'{method}' is not a valid HTTP method"))
    }
}

pub fn validate_status(status: u16) -> Result<(), String> {
    if (100..=599).contains(&status) {
        Ok(())
    } else {
        Err(format!("{status} is not a valid HTTP status code"))
    }
}

pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.routes.is_empty() {
        errors.push(ValidationError {
            route: "(root)".into(),
            field: "routes".into(),
            message: "at least one route must be defined".into(),
            suggestion: Some("run 'mockroute init' for a starter config".into()),
        });
        return Err(errors);
    }

    if let Err(e) = parse_listen_addr(&config.addr) {
        errors.push(ValidationError {
            route: "(root)".into(),
            field: "addr".into(),
            message: format!("'{}' is not a listen address: {e}", config.addr),
            suggestion: Some("use 'host-ip:port' or ':port'".into()),
        });
    }

    for (i, route) in config.routes.iter().enumerate() {
        let route_id = if route.path.is_empty() {
            format!("routes[{i}]")
        } else {
            route.path.clone()
        };

        if let Err(msg) = validate_pattern(&route.path) {
            let (method, path) = split_pattern(&route.path);
            let suggestion = if !path.is_empty() && !path.starts_with('/') {
                Some(match method {
                    Some(m) => format!("did you mean '{m} /{path}'?"),
                    None => format!("did you mean '/{path}'?"),
                })
            } else {
                method
                    .filter(|m| VALID_METHODS.contains(&m.to_uppercase().as_str()))
                    .map(|m| format!("did you mean '{} {path}'?", m.to_uppercase()))
            };
            errors.push(ValidationError {
                route: route_id.clone(),
                field: "path".into(),
                message: msg,
                suggestion,
            });
        }

        if let Err(msg) = validate_status(route.status) {
            errors.push(ValidationError {
                route: route_id.clone(),
                field: "status".into(),
                message: msg,
                suggestion: None,
            });
        }

        if HeaderValue::from_str(&route.content_type).is_err() {
            errors.push(ValidationError {
                route: route_id.clone(),
                field: "content_type".into(),
                message: format!("'{}' is not a valid header value", route.content_type),
                suggestion: None,
            });
        }

        for (name, value) in &route.headers {
            if HeaderName::from_bytes(name.as_bytes()).is_err() {
                errors.push(ValidationError {
                    route: route_id.clone(),
                    field: "headers".into(),
                    message: format!("'{name}' is not a valid header name"),
                    suggestion: None,
                });
            } else if HeaderValue::from_str(value).is_err() {
                errors.push(ValidationError {
                    route: route_id.clone(),
                    field: format!("headers.{name}"),
                    message: "value is not a valid header value".into(),
                    suggestion: None,
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[must_use]
pub fn format_validation_report(path: &str, config: &Config) -> String {
    let mut lines = vec![format!(
        "  {} routes ({} recorded), reload every {}ms\n",
        config.routes.len(),
        config.recorded_routes(),
        config.reload_interval,
    )];

    for route in &config.routes {
        let mode = if route.script.is_some() {
            "script"
        } else {
            "literal"
        };
        lines.push(format!(
            "  {}  -> {} {} ({mode})",
            route.path, route.status, route.content_type,
        ));
        if !route.wildcards.is_empty() {
            lines.push(format!("    wildcards: {}", route.wildcards.join(", ")));
        }
        if route.latency > 0 || route.jitter > 0 {
            lines.push(format!(
                "    latency: {}ms \u{b1} {}ms",
                route.latency, route.jitter
            ));
        }
        if route.record {
            lines.push(format!("    recorded under {}", config.record_dir));
        }
    }

    format!("{} is valid\n{}", path, lines.join("\n"))
}
