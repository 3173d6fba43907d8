//! Serde data structures for the mockroute configuration file.
//!
//! Contains [`Config`] (the root) and [`Route`]. Both derive `Serialize`
//! and `Deserialize` with `deny_unknown_fields` for strict parsing.
//! Zero values are replaced by defaults in [`Config::apply_defaults`],
//! which also binds the file path and derives each route's wildcards.

use std::collections::BTreeMap;
use std::net::{AddrParseError, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::latency::Latency;
use crate::routes::wildcard;

pub const DEFAULT_ADDR: &str = "127.0.0.1:8090";
pub const DEFAULT_RELOAD_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_RECORD_DIR: &str = "records";
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";
pub const DEFAULT_STATUS: u16 = 200;

fn default_addr() -> String {
    DEFAULT_ADDR.to_string()
}

const fn default_reload_interval() -> u64 {
    DEFAULT_RELOAD_INTERVAL_MS
}

fn default_record_dir() -> String {
    DEFAULT_RECORD_DIR.to_string()
}

fn default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.to_string()
}

const fn default_status() -> u16 {
    DEFAULT_STATUS
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

fn is_false(v: &bool) -> bool {
    !*v
}

fn is_default_content_type(v: &str) -> bool {
    v == DEFAULT_CONTENT_TYPE
}

fn is_default_status(v: &u16) -> bool {
    *v == DEFAULT_STATUS
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_addr")]
    pub addr: String,

    /// Poll interval of the config watcher, in milliseconds.
    #[serde(default = "default_reload_interval")]
    pub reload_interval: u64,

    #[serde(default = "default_record_dir")]
    pub record_dir: String,

    #[serde(default)]
    pub routes: Vec<Route>,

    /// File this configuration was read from. Fixed for the lifetime of
    /// the instance; reloads re-read the same path.
    #[serde(skip)]
    pub path: PathBuf,

    /// SHA-256 of the file content this configuration was parsed from.
    #[serde(skip)]
    pub fingerprint: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Route {
    /// `[METHOD ]/path/{wildcard}` pattern.
    pub path: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,

    /// Handlebars template rendered instead of `body` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    #[serde(
        default = "default_content_type",
        skip_serializing_if = "is_default_content_type"
    )]
    pub content_type: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    #[serde(default = "default_status", skip_serializing_if = "is_default_status")]
    pub status: u16,

    #[serde(default, skip_serializing_if = "is_false")]
    pub record: bool,

    /// Base response delay in milliseconds.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub latency: u64,

    /// Jitter bound in milliseconds applied around `latency`.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub jitter: u64,

    #[serde(skip)]
    pub wildcards: Vec<String>,
}

impl Config {
    /// Bind the source path, fill zero values with defaults, and derive
    /// every route's wildcard list from its pattern.
    #[must_use]
    pub fn apply_defaults(mut self, path: &Path) -> Self {
        self.path = path.to_path_buf();

        if self.addr.is_empty() {
            self.addr = default_addr();
        }
        if self.reload_interval == 0 {
            self.reload_interval = DEFAULT_RELOAD_INTERVAL_MS;
        }
        if self.record_dir.is_empty() {
            self.record_dir = default_record_dir();
        }

        for route in &mut self.routes {
            route.apply_defaults();
        }
        self
    }

    #[must_use]
    pub const fn reload_interval(&self) -> Duration {
        Duration::from_millis(self.reload_interval)
    }

    #[must_use]
    pub fn recorded_routes(&self) -> usize {
        self.routes.iter().filter(|r| r.record).count()
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, AddrParseError> {
        parse_listen_addr(&self.addr)
    }
}

/// Parse `ip:port`, or `:port` meaning every interface.
pub fn parse_listen_addr(addr: &str) -> Result<SocketAddr, AddrParseError> {
    match addr.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}").parse(),
        None => addr.parse(),
    }
}

impl Route {
    /// A route with every optional field at its default.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        let mut route = Self {
            path: path.into(),
            body: String::new(),
            script: None,
            content_type: default_content_type(),
            headers: BTreeMap::new(),
            status: DEFAULT_STATUS,
            record: false,
            latency: 0,
            jitter: 0,
            wildcards: Vec::new(),
        };
        route.apply_defaults();
        route
    }

    fn apply_defaults(&mut self) {
        if self.content_type.is_empty() {
            self.content_type = default_content_type();
        }
        if self.status == 0 {
            self.status = DEFAULT_STATUS;
        }
        self.wildcards = wildcard::extract(&self.path);
    }

    #[must_use]
    pub const fn latency(&self) -> Latency {
        Latency::new(
            Duration::from_millis(self.latency),
            Duration::from_millis(self.jitter),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listen_addr_accepts_port_shorthand() {
        assert_eq!(
            parse_listen_addr(":9000").unwrap(),
            "0.0.0.0:9000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(parse_listen_addr(DEFAULT_ADDR).unwrap().port(), 8090);
        assert!(parse_listen_addr("localhost").is_err());
    }

    #[test]
    fn zero_values_take_defaults() {
        let json = r#"{
            "addr": "",
            "reload_interval": 0,
            "record_dir": "",
            "routes": [{"path": "GET /a", "content_type": "", "status": 0}]
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        let config = config.apply_defaults(Path::new("mock.json"));

        assert_eq!(config.addr, DEFAULT_ADDR);
        assert_eq!(config.reload_interval(), Duration::from_secs(2));
        assert_eq!(config.record_dir, "records");
        assert_eq!(config.path, PathBuf::from("mock.json"));
        assert_eq!(config.routes[0].content_type, "application/json");
        assert_eq!(config.routes[0].status, 200);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: Config = serde_json::from_str(r#"{"routes": [{"path": "/a"}]}"#).unwrap();
        let config = config.apply_defaults(Path::new("mock.json"));
        assert_eq!(config.addr, DEFAULT_ADDR);
        assert_eq!(config.reload_interval, 2000);
        assert!(!config.routes[0].record);
        assert!(config.routes[0].latency().is_zero());
    }

    #[test]
    fn wildcards_come_from_the_pattern_only() {
        let json = r#"{"routes": [{"path": "GET /users/{user}/posts/{post}", "body": "{other}"}]}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        let config = config.apply_defaults(Path::new("mock.json"));
        assert_eq!(config.routes[0].wildcards, vec!["user", "post"]);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_str::<Config>(r#"{"routes": [], "listen": ":80"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn wildcards_are_never_deserialized() {
        let result =
            serde_json::from_str::<Config>(r#"{"routes": [{"path": "/a", "wildcards": ["x"]}]}"#);
        assert!(result.is_err());
    }
}
