//! `mockroute init` — generate a starter configuration file.
//!
//! Writes a YAML, JSON, or TOML config with one literal route, one
//! scripted route, and one recorded route with simulated latency. Refuses
//! to overwrite an existing file.

use std::path::PathBuf;

use crate::cli::{ConfigFormat, InitArgs};
use crate::error::MockError;

pub fn execute(args: &InitArgs) -> Result<(), MockError> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("mockroute.{}", args.format.extension())));

    if output.exists() {
        return Err(MockError::FileExists { path: output });
    }

    std::fs::write(&output, template(&args.format))?;
    println!("Created {}", output.display());
    Ok(())
}

#[must_use]
pub const fn template(format: &ConfigFormat) -> &'static str {
    match format {
        ConfigFormat::Yaml => YAML_STARTER,
        ConfigFormat::Json => JSON_STARTER,
        ConfigFormat::Toml => TOML_STARTER,
    }
}

const YAML_STARTER: &str = r#"# mockroute config
#
# Edits are picked up while the server runs.

addr: "127.0.0.1:8090"
reload_interval: 2000          # ms between config file checks
record_dir: "records"

routes:
  # Literal body: {id} is replaced by the matching path segment.
  - path: "GET /items/{id}"
    body: '{"id": "{id}", "name": "item {id}"}'

  # Scripted body: a Handlebars template that must render to JSON.
  - path: "GET /users/{id}"
    script: |
      {"id": {{int id}}, "token": "{{uuid id}}"}
    headers:
      X-Mock: "mockroute"

  # Recorded route with a 150ms +/- 50ms delay.
  - path: "POST /orders"
    status: 201
    body: '{"accepted": true}'
    record: true
    latency: 150
    jitter: 50
"#;

const JSON_STARTER: &str = r#"{
  "addr": "127.0.0.1:8090",
  "reload_interval": 2000,
  "record_dir": "records",
  "routes": [
    {
      "path": "GET /items/{id}",
      "body": "{\"id\": \"{id}\", \"name\": \"item {id}\"}"
    },
    {
      "path": "GET /users/{id}",
      "script": "{\"id\": {{int id}}, \"token\": \"{{uuid id}}\"}",
      "headers": { "X-Mock": "mockroute" }
    },
    {
      "path": "POST /orders",
      "status": 201,
      "body": "{\"accepted\": true}",
      "record": true,
      "latency": 150,
      "jitter": 50
    }
  ]
}
"#;

const TOML_STARTER: &str = r#"# mockroute config
#
# Edits are picked up while the server runs.

addr = "127.0.0.1:8090"
reload_interval = 2000         # ms between config file checks
record_dir = "records"

# Literal body: {id} is replaced by the matching path segment.
[[routes]]
path = "GET /items/{id}"
body = '{"id": "{id}", "name": "item {id}"}'

# Scripted body: a Handlebars template that must render to JSON.
[[routes]]
path = "GET /users/{id}"
script = '{"id": {{int id}}, "token": "{{uuid id}}"}'
headers = { X-Mock = "mockroute" }

# Recorded route with a 150ms +/- 50ms delay.
[[routes]]
path = "POST /orders"
status = 201
body = '{"accepted": true}'
record = true
latency = 150
jitter = 50
"#;
