//! Integration tests for config loading across file formats.

use std::path::Path;

use mockroute::cli::ConfigFormat;
use mockroute::cmd::init::template;
use mockroute::config::model::{DEFAULT_ADDR, DEFAULT_CONTENT_TYPE, DEFAULT_RECORD_DIR};
use mockroute::config::sources::{parse_config_str, FileSource};
use mockroute::config::validation::validate;
use mockroute::error::MockError;
use mockroute::routes::RouteTable;

fn load_str(ext: &str, content: &str) -> mockroute::config::model::Config {
    parse_config_str(ext, content, "inline")
        .unwrap()
        .apply_defaults(Path::new("inline"))
}

#[cfg(feature = "yaml")]
#[test]
fn yaml_starter_loads_and_validates() {
    let config = load_str("yaml", template(&ConfigFormat::Yaml));
    validate(&config).unwrap();
    assert_eq!(config.routes.len(), 3);
    assert_eq!(config.routes[1].wildcards, vec!["id".to_string()]);
    assert!(config.routes[2].record);
}

#[cfg(feature = "yaml")]
#[test]
fn minimal_yaml_takes_defaults() {
    let config = load_str("yml", "routes:\n  - path: /ping\n");
    assert_eq!(config.addr, DEFAULT_ADDR);
    assert_eq!(config.record_dir, DEFAULT_RECORD_DIR);
    assert_eq!(config.routes[0].content_type, DEFAULT_CONTENT_TYPE);
    assert_eq!(config.routes[0].status, 200);
    assert!(RouteTable::build(&config).is_ok());
}

#[cfg(feature = "yaml")]
#[test]
fn unknown_fields_are_rejected() {
    let err = parse_config_str("yaml", "routes: []\nbogus: 1\n", "inline").unwrap_err();
    assert!(matches!(err, MockError::ConfigParse { .. }));
}

#[cfg(all(feature = "json", feature = "toml", feature = "yaml"))]
#[test]
fn all_formats_produce_equivalent_configs() {
    let yaml = load_str("yaml", template(&ConfigFormat::Yaml));
    let json = load_str("json", template(&ConfigFormat::Json));
    let toml = load_str("toml", template(&ConfigFormat::Toml));

    for other in [&json, &toml] {
        assert_eq!(yaml.addr, other.addr);
        assert_eq!(yaml.reload_interval, other.reload_interval);
        assert_eq!(yaml.routes.len(), other.routes.len());
        for (a, b) in yaml.routes.iter().zip(&other.routes) {
            assert_eq!(a.path, b.path);
            assert_eq!(a.body, b.body);
            assert_eq!(a.script.as_deref().map(str::trim), b.script.as_deref().map(str::trim));
            assert_eq!(a.headers, b.headers);
            assert_eq!((a.status, a.record, a.latency, a.jitter), (b.status, b.record, b.latency, b.jitter));
        }
    }
}

#[test]
fn unsupported_extension_is_rejected() {
    let err = parse_config_str("ini", "", "inline").unwrap_err();
    assert!(matches!(err, MockError::UnsupportedFormat(ext) if ext == "ini"));
}

#[cfg(feature = "yaml")]
#[tokio::test]
async fn file_source_reports_every_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mockroute.yaml");
    std::fs::write(
        &path,
        "routes:\n  - path: items\n    status: 999\n  - path: FETCH /x\n",
    )
    .unwrap();

    let err = FileSource::new(&path).load().await.unwrap_err();
    let MockError::ConfigValidation { errors } = err else {
        panic!("expected validation errors, got {err}");
    };
    assert_eq!(errors.len(), 3);
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = FileSource::new(dir.path().join("absent.yaml"))
        .load()
        .await
        .unwrap_err();
    assert!(matches!(err, MockError::ConfigFileNotFound { .. }));
}
