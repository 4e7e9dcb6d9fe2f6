use std::fs;

use pai_core::config::{ClusterConfig, ConfigError};
use tempfile::TempDir;

fn write_fixture(content: &str) -> (TempDir, std::path::PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("clusters.json");
    fs::write(&path, content).unwrap();
    (temp_dir, path)
}

#[test]
fn test_load_descriptor_from_file() {
    let (_temp, path) = write_fixture(
        r#"[{
            "username": "admin",
            "password": "admin-password",
            "rest_server_uri": "http://10.0.0.1:9186",
            "token": "pre-provisioned"
        }]"#,
    );

    let config = ClusterConfig::from_file(&path).unwrap();
    assert_eq!(config.username, "admin");
    assert_eq!(config.password, "admin-password");
    assert_eq!(config.rest_server_uri, "http://10.0.0.1:9186");
    assert_eq!(config.token, "pre-provisioned");
}

#[test]
fn test_first_entry_is_the_default() {
    let (_temp, path) = write_fixture(
        r#"[
            {"username": "first", "rest_server_uri": "http://a:9186"},
            {"username": "second", "rest_server_uri": "http://b:9186"}
        ]"#,
    );

    let config = ClusterConfig::from_file(&path).unwrap();
    assert_eq!(config.username, "first");

    let all = ClusterConfig::all_from_file(&path).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].username, "second");
}

#[test]
fn test_empty_fixture_is_an_error() {
    let (_temp, path) = write_fixture("[]");
    assert!(matches!(
        ClusterConfig::from_file(&path),
        Err(ConfigError::EmptyFile)
    ));
}

#[test]
fn test_malformed_fixture_is_an_error() {
    let (_temp, path) = write_fixture("{ not json ]");
    assert!(matches!(
        ClusterConfig::from_file(&path),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn test_missing_fixture_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("does-not-exist.json");
    assert!(matches!(
        ClusterConfig::from_file(path),
        Err(ConfigError::ReadError(_))
    ));
}

#[test]
fn test_load_honors_env_selection_and_overrides() {
    let (_temp, path) = write_fixture(
        r#"[{"username": "fromfile", "rest_server_uri": "http://a:9186"}]"#,
    );

    std::env::set_var("PAI_CLUSTER_FILE", &path);
    std::env::set_var("PAI_USERNAME", "fromenv");
    let config = ClusterConfig::load().unwrap();
    std::env::remove_var("PAI_CLUSTER_FILE");
    std::env::remove_var("PAI_USERNAME");

    assert_eq!(config.username, "fromenv");
    assert_eq!(config.rest_server_uri, "http://a:9186");
}

#[test]
fn test_validate_requires_uri_and_username() {
    let config = ClusterConfig {
        username: String::new(),
        password: String::new(),
        rest_server_uri: "http://10.0.0.1:9186".to_string(),
        token: String::new(),
    };
    assert!(config.validate().is_err());

    let config = ClusterConfig {
        username: "admin".to_string(),
        password: String::new(),
        rest_server_uri: "http://10.0.0.1:9186".to_string(),
        token: String::new(),
    };
    assert!(config.validate().is_ok());
}
