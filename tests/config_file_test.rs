// Integration test for configuration file support

use simherd::config::FleetConfig;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_load_toml_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("fleet.toml");

    let toml_content = r#"
        binary_path = "/opt/sim/simulator"
        log_dir = "/var/log/simherd"
        timeout_hours = 12
        binary_url = "https://releases.example.com/simulator"
        cores_per_slot = 4
        slots = 2
        restart_delay_secs = 10
        fetch_retry_secs = 60
    "#;

    fs::write(&config_path, toml_content).unwrap();

    let config = FleetConfig::from_file(&config_path).unwrap();
    assert_eq!(config.binary_path, PathBuf::from("/opt/sim/simulator"));
    assert_eq!(config.log_dir, PathBuf::from("/var/log/simherd"));
    assert_eq!(config.timeout_hours, 12);
    assert_eq!(
        config.binary_url.as_deref(),
        Some("https://releases.example.com/simulator")
    );
    assert_eq!(config.cores_per_slot, 4);
    assert_eq!(config.slots, Some(2));
    assert_eq!(config.restart_delay_secs, 10);
    assert_eq!(config.fetch_retry_secs, 60);
    assert!(config.validate().is_ok());
}

#[test]
fn test_load_json_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("fleet.json");

    let json_content = r#"
        {
            "binary_path": "/opt/sim/simulator",
            "timeout_hours": 6,
            "cores_per_slot": 1
        }
    "#;

    fs::write(&config_path, json_content).unwrap();

    let config = FleetConfig::from_file(&config_path).unwrap();
    assert_eq!(config.binary_path, PathBuf::from("/opt/sim/simulator"));
    assert_eq!(config.timeout_hours, 6);
    assert_eq!(config.cores_per_slot, 1);

    // Unset fields fall back to defaults
    assert_eq!(config.log_dir, PathBuf::from("logs"));
    assert_eq!(config.restart_delay_secs, 5);
}

#[test]
fn test_load_config_expands_env_vars() {
    std::env::set_var("SIMHERD_IT_ROOT", "/srv/sim");

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("fleet.toml");

    fs::write(
        &config_path,
        r#"
            binary_path = "${SIMHERD_IT_ROOT}/simulator"
            log_dir = "$SIMHERD_IT_ROOT/logs"
        "#,
    )
    .unwrap();

    let config = FleetConfig::from_file(&config_path).unwrap();
    assert_eq!(config.binary_path, PathBuf::from("/srv/sim/simulator"));
    assert_eq!(config.log_dir, PathBuf::from("/srv/sim/logs"));
}

#[test]
fn test_load_config_missing_file() {
    let result = FleetConfig::from_file(&PathBuf::from("/nonexistent/fleet.toml"));
    assert!(result.is_err());
}

#[test]
fn test_load_config_malformed_toml() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("fleet.toml");

    fs::write(&config_path, "binary_path = [not toml").unwrap();

    let result = FleetConfig::from_file(&config_path);
    assert!(result.is_err());
}

#[test]
fn test_loaded_config_validation_catches_bad_values() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("fleet.toml");

    fs::write(
        &config_path,
        r#"
            binary_path = "/opt/sim/simulator"
            timeout_hours = 0
        "#,
    )
    .unwrap();

    let config = FleetConfig::from_file(&config_path).unwrap();
    assert!(config.validate().is_err());
}
