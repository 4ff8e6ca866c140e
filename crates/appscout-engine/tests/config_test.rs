use appscout_engine::catalog::DescriptorCatalog;
use appscout_engine::config::{AppscoutConfig, ConfigError, ConfigLoader};
use appscout_engine::Strategy;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_default_values() {
    let config = AppscoutConfig::default();
    assert_eq!(config.resolver.default_timeout_ms, 15000);
    assert_eq!(config.resolver.max_attempts, 3);
    assert_eq!(config.resolver.backoff_base_ms, 1000);
    assert_eq!(config.resolver.backoff_cap_ms, 5000);
    assert_eq!(config.condition.max_attempts, 5);
    assert_eq!(config.condition.initial_delay_ms, 500);
    assert_eq!(config.webdriver.url, "http://localhost:4723");
    assert!(config.webdriver.capabilities.is_empty());
}

#[tokio::test]
async fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
resolver:
  default_timeout_ms: 8000
  max_attempts: 4
webdriver:
  url: "http://hub.example:4444/wd/hub"
  capabilities:
    platformName: Android
    appium:deviceName: Pixel 7
"#
    )
    .unwrap();

    let config = ConfigLoader::load_from(file.path())
        .await
        .expect("Failed to load config from file");

    assert_eq!(config.resolver.default_timeout_ms, 8000);
    assert_eq!(config.resolver.max_attempts, 4);
    // Unspecified fields keep their defaults
    assert_eq!(config.resolver.backoff_cap_ms, 5000);
    assert_eq!(config.condition.initial_delay_ms, 500);
    assert_eq!(config.webdriver.url, "http://hub.example:4444/wd/hub");
    assert_eq!(
        config.webdriver.capabilities.get("platformName"),
        Some(&serde_json::json!("Android"))
    );
}

#[tokio::test]
async fn test_load_from_nonexistent_file() {
    let result =
        ConfigLoader::load_from(std::path::Path::new("/nonexistent/path/appscout.yaml")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_load_malformed_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "resolver: [not, a, map]").unwrap();

    let result = ConfigLoader::load_from(file.path()).await;
    assert!(result.is_err());
}

#[test]
fn test_defaults_are_valid() {
    assert!(AppscoutConfig::default().validate().is_ok());
    assert!(ConfigLoader::parse("{}").is_ok());
}

#[test]
fn test_zero_resolver_attempts_rejected() {
    let err = ConfigLoader::parse("resolver:\n  max_attempts: 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("resolver.max_attempts")));
}

#[test]
fn test_zero_condition_attempts_rejected() {
    let err = ConfigLoader::parse("condition:\n  max_attempts: 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("condition.max_attempts")));
}

#[test]
fn test_backoff_cap_below_base_rejected() {
    let yaml = "resolver:\n  backoff_base_ms: 2000\n  backoff_cap_ms: 500\n";
    let err = ConfigLoader::parse(yaml).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    // Equal base and cap is a flat delay, which is fine
    let yaml = "resolver:\n  backoff_base_ms: 2000\n  backoff_cap_ms: 2000\n";
    assert!(ConfigLoader::parse(yaml).is_ok());
}

#[tokio::test]
async fn test_load_from_rejects_invalid_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "resolver:\n  max_attempts: 0").unwrap();

    let result = ConfigLoader::load_from(file.path()).await;
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[tokio::test]
async fn test_catalog_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
pages:
  onboarding:
    skip:
      strategy: id
      selector: org.wikipedia:id/fragment_onboarding_skip_button
      description: Skip onboarding
"#
    )
    .unwrap();

    let catalog = DescriptorCatalog::load_from(file.path()).await.unwrap();
    let skip = catalog.descriptor("onboarding", "skip").unwrap();
    assert_eq!(skip.strategy, Strategy::Id);
    assert_eq!(skip.description, "Skip onboarding");
}
