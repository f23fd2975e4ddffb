//! Loading configuration from a YAML file

use std::io::Write;

use config::{Config, File};

use aequora_server::model::Configuration;

const APPLICATION_YML: &str = r#"
server:
  port: 9100
  contextPath: /v1
db:
  url: sqlite::memory:
  autoMigrate: false
aequora:
  auth:
    token:
      secretKey: YWVxdW9yYS1kZXZlbG9wbWVudC1zZWNyZXQta2V5LWNoYW5nZS1tZQ==
      expireSeconds: 3600
  booking:
    duplicateWindowSeconds: 0
  payment:
    gateway: sandbox
  logs:
    console: false
    file: false
    level: debug
"#;

fn load(contents: &str) -> Configuration {
    let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();

    let config = Config::builder()
        .add_source(File::from(file.path()))
        .build()
        .unwrap();
    Configuration::from_config(config)
}

#[test]
fn test_yaml_file_is_read() {
    let configuration = load(APPLICATION_YML);

    assert_eq!(configuration.server_port(), 9100);
    assert_eq!(configuration.server_context_path(), "/v1");
    assert_eq!(configuration.database_url().unwrap(), "sqlite::memory:");
    assert!(!configuration.auto_migrate());
    assert_eq!(configuration.token_expire_seconds(), 3600);
    assert!(configuration.booking_policy().duplicate_window.is_zero());
    assert_eq!(configuration.payment_gateway().unwrap().name(), "sandbox");

    let logging = configuration.logging_config();
    assert!(!logging.console_output);
    assert!(!logging.file_logging);
}

#[tokio::test]
async fn test_state_builds_from_file() {
    let configuration = load(APPLICATION_YML);
    let db = configuration.database_connection().await.unwrap();

    let state = aequora_server::model::AppState::new(configuration, db).unwrap();
    assert_eq!(state.gateway().name(), "sandbox");
    assert!(state.booking_policy.duplicate_window.is_zero());
}
