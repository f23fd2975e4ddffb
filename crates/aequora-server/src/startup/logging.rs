//! Multi-file logging.
//!
//! Every event goes to the console and the root `aequora.log`; component
//! files receive the events of their tracing targets, rotated per `aequora.logs.rotation`:
//!
//! | Log File          | Component                         | Target Prefixes                                   |
//! |-------------------|-----------------------------------|---------------------------------------------------|
//! | aequora.log       | Root logger (all components)      | (all)                                             |
//! | auth.log          | Authentication and authorization  | aequora_auth, aequora_server::middleware, ::api::auth |
//! | community.log     | Community workflows               | aequora_community                                 |
//! | payment.log       | Payment gateway and settlement    | aequora_community::service::payment               |
//! | persistence.log   | Database access and migrations    | aequora_persistence, aequora_migration, sea_orm   |
//! | http.log          | HTTP surface                      | actix_web, aequora_server::api                    |
//!
//! Log files are stored in `~/aequora/logs` unless `aequora.logs.path` says otherwise.

use std::path::PathBuf;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

/// Component files and the target prefixes routed into each
const COMPONENT_LOGS: &[(&str, &[&str])] = &[
    (
        "auth.log",
        &[
            "aequora_auth",
            "aequora_server::middleware",
            "aequora_server::secured",
            "aequora_server::api::auth",
        ],
    ),
    ("community.log", &["aequora_community"]),
    ("payment.log", &["aequora_community::service::payment"]),
    (
        "persistence.log",
        &["aequora_persistence", "aequora_migration", "sea_orm"],
    ),
    ("http.log", &["actix_web", "aequora_server::api"]),
];

const ROOT_LOG: &str = "aequora.log";

/// Log rotation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRotation {
    Daily,
    Hourly,
    Never,
}

impl LogRotation {
    /// Unknown values fall back to daily rotation
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "hourly" => LogRotation::Hourly,
            "never" => LogRotation::Never,
            _ => LogRotation::Daily,
        }
    }
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

fn default_log_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join("aequora").join("logs")
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_dir: PathBuf,
    pub console_output: bool,
    pub file_logging: bool,
    pub level: Level,
    pub rotation: LogRotation,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            console_output: true,
            file_logging: true,
            level: Level::INFO,
            rotation: LogRotation::Daily,
        }
    }
}

impl LoggingConfig {
    /// Build from the `aequora.logs.*` settings; blank or invalid values use the defaults
    pub fn from_config(
        log_dir: Option<String>,
        console_output: bool,
        file_logging: bool,
        level: String,
        rotation: Option<String>,
    ) -> Self {
        Self {
            log_dir: log_dir
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(default_log_dir),
            console_output,
            file_logging,
            level: level.parse().unwrap_or(Level::INFO),
            rotation: rotation
                .as_deref()
                .map(LogRotation::parse)
                .unwrap_or(LogRotation::Daily),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
    }
}

/// Keeps the non-blocking writers alive; dropping it flushes buffered output.
pub struct LoggingGuard {
    _file_guards: Vec<WorkerGuard>,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Non-blocking plain-text layer writing to `file_name` under the log directory
fn file_layer<F>(config: &LoggingConfig, file_name: &str, filter: F) -> (BoxedLayer, WorkerGuard)
where
    F: tracing_subscriber::layer::Filter<Registry> + Send + Sync + 'static,
{
    let appender = RollingFileAppender::new(config.rotation.into(), &config.log_dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_thread_names(true)
        .with_ansi(false)
        .with_filter(filter);

    (Box::new(layer), guard)
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the level of the console and the root file; component
/// files always capture their targets at the configured level.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<LoggingGuard> {
    let mut guards = Vec::new();
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.console_output {
        layers.push(Box::new(
            fmt::layer()
                .with_target(true)
                .with_filter(config.env_filter()),
        ));
    }

    if config.file_logging {
        std::fs::create_dir_all(&config.log_dir)?;

        let (layer, guard) = file_layer(config, ROOT_LOG, config.env_filter());
        layers.push(layer);
        guards.push(guard);

        let level = LevelFilter::from_level(config.level);
        for (file_name, prefixes) in COMPONENT_LOGS {
            let targets = prefixes
                .iter()
                .fold(Targets::new(), |targets, prefix| targets.with_target(*prefix, level));

            let (layer, guard) = file_layer(config, file_name, targets);
            layers.push(layer);
            guards.push(guard);
        }
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    if config.file_logging {
        tracing::info!(
            log_dir = %config.log_dir.display(),
            rotation = ?config.rotation,
            "File logging initialized"
        );
    }

    Ok(LoggingGuard {
        _file_guards: guards,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoggingConfig::default();
        assert!(config.console_output);
        assert!(config.file_logging);
        assert_eq!(config.level, Level::INFO);
        assert_eq!(config.rotation, LogRotation::Daily);
        assert!(config.log_dir.ends_with("aequora/logs"));
    }

    #[test]
    fn test_from_config() {
        let config = LoggingConfig::from_config(
            Some("/tmp/aequora-test-logs".to_string()),
            false,
            true,
            "debug".to_string(),
            Some("Hourly".to_string()),
        );
        assert_eq!(config.log_dir, PathBuf::from("/tmp/aequora-test-logs"));
        assert!(!config.console_output);
        assert_eq!(config.level, Level::DEBUG);
        assert_eq!(config.rotation, LogRotation::Hourly);

        let config = LoggingConfig::from_config(Some(" ".to_string()), true, true, "loud".to_string(), None);
        assert!(config.log_dir.ends_with("aequora/logs"));
        assert_eq!(config.level, Level::INFO);
        assert_eq!(config.rotation, LogRotation::Daily);
    }

    #[test]
    fn test_rotation_parse() {
        assert_eq!(LogRotation::parse("never"), LogRotation::Never);
        assert_eq!(LogRotation::parse(" HOURLY "), LogRotation::Hourly);
        assert_eq!(LogRotation::parse("weekly"), LogRotation::Daily);
    }

    #[test]
    fn test_every_component_routes_some_target() {
        for (file_name, prefixes) in COMPONENT_LOGS {
            assert!(file_name.ends_with(".log"));
            assert_ne!(*file_name, ROOT_LOG);
            assert!(!prefixes.is_empty());
        }
    }
}
