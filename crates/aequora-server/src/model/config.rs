//! Configuration management for the Aequora server
//!
//! Values come from `conf/application.yml`, then `AEQUORA_*` environment
//! variables, then command line flags.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use aequora_auth::{AuthRateLimitConfig, DEFAULT_TOKEN_EXPIRE_SECONDS};
use aequora_common::AequoraError;
use aequora_community::{
    BookingPolicy, HttpGateway, HttpGatewayConfig, PaymentGateway, SandboxGateway,
};

use crate::startup::LoggingConfig;

pub const DEFAULT_CONFIG_FILE: &str = "conf/application.yml";
pub const DEFAULT_SERVER_PORT: u16 = 8000;
pub const DEFAULT_CONTEXT_PATH: &str = "api";

pub const TOKEN_SECRET_KEY: &str = "aequora.auth.token.secretKey";
pub const TOKEN_EXPIRE_SECONDS: &str = "aequora.auth.token.expireSeconds";
pub const PAYMENT_GATEWAY: &str = "aequora.payment.gateway";

/// Command line arguments for the server
#[derive(Debug, Parser)]
#[command(name = "aequora-server", about = "Aequora community services backend")]
struct Cli {
    #[arg(short = 'c', long = "config")]
    config: Option<String>,
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,
    #[arg(long = "db-url", env = "DATABASE_URL")]
    database_url: Option<String>,
}

/// Application configuration loaded from config files and environment
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    /// Load configuration for the running binary
    pub fn new() -> anyhow::Result<Self> {
        let args = Cli::parse();

        let file = args
            .config
            .clone()
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

        let mut builder = Config::builder()
            .add_source(File::with_name(&file).required(args.config.is_some()))
            .add_source(
                Environment::with_prefix("aequora")
                    .separator(".")
                    .try_parsing(true),
            );

        if let Some(port) = args.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(url) = args.database_url {
            builder = builder.set_override("db.url", url)?;
        }

        let config = builder.build().map_err(|e| {
            AequoraError::ConfigError(format!("failed to load configuration from {}: {}", file, e))
        })?;

        Ok(Configuration { config })
    }

    pub fn from_config(config: Config) -> Self {
        Configuration { config }
    }

    // ========================================================================
    // Server Configuration
    // ========================================================================

    pub fn server_address(&self) -> String {
        self.config
            .get_string("server.address")
            .unwrap_or("0.0.0.0".to_string())
    }

    pub fn server_port(&self) -> u16 {
        self.config
            .get_int("server.port")
            .ok()
            .and_then(|v| u16::try_from(v).ok())
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    /// Route prefix, always with a leading slash and no trailing one
    pub fn server_context_path(&self) -> String {
        let path = self
            .config
            .get_string("server.contextPath")
            .unwrap_or(DEFAULT_CONTEXT_PATH.to_string());
        let trimmed = path.trim().trim_matches('/');

        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        }
    }

    // ========================================================================
    // Database Configuration
    // ========================================================================

    pub fn database_url(&self) -> anyhow::Result<String> {
        self.config
            .get_string("db.url")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AequoraError::ConfigError("db.url is required".to_string()).into())
    }

    pub fn auto_migrate(&self) -> bool {
        self.config.get_bool("db.autoMigrate").unwrap_or(true)
    }

    fn pool_setting(&self, key: &str, default: u64) -> u64 {
        self.config
            .get_int(&format!("db.pool.{}", key))
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(default)
    }

    pub async fn database_connection(&self) -> anyhow::Result<DatabaseConnection> {
        let max_connections = self.pool_setting("maximumPoolSize", 20) as u32;
        let min_connections = self.pool_setting("minimumPoolSize", 1) as u32;
        let connect_timeout = self.pool_setting("connectionTimeout", 30);
        let idle_timeout = self.pool_setting("idleTimeout", 600);
        let max_lifetime = self.pool_setting("maxLifetime", 1800);
        let sqlx_logging = self.config.get_bool("db.pool.sqlxLogging").unwrap_or(false);

        let mut opt = ConnectOptions::new(self.database_url()?);
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(connect_timeout))
            .idle_timeout(Duration::from_secs(idle_timeout))
            .max_lifetime(Duration::from_secs(max_lifetime))
            .sqlx_logging(sqlx_logging);

        Ok(Database::connect(opt).await?)
    }

    // ========================================================================
    // Auth Configuration
    // ========================================================================

    pub fn token_secret_key(&self) -> anyhow::Result<String> {
        self.config
            .get_string(TOKEN_SECRET_KEY)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                AequoraError::ConfigError(format!("{} is required", TOKEN_SECRET_KEY)).into()
            })
    }

    pub fn token_expire_seconds(&self) -> i64 {
        self.config
            .get_int(TOKEN_EXPIRE_SECONDS)
            .unwrap_or(DEFAULT_TOKEN_EXPIRE_SECONDS)
    }

    pub fn auth_rate_limit_config(&self) -> AuthRateLimitConfig {
        let defaults = AuthRateLimitConfig::default();
        let seconds = |key: &str, default: Duration| {
            self.config
                .get_int(key)
                .ok()
                .and_then(|v| u64::try_from(v).ok())
                .map(Duration::from_secs)
                .unwrap_or(default)
        };

        AuthRateLimitConfig {
            max_attempts: self
                .config
                .get_int("aequora.auth.ratelimit.maxAttempts")
                .ok()
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(defaults.max_attempts),
            window_duration: seconds(
                "aequora.auth.ratelimit.windowSeconds",
                defaults.window_duration,
            ),
            lockout_duration: seconds(
                "aequora.auth.ratelimit.lockoutSeconds",
                defaults.lockout_duration,
            ),
            enabled: self
                .config
                .get_bool("aequora.auth.ratelimit.enabled")
                .unwrap_or(defaults.enabled),
        }
    }

    /// Bootstrap admin credentials, when both are configured
    pub fn admin_credentials(&self) -> Option<(String, String)> {
        let email = self.config.get_string("aequora.admin.email").ok()?;
        let password = self.config.get_string("aequora.admin.password").ok()?;

        if email.trim().is_empty() || password.is_empty() {
            return None;
        }

        Some((email, password))
    }

    // ========================================================================
    // Booking and Payment Configuration
    // ========================================================================

    pub fn booking_policy(&self) -> BookingPolicy {
        let window = self
            .config
            .get_int("aequora.booking.duplicateWindowSeconds")
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .map(Duration::from_secs)
            .unwrap_or(BookingPolicy::default().duplicate_window);

        BookingPolicy {
            duplicate_window: window,
        }
    }

    pub fn payment_gateway_kind(&self) -> String {
        self.config
            .get_string(PAYMENT_GATEWAY)
            .unwrap_or("sandbox".to_string())
            .to_lowercase()
    }

    pub fn payment_gateway(&self) -> anyhow::Result<Arc<dyn PaymentGateway>> {
        match self.payment_gateway_kind().as_str() {
            "sandbox" => Ok(Arc::new(SandboxGateway)),
            "http" => {
                let timeout_ms = self
                    .config
                    .get_int("aequora.payment.http.timeoutMs")
                    .ok()
                    .and_then(|v| u64::try_from(v).ok())
                    .unwrap_or(5000);

                let gateway = HttpGateway::new(HttpGatewayConfig {
                    url: self
                        .config
                        .get_string("aequora.payment.http.url")
                        .unwrap_or_default(),
                    api_key: self
                        .config
                        .get_string("aequora.payment.http.apiKey")
                        .unwrap_or_default(),
                    timeout: Duration::from_millis(timeout_ms),
                })?;

                Ok(Arc::new(gateway))
            }
            other => Err(AequoraError::ConfigError(format!(
                "{}: unsupported payment gateway '{}'",
                PAYMENT_GATEWAY, other
            ))
            .into()),
        }
    }

    // ========================================================================
    // Logging Configuration
    // ========================================================================

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::from_config(
            self.config.get_string("aequora.logs.path").ok(),
            self.config.get_bool("aequora.logs.console").unwrap_or(true),
            self.config.get_bool("aequora.logs.file").unwrap_or(true),
            self.config
                .get_string("aequora.logs.level")
                .unwrap_or("info".to_string()),
            self.config.get_string("aequora.logs.rotation").ok(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configuration(overrides: &[(&str, &str)]) -> Configuration {
        let mut builder = Config::builder();
        for (key, value) in overrides {
            builder = builder.set_override(*key, *value).unwrap();
        }
        Configuration::from_config(builder.build().unwrap())
    }

    #[test]
    fn test_defaults() {
        let configuration = configuration(&[]);

        assert_eq!(configuration.server_address(), "0.0.0.0");
        assert_eq!(configuration.server_port(), DEFAULT_SERVER_PORT);
        assert_eq!(configuration.server_context_path(), "/api");
        assert_eq!(
            configuration.token_expire_seconds(),
            DEFAULT_TOKEN_EXPIRE_SECONDS
        );
        assert!(configuration.auto_migrate());
        assert!(configuration.admin_credentials().is_none());
        assert_eq!(
            configuration.booking_policy().duplicate_window,
            Duration::from_secs(60)
        );
        assert_eq!(configuration.payment_gateway_kind(), "sandbox");
    }

    #[test]
    fn test_required_values() {
        let configuration = configuration(&[]);

        assert!(configuration.database_url().is_err());
        assert!(configuration.token_secret_key().is_err());
    }

    #[test]
    fn test_context_path_normalised() {
        assert_eq!(
            configuration(&[("server.contextPath", "/v1/")]).server_context_path(),
            "/v1"
        );
        assert_eq!(
            configuration(&[("server.contextPath", "/")]).server_context_path(),
            ""
        );
    }

    #[test]
    fn test_rate_limit_overrides() {
        let config = configuration(&[
            ("aequora.auth.ratelimit.maxAttempts", "3"),
            ("aequora.auth.ratelimit.lockoutSeconds", "30"),
            ("aequora.auth.ratelimit.enabled", "false"),
        ])
        .auth_rate_limit_config();

        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.lockout_duration, Duration::from_secs(30));
        assert_eq!(config.window_duration, Duration::from_secs(60));
        assert!(!config.enabled);
    }

    #[test]
    fn test_payment_gateway_selection() {
        let sandbox = configuration(&[]).payment_gateway().unwrap();
        assert_eq!(sandbox.name(), "sandbox");

        assert!(
            configuration(&[(PAYMENT_GATEWAY, "http")])
                .payment_gateway()
                .is_err()
        );
        assert!(
            configuration(&[(PAYMENT_GATEWAY, "carrier-pigeon")])
                .payment_gateway()
                .is_err()
        );

        let http = configuration(&[
            (PAYMENT_GATEWAY, "HTTP"),
            ("aequora.payment.http.url", "https://pay.example.com"),
            ("aequora.payment.http.apiKey", "key"),
        ])
        .payment_gateway()
        .unwrap();
        assert_eq!(http.name(), "http");
    }

    #[test]
    fn test_admin_credentials() {
        let configuration = configuration(&[
            ("aequora.admin.email", "root@aequora.local"),
            ("aequora.admin.password", "change-me"),
        ]);

        assert_eq!(
            configuration.admin_credentials(),
            Some(("root@aequora.local".to_string(), "change-me".to_string()))
        );
    }
}
