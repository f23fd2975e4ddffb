//! Application state shared across all handlers

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use aequora_auth::{AuthRateLimiter, TokenService};
use aequora_community::{BookingPolicy, PaymentGateway};

use super::config::Configuration;

pub struct AppState {
    pub configuration: Configuration,
    pub database_connection: DatabaseConnection,
    pub token_service: Arc<TokenService>,
    pub rate_limiter: Arc<AuthRateLimiter>,
    pub payment_gateway: Arc<dyn PaymentGateway>,
    pub booking_policy: BookingPolicy,
}

impl AppState {
    /// Assemble the state from configuration and an open connection
    pub fn new(
        configuration: Configuration,
        database_connection: DatabaseConnection,
    ) -> anyhow::Result<Self> {
        let token_service = TokenService::new(
            &configuration.token_secret_key()?,
            configuration.token_expire_seconds(),
        )?;
        let rate_limiter = AuthRateLimiter::new(configuration.auth_rate_limit_config());
        let payment_gateway = configuration.payment_gateway()?;
        let booking_policy = configuration.booking_policy();

        Ok(AppState {
            configuration,
            database_connection,
            token_service: Arc::new(token_service),
            rate_limiter: Arc::new(rate_limiter),
            payment_gateway,
            booking_policy,
        })
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.database_connection
    }

    pub fn gateway(&self) -> &dyn PaymentGateway {
        self.payment_gateway.as_ref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("configuration", &self.configuration)
            .field("payment_gateway", &self.payment_gateway.name())
            .field("booking_policy", &self.booking_policy)
            .field("rate_limiter_entries", &self.rate_limiter.len())
            .finish()
    }
}
