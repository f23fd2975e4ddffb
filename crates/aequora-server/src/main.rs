//! Entry point for the Aequora API server.

use std::sync::Arc;
use std::time::Duration;

use aequora_auth::service::{rate_limit, token};
use aequora_community::service::account;
use aequora_migration::{Migrator, MigratorTrait};
use aequora_server::{
    model::{AppState, Configuration},
    startup::{self, GracefulShutdown},
};
use tracing::{error, info};

const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(10);
const REVOCATION_CLEANUP_INTERVAL: Duration = Duration::from_secs(600);

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let configuration = Configuration::new()?;
    let _logging_guard = startup::init_logging(&configuration.logging_config())?;

    let server_address = configuration.server_address();
    let server_port = configuration.server_port();
    let context_path = configuration.server_context_path();

    let database_connection = configuration.database_connection().await?;

    if configuration.auto_migrate() {
        info!("Applying pending schema migrations");
        Migrator::up(&database_connection, None).await?;
    }

    if let Some((email, password)) = configuration.admin_credentials()
        && account::bootstrap_admin(&database_connection, &email, &password).await?
    {
        info!(email = %email, "Created bootstrap admin account");
    }

    let app_state = Arc::new(AppState::new(configuration, database_connection)?);
    info!(gateway = app_state.gateway().name(), "Payment gateway ready");

    let _rate_limit_cleanup_handle = rate_limit::start_cleanup_task(app_state.rate_limiter.clone());
    let _revocation_cleanup_handle =
        token::start_revocation_cleanup_task(app_state.token_service.clone(), REVOCATION_CLEANUP_INTERVAL);

    let shutdown_signal = startup::wait_for_shutdown_signal().await;
    let graceful_shutdown = GracefulShutdown::new(shutdown_signal, SHUTDOWN_GRACE_PERIOD);

    info!(
        "Starting main server on {}:{}{}",
        server_address, server_port, context_path
    );
    let server = startup::main_server(app_state, context_path, server_address, server_port)?;
    let server_handle = server.handle();

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Main server error: {}", e);
                return Err(e.into());
            }
        }
        _ = graceful_shutdown.wait_for_shutdown() => {
            info!("Main server shutting down gracefully");
            if tokio::time::timeout(
                graceful_shutdown.shutdown_timeout(),
                server_handle.stop(true),
            )
            .await
            .is_err()
            {
                error!("Connections did not drain in time, forcing shutdown");
            }
        }
    }

    info!("Aequora server stopped");
    Ok(())
}
