//! HTTP server setup.

use std::sync::Arc;

use actix_web::{App, HttpServer, dev::Server, middleware::Logger, web};

use crate::{api, error, middleware::auth::Authentication, model::AppState};

/// Payload extractor settings shared by the server and the tests
pub fn extractor_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _| error::request_error_handler(err.to_string())),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _| error::request_error_handler(err.to_string())),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _| error::request_error_handler(err.to_string())),
    );
}

/// Creates and binds the main HTTP server.
pub fn main_server(
    app_state: Arc<AppState>,
    context_path: String,
    address: String,
    port: u16,
) -> Result<Server, std::io::Error> {
    Ok(HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Authentication)
            .app_data(web::Data::from(app_state.clone()))
            .configure(extractor_config)
            .service(web::scope(&context_path).configure(api::route::routes))
    })
    .bind((address, port))?
    .run())
}
