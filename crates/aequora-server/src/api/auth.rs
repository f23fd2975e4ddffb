//! Identity endpoints
//!
//! - POST /register/ - Self registration
//! - POST /login/ - Issue a token
//! - POST /logout/ - Revoke the presented token
//! - GET|PUT|PATCH /auth/users/me/ - Caller profile
//! - POST /auth/users/set_password/ - Change password

use actix_web::{HttpRequest, HttpResponse, get, http::header, post, route, web};

use aequora_community::model::{
    ClientInfo, LoginRequest, RegisterRequest, SetPasswordRequest, UpdateProfileRequest,
};
use aequora_community::service::account;

use crate::{
    Secured,
    error::AppError,
    middleware::auth::presented_token,
    model::{AppState, Message, Result},
    secured,
};

fn client_info(req: &HttpRequest) -> ClientInfo {
    ClientInfo {
        ip_address: req
            .connection_info()
            .realip_remote_addr()
            .map(str::to_string),
        device_info: req
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.chars().take(255).collect()),
    }
}

#[post("/register/")]
pub async fn register(
    data: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let profile = account::register(data.db(), body.into_inner()).await?;

    Ok(Result::<()>::http_created(profile))
}

#[post("/login/")]
pub async fn login(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let response = account::login(
        data.db(),
        &data.token_service,
        &data.rate_limiter,
        body.into_inner(),
        client_info(&req),
    )
    .await?;

    Ok(Result::<()>::http_success(response))
}

#[post("/logout/")]
pub async fn logout(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req, &data).build());
    let token = presented_token(&req).unwrap_or_default();

    account::logout(data.db(), &data.token_service, &principal, &token).await?;

    Ok(Result::<()>::http_success(Message::new("logged out")))
}

#[get("/auth/users/me/")]
pub async fn me(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req, &data).build());

    Ok(Result::<()>::http_success(
        account::me(data.db(), &principal).await?,
    ))
}

#[route("/auth/users/me/", method = "PUT", method = "PATCH")]
pub async fn update_me(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<UpdateProfileRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req, &data).build());

    Ok(Result::<()>::http_success(
        account::update_me(data.db(), &principal, body.into_inner()).await?,
    ))
}

#[post("/auth/users/set_password/")]
pub async fn set_password(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<SetPasswordRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req, &data).build());

    account::set_password(data.db(), &principal, body.into_inner()).await?;

    Ok(Result::<()>::http_success(Message::new("password updated")))
}
