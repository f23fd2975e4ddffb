//! Notification inbox
//!
//! Each role scope mounts its own `/notifications/` resource; marking a
//! single notification read is shared at `/notifications/{id}/read/`.

use actix_web::{HttpRequest, HttpResponse, Resource, post, web};

use aequora_community::service::notification;
use aequora_persistence::entity::sea_orm_active_enums::Role;

use crate::{
    Secured,
    error::AppError,
    model::{AppState, Result},
    secured,
};

async fn list(
    req: HttpRequest,
    data: web::Data<AppState>,
    role: Role,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req, &data).role(role).build());

    Ok(Result::<()>::http_success(
        notification::list(data.db(), &principal).await?,
    ))
}

async fn mark_all_read(
    req: HttpRequest,
    data: web::Data<AppState>,
    role: Role,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req, &data).role(role).build());
    let updated = notification::mark_all_read(data.db(), &principal).await?;

    Ok(Result::<()>::http_success(
        serde_json::json!({ "marked_read": updated }),
    ))
}

/// `GET` lists and `POST` marks everything read for callers of `role`
pub fn inbox(role: Role) -> Resource {
    web::resource("/notifications/")
        .route(web::get().to(move |req: HttpRequest, data: web::Data<AppState>| {
            list(req, data, role)
        }))
        .route(web::post().to(move |req: HttpRequest, data: web::Data<AppState>| {
            mark_all_read(req, data, role)
        }))
}

#[post("/notifications/{id}/read/")]
pub async fn mark_read(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req, &data).build());

    Ok(Result::<()>::http_success(
        notification::mark_read(data.db(), &principal, path.into_inner()).await?,
    ))
}
