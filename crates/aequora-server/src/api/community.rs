//! Community directory and administration
//!
//! - GET /communities/ - Public list for the registration form
//! - GET|POST /community/ - Admin listing and creation
//! - GET|PUT|DELETE /community/{id}/ - Admin read, update and delete

use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};

use aequora_community::model::CommunityRequest;
use aequora_community::service::community;
use aequora_persistence::entity::sea_orm_active_enums::Role;

use crate::{
    Secured,
    error::AppError,
    model::{AppState, Message, Result},
    secured,
};

#[get("/communities/")]
pub async fn list_public(data: web::Data<AppState>) -> std::result::Result<HttpResponse, AppError> {
    Ok(Result::<()>::http_success(
        community::list_public(data.db()).await?,
    ))
}

#[get("/community/")]
pub async fn list(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> std::result::Result<HttpResponse, AppError> {
    secured!(Secured::builder(&req, &data).role(Role::Admin).build());

    Ok(Result::<()>::http_success(community::list(data.db()).await?))
}

#[post("/community/")]
pub async fn create(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<CommunityRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req, &data).role(Role::Admin).build());

    Ok(Result::<()>::http_created(
        community::create(data.db(), &principal, body.into_inner()).await?,
    ))
}

#[get("/community/{id}/")]
pub async fn get(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
) -> std::result::Result<HttpResponse, AppError> {
    secured!(Secured::builder(&req, &data).role(Role::Admin).build());

    Ok(Result::<()>::http_success(
        community::get(data.db(), path.into_inner()).await?,
    ))
}

#[put("/community/{id}/")]
pub async fn update(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
    body: web::Json<CommunityRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req, &data).role(Role::Admin).build());

    Ok(Result::<()>::http_success(
        community::update(data.db(), &principal, path.into_inner(), body.into_inner()).await?,
    ))
}

#[delete("/community/{id}/")]
pub async fn remove(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req, &data).role(Role::Admin).build());

    community::delete(data.db(), &principal, path.into_inner()).await?;

    Ok(Result::<()>::http_success(Message::new("community deleted")))
}
