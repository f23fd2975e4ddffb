//! Admin endpoints, mounted under `/admin`

use actix_web::{HttpRequest, HttpResponse, get, patch, web};

use aequora_community::model::{ActivitySearch, StatusRequest, UserSearch};
use aequora_community::service::{activity, admin};
use aequora_persistence::entity::sea_orm_active_enums::Role;

use crate::{
    Secured,
    error::AppError,
    model::{AppState, Result},
    secured,
};

#[get("/users/")]
pub async fn users(
    req: HttpRequest,
    data: web::Data<AppState>,
    params: web::Query<UserSearch>,
) -> std::result::Result<HttpResponse, AppError> {
    secured!(Secured::builder(&req, &data).role(Role::Admin).build());

    Ok(Result::<()>::http_success(
        admin::search_users(data.db(), &params).await?,
    ))
}

#[patch("/users/{id}/status/")]
pub async fn user_status(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
    body: web::Json<StatusRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req, &data).role(Role::Admin).build());

    Ok(Result::<()>::http_success(
        admin::set_user_status(data.db(), &principal, path.into_inner(), body.into_inner())
            .await?,
    ))
}

#[patch("/residents/{id}/verification/")]
pub async fn resident_verification(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i32>,
    body: web::Json<StatusRequest>,
) -> std::result::Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req, &data).role(Role::Admin).build());

    Ok(Result::<()>::http_success(
        admin::set_verification(data.db(), &principal, path.into_inner(), body.into_inner())
            .await?,
    ))
}

#[get("/dashboard-stats/")]
pub async fn dashboard_stats(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> std::result::Result<HttpResponse, AppError> {
    secured!(Secured::builder(&req, &data).role(Role::Admin).build());

    Ok(Result::<()>::http_success(admin::stats(data.db()).await?))
}

#[get("/activity-logs/")]
pub async fn activity_logs(
    req: HttpRequest,
    data: web::Data<AppState>,
    params: web::Query<ActivitySearch>,
) -> std::result::Result<HttpResponse, AppError> {
    secured!(Secured::builder(&req, &data).role(Role::Admin).build());

    Ok(Result::<()>::http_success(
        activity::search(data.db(), &params).await?,
    ))
}
