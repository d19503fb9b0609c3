use axum::extract::State;
use murmur_common::caller::{Caller, CallerError};
use murmur_db::{
    models::DbUlid,
    storage::{PageRequest, Storage},
};

use crate::{context::ApiContext, error::ApiError};

pub mod auth;
pub mod posts;
pub mod profile;
pub mod timeline;
pub mod users;


#[utoipa::path(
    get,
    path = "/health",
    tags = ["health"],
    responses((status = 200, description = "The store is reachable", body = String))
)]
pub async fn health_check(State(ctx): State<ApiContext>) -> Result<&'static str, ApiError> {
    Storage::ping(&*ctx.db).await?;
    Ok("Healthy")
}

/// The id of the signed-in user acting on this request.
pub(crate) fn acting_user_id(caller: &Caller) -> Result<DbUlid, ApiError> {
    DbUlid::from_string(caller.user_id())
        .ok_or_else(|| CallerError::unauthorized(Some("malformed user id".into())).into())
}

pub(crate) fn page_request(ctx: &ApiContext, page: u64) -> PageRequest {
    PageRequest::new(page, ctx.posts_per_page())
}
