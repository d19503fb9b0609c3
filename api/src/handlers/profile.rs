use axum::{Json, extract::State};
use murmur_common::{params::UpdateProfileParams, views::User};
use murmur_db::storage::UserStore;
use tracing::info;

use crate::{auth::Auth, context::ApiContext, error::ApiError, handlers::acting_user_id};

/// Edit the caller's own profile. Omitted fields stay as they are; an empty
/// `about_me` clears it.
#[utoipa::path(
    patch,
    path = "/v1/profile",
    tags = ["users"],
    request_body(content = UpdateProfileParams, content_type = "application/json"),
    responses(
        (status = 200, description = "The updated user", body = User),
        (status = 400, description = "Invalid nickname or about me"),
        (status = 409, description = "Nickname already taken by another user")
    )
)]
pub async fn update_profile(
    State(ctx): State<ApiContext>,
    Auth(caller): Auth,
    Json(body): Json<UpdateProfileParams>,
) -> Result<Json<User>, ApiError> {
    let id = acting_user_id(&caller)?;
    let update = body.validate()?;

    let user = UserStore::update_profile(&*ctx.db, &id, update).await?;
    info!(%id, nickname = %user.nickname, "Profile updated");

    Ok(Json(user.into()))
}
