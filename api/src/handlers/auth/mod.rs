use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use murmur_common::{
    params::IdentityParams,
    views::{AuthLoginResponse, User},
};
use murmur_db::{accounts, storage::UserStore};
use tracing::info;

use crate::{
    auth::{
        Auth,
        providers::session::{clear_session_cookie, session_cookie},
    },
    context::ApiContext,
    error::ApiError,
    handlers::acting_user_id,
};

/// Exchange an identity already verified by the identity provider for a
/// session. The first login for an email creates the account.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    tags = ["auth"],
    request_body(content = IdentityParams, content_type = "application/json"),
    responses(
        (status = 201, description = "Account created and signed in", body = AuthLoginResponse),
        (status = 200, description = "Signed in to an existing account", body = AuthLoginResponse),
        (status = 400, description = "Missing or malformed email")
    )
)]
pub async fn auth_login(
    State(ctx): State<ApiContext>,
    Json(body): Json<IdentityParams>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = body.validate()?;
    let outcome = accounts::resolve_login(&*ctx.db, &identity, Utc::now()).await?;

    let status = if outcome.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let created = outcome.is_created();
    let user = outcome.into_user();

    info!(id = %user.id, nickname = %user.nickname, created, "User logged in");

    let cookie = session_cookie(&ctx.session_signer, &user.id, ctx.config.secure_cookies());
    Ok((
        status,
        [(header::SET_COOKIE, cookie)],
        Json(AuthLoginResponse {
            user: user.into(),
            created,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    tags = ["auth"],
    responses((status = 204, description = "Session cookie cleared"))
)]
pub async fn auth_logout(State(ctx): State<ApiContext>) -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(
            header::SET_COOKIE,
            clear_session_cookie(ctx.config.secure_cookies()),
        )],
    )
}

#[utoipa::path(
    get,
    path = "/v1/auth/me",
    tags = ["auth"],
    responses((status = 200, description = "User information", body = User))
)]
pub async fn auth_whoami(
    State(ctx): State<ApiContext>,
    Auth(caller): Auth,
) -> Result<Json<User>, ApiError> {
    let id = acting_user_id(&caller)?;
    let user = UserStore::get_user(&*ctx.db, &id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    Ok(Json(user.into()))
}
