use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use murmur_common::{params::CreatePostParams, views::Post};
use murmur_db::{models::NewDbPost, storage::PostStore};
use tracing::info;

use crate::{auth::Auth, context::ApiContext, error::ApiError, handlers::acting_user_id};

#[utoipa::path(
    post,
    path = "/v1/posts",
    tags = ["posts"],
    request_body(content = CreatePostParams, content_type = "application/json"),
    responses(
        (status = 201, description = "Post published", body = Post),
        (status = 400, description = "Empty or over-long body")
    )
)]
pub async fn create_post(
    State(ctx): State<ApiContext>,
    Auth(caller): Auth,
    Json(body): Json<CreatePostParams>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let author = acting_user_id(&caller)?;
    let body = body.validate()?;

    let post = PostStore::create_post(&*ctx.db, NewDbPost::new(author, body, Utc::now())).await?;
    info!(id = %post.id, %author, "Post published");

    Ok((StatusCode::CREATED, Json(post.into())))
}
