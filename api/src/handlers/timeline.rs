use axum::{
    Json,
    extract::{Query, State},
};
use murmur_common::{
    params::PaginationParams,
    views::{PaginatedList, Post},
};
use murmur_db::storage::PostStore;

use crate::{
    auth::Auth,
    context::ApiContext,
    error::ApiError,
    handlers::{acting_user_id, page_request},
};

/// Posts from everyone the caller follows, their own included, newest first.
#[utoipa::path(
    get,
    path = "/v1/timeline",
    tags = ["posts"],
    params(PaginationParams),
    responses((status = 200, description = "One page of the caller's timeline", body = PaginatedList<Post>))
)]
pub async fn get_timeline(
    State(ctx): State<ApiContext>,
    Auth(caller): Auth,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedList<Post>>, ApiError> {
    let id = acting_user_id(&caller)?;
    let page = page_request(&ctx, pagination.page());

    let posts = PostStore::followed_timeline(&*ctx.db, &id, Some(page)).await?;
    Ok(Json(PaginatedList::new(
        posts.into_iter().map(Post::from).collect(),
        page.page,
        page.per_page,
    )))
}
