use axum::{
    Json,
    extract::{Path, Query, State},
};
use murmur_common::{
    params::PaginationParams,
    views::{FollowResponse, PaginatedList, Post, Profile},
};
use murmur_db::{
    models::{DEFAULT_AVATAR_SIZE, DbUser},
    storage::{FollowOutcome, UnfollowOutcome, UserStore},
};
use tracing::info;

use crate::{
    auth::Auth,
    context::ApiContext,
    error::ApiError,
    handlers::{acting_user_id, page_request},
};

async fn user_by_nickname(ctx: &ApiContext, nickname: &str) -> Result<DbUser, ApiError> {
    UserStore::find_by_nickname(&*ctx.db, nickname)
        .await?
        .ok_or_else(ApiError::not_found)
}

#[utoipa::path(
    get,
    path = "/v1/users/{nickname}",
    tags = ["users"],
    params(("nickname" = String, Path, description = "Nickname of the user")),
    responses(
        (status = 200, description = "Public profile of the user", body = Profile),
        (status = 404, description = "No user has this nickname")
    )
)]
pub async fn get_profile(
    State(ctx): State<ApiContext>,
    Auth(caller): Auth,
    Path(nickname): Path<String>,
) -> Result<Json<Profile>, ApiError> {
    let viewer = acting_user_id(&caller)?;
    let user = user_by_nickname(&ctx, &nickname).await?;

    let followers = ctx.db.follower_count(&user.id).await?;
    let following = ctx.db.following_count(&user.id).await?;
    let is_following = ctx.db.is_following(&viewer, &user.id).await?;

    Ok(Json(Profile {
        avatar_url: user.avatar(DEFAULT_AVATAR_SIZE),
        id: user.id.into(),
        nickname: user.nickname,
        about_me: user.about_me,
        last_seen: user.last_seen,
        followers,
        following,
        is_following,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/users/{nickname}/posts",
    tags = ["users", "posts"],
    params(
        ("nickname" = String, Path, description = "Nickname of the author"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Posts by the user, newest first", body = PaginatedList<Post>),
        (status = 404, description = "No user has this nickname")
    )
)]
pub async fn list_user_posts(
    State(ctx): State<ApiContext>,
    Auth(_caller): Auth,
    Path(nickname): Path<String>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedList<Post>>, ApiError> {
    let user = user_by_nickname(&ctx, &nickname).await?;
    let page = page_request(&ctx, pagination.page());

    let posts = ctx.db.posts_by(&user.id, Some(page)).await?;
    Ok(Json(PaginatedList::new(
        posts.into_iter().map(Post::from).collect(),
        page.page,
        page.per_page,
    )))
}

#[utoipa::path(
    post,
    path = "/v1/users/{nickname}/follow",
    tags = ["users", "graph"],
    params(("nickname" = String, Path, description = "Nickname of the user to follow")),
    responses(
        (status = 200, description = "The caller follows the user", body = FollowResponse),
        (status = 400, description = "The caller tried to follow themselves"),
        (status = 404, description = "No user has this nickname")
    )
)]
pub async fn follow_user(
    State(ctx): State<ApiContext>,
    Auth(caller): Auth,
    Path(nickname): Path<String>,
) -> Result<Json<FollowResponse>, ApiError> {
    let follower = acting_user_id(&caller)?;
    let target = user_by_nickname(&ctx, &nickname).await?;

    if target.id == follower {
        return Err(ApiError::invalid_request("You cannot follow yourself."));
    }

    let outcome = ctx.db.follow(&follower, &target.id).await?;
    if outcome == FollowOutcome::EdgeCreated {
        info!(%follower, followed = %target.id, "Follow edge created");
    }

    Ok(Json(FollowResponse {
        nickname: target.nickname,
        following: true,
        changed: outcome == FollowOutcome::EdgeCreated,
    }))
}

#[utoipa::path(
    post,
    path = "/v1/users/{nickname}/unfollow",
    tags = ["users", "graph"],
    params(("nickname" = String, Path, description = "Nickname of the user to unfollow")),
    responses(
        (status = 200, description = "The caller no longer follows the user", body = FollowResponse),
        (status = 400, description = "The caller tried to unfollow themselves"),
        (status = 404, description = "No user has this nickname")
    )
)]
pub async fn unfollow_user(
    State(ctx): State<ApiContext>,
    Auth(caller): Auth,
    Path(nickname): Path<String>,
) -> Result<Json<FollowResponse>, ApiError> {
    let follower = acting_user_id(&caller)?;
    let target = user_by_nickname(&ctx, &nickname).await?;

    // Removing the self-edge would hide the caller's own posts from their timeline.
    if target.id == follower {
        return Err(ApiError::invalid_request("You cannot unfollow yourself."));
    }

    let outcome = ctx.db.unfollow(&follower, &target.id).await?;
    if outcome == UnfollowOutcome::EdgeRemoved {
        info!(%follower, followed = %target.id, "Follow edge removed");
    }

    Ok(Json(FollowResponse {
        nickname: target.nickname,
        following: false,
        changed: outcome == UnfollowOutcome::EdgeRemoved,
    }))
}
