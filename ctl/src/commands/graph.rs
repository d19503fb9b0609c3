use clap::Parser;
use murmur_db::storage::{FollowOutcome, FollowStore, Storage, UnfollowOutcome};

use super::user_by_nickname;

#[derive(Clone, Parser)]
pub struct EdgeParams {
    /// Nickname of the user doing the following.
    pub follower: String,

    /// Nickname of the user being followed.
    pub followed: String,
}

pub async fn follow(stg: &dyn Storage, params: EdgeParams) -> anyhow::Result<String> {
    let follower = user_by_nickname(stg, &params.follower).await?;
    let followed = user_by_nickname(stg, &params.followed).await?;

    Ok(match FollowStore::follow(stg, &follower.id, &followed.id).await? {
        FollowOutcome::EdgeCreated => {
            format!("{} now follows {}", follower.nickname, followed.nickname)
        }
        FollowOutcome::NoOp => {
            format!("{} already follows {}", follower.nickname, followed.nickname)
        }
    })
}

/// Unlike the API this lets an operator remove a self-edge.
pub async fn unfollow(stg: &dyn Storage, params: EdgeParams) -> anyhow::Result<String> {
    let follower = user_by_nickname(stg, &params.follower).await?;
    let followed = user_by_nickname(stg, &params.followed).await?;

    Ok(match FollowStore::unfollow(stg, &follower.id, &followed.id).await? {
        UnfollowOutcome::EdgeRemoved => {
            format!("{} no longer follows {}", follower.nickname, followed.nickname)
        }
        UnfollowOutcome::NoOp => {
            format!("{} was not following {}", follower.nickname, followed.nickname)
        }
    })
}
