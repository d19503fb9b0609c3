use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Result of a follow or unfollow request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FollowResponse {
    /// The nickname of the user that was followed or unfollowed.
    pub nickname: String,

    /// Whether the requesting user follows them now.
    pub following: bool,

    /// False when the request was a no-op because the edge was already in
    /// the requested state.
    pub changed: bool,
}
