use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::User;

/// Response for the login endpoint. The session itself travels in the
/// `murmur_session` cookie.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthLoginResponse {
    /// The user the identity resolved to.
    pub user: User,

    /// True when this login created the account.
    pub created: bool,
}
