use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ValidationError, nickname_candidate, validate_email};

/// An identity asserted by the external identity provider after a successful
/// login. The email address has already been verified by the provider.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct IdentityParams {
    /// The verified email address of the user.
    pub email: String,

    /// The nickname the provider suggests for the user, if any. When absent
    /// the local part of the email address is used.
    #[serde(default)]
    pub nickname: Option<String>,
}

/// A validated identity, ready to be resolved against the user store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub email: String,

    /// Candidate nickname for a newly created account. It may still collide
    /// with an existing user; the store resolves that.
    pub nickname: String,
}

impl IdentityParams {
    pub fn validate(&self) -> Result<VerifiedIdentity, ValidationError> {
        let email = validate_email(&self.email)?;
        let nickname = nickname_candidate(self.nickname.as_deref(), &email);
        Ok(VerifiedIdentity { email, nickname })
    }
}
