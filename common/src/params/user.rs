use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ValidationError, validate_about_me, validate_nickname};

/// Request body for editing one's own profile. Absent fields are left as they
/// are.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateProfileParams {
    /// The new nickname. Must be unique across all users.
    pub nickname: Option<String>,

    /// The new about-me text, at most 140 characters. An empty string clears
    /// it.
    pub about_me: Option<String>,
}

/// A validated profile edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub nickname: Option<String>,

    /// `Some(None)` clears the about-me text.
    pub about_me: Option<Option<String>>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.nickname.is_none() && self.about_me.is_none()
    }
}

impl UpdateProfileParams {
    pub fn validate(&self) -> Result<ProfileUpdate, ValidationError> {
        Ok(ProfileUpdate {
            nickname: self.nickname.as_deref().map(validate_nickname).transpose()?,
            about_me: self.about_me.as_deref().map(validate_about_me).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_params_make_an_empty_update() {
        let update = UpdateProfileParams::default().validate().unwrap();
        assert!(update.is_empty());
    }

    #[test]
    fn empty_about_me_clears() {
        let update = UpdateProfileParams {
            nickname: None,
            about_me: Some("".into()),
        }
        .validate()
        .unwrap();

        assert_eq!(update.about_me, Some(None));
        assert!(!update.is_empty());
    }

    #[test]
    fn invalid_nickname_is_rejected() {
        let err = UpdateProfileParams {
            nickname: Some("".into()),
            about_me: Some("fine".into()),
        }
        .validate()
        .unwrap_err();

        assert_eq!(err, ValidationError::Required { field: "nickname" });
    }
}
