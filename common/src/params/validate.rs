//! Input validation for everything a user can type.
//!
//! Each function takes raw input and returns either the normalised value or a
//! [`ValidationError`] describing the first problem found.

use thiserror::Error;

pub const NICKNAME_MAX_LEN: usize = 64;
pub const EMAIL_MAX_LEN: usize = 120;
pub const ABOUT_ME_MAX_LEN: usize = 140;
pub const POST_BODY_MAX_LEN: usize = 140;

/// Used when neither the identity provider nor the email address yields a
/// usable nickname.
const FALLBACK_NICKNAME: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} may only contain letters, numbers, dots and underscores")]
    InvalidCharacters { field: &'static str },

    #[error("email address is malformed")]
    MalformedEmail,
}

fn is_nickname_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

fn bounded<'a>(
    input: &'a str,
    field: &'static str,
    max: usize,
) -> Result<&'a str, ValidationError> {
    let trimmed = input.trim();
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed)
}

pub fn validate_nickname(input: &str) -> Result<String, ValidationError> {
    let nickname = bounded(input, "nickname", NICKNAME_MAX_LEN)?;
    if nickname.is_empty() {
        return Err(ValidationError::Required { field: "nickname" });
    }
    if !nickname.chars().all(is_nickname_char) {
        return Err(ValidationError::InvalidCharacters { field: "nickname" });
    }
    Ok(nickname.to_string())
}

pub fn validate_email(input: &str) -> Result<String, ValidationError> {
    let email = bounded(input, "email", EMAIL_MAX_LEN)?;
    if email.is_empty() {
        return Err(ValidationError::Required { field: "email" });
    }
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
        {
            Ok(email.to_string())
        }
        _ => Err(ValidationError::MalformedEmail),
    }
}

/// An empty about-me clears the field, hence the `Option`.
pub fn validate_about_me(input: &str) -> Result<Option<String>, ValidationError> {
    let about_me = bounded(input, "about_me", ABOUT_ME_MAX_LEN)?;
    Ok((!about_me.is_empty()).then(|| about_me.to_string()))
}

pub fn validate_post_body(input: &str) -> Result<String, ValidationError> {
    let body = bounded(input, "body", POST_BODY_MAX_LEN)?;
    if body.is_empty() {
        return Err(ValidationError::Required { field: "body" });
    }
    Ok(body.to_string())
}

/// Strips everything a nickname may not contain and caps the length.
pub fn sanitize_nickname(raw: &str) -> String {
    raw.chars()
        .filter(|c| is_nickname_char(*c))
        .take(NICKNAME_MAX_LEN)
        .collect()
}

/// Picks the nickname a new account starts from: the provider's hint when it
/// has one, otherwise the local part of the email address.
pub fn nickname_candidate(hint: Option<&str>, email: &str) -> String {
    let raw = match hint.map(str::trim) {
        Some(hint) if !hint.is_empty() => hint,
        _ => email.split('@').next().unwrap_or_default(),
    };

    let nickname = sanitize_nickname(raw);
    if nickname.is_empty() {
        FALLBACK_NICKNAME.to_string()
    } else {
        nickname
    }
}
