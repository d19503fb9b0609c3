//! Session-based authentication provider.
//!
//! Session cookies are stateless: the cookie named `murmur_session` holds the
//! user id signed with the server's session secret, in the format
//! `{user_id}.{hmac_signature}`. Logging out clears the cookie.
//!
//! # Authentication Flow
//!
//! 1. Extract `murmur_session` cookie from request
//! 2. Verify the HMAC signature on the cookie value
//! 3. Parse the user id from the signed value
//! 4. Fetch the user from the store
//! 5. Record the request in the user's `last_seen`
//! 6. Return the authenticated `Caller`
//!
//! The cookie is HttpOnly and SameSite=Lax, so browsers do not attach it to
//! cross-site POSTs.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header, request::Parts};
use chrono::Utc;
use murmur_common::caller::Caller;
use murmur_db::{
    models::DbUlid,
    storage::{Storage, UserStore},
};
use tracing::{debug, instrument};

use crate::auth::{error::AuthError, provider::AuthProvider, signing::SessionSigner};

pub const SESSION_COOKIE: &str = "murmur_session";

/// 30 days.
const SESSION_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;

/// Authentication provider for session-based auth.
///
/// # Cookie Security
///
/// - HttpOnly: JavaScript cannot access the cookie (XSS protection)
/// - SameSite=Lax: Cookie not sent on cross-site POST
/// - Secure: Cookie only sent over HTTPS when the public URL is HTTPS
/// - Max-Age: 30 days
pub struct SessionAuthProvider {
    signer: Arc<SessionSigner>,
    db: Arc<dyn Storage>,
}

impl SessionAuthProvider {
    pub fn new(signer: Arc<SessionSigner>, db: Arc<dyn Storage>) -> Self {
        Self { signer, db }
    }

    /// Extract cookie value from Cookie header
    fn extract_cookie(headers: &header::HeaderMap, name: &str) -> Option<String> {
        headers
            .get(header::COOKIE)?
            .to_str()
            .ok()?
            .split(';')
            .map(|s| s.trim())
            .find(|s| s.starts_with(&format!("{}=", name)))?
            .strip_prefix(&format!("{}=", name))
            .map(|s| s.to_string())
    }
}

fn secure_flag(secure: bool) -> &'static str {
    if secure { "; Secure" } else { "" }
}

/// `Set-Cookie` value establishing a session for `user_id`.
pub fn session_cookie(signer: &SessionSigner, user_id: &DbUlid, secure: bool) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        SESSION_COOKIE,
        signer.sign(&user_id.to_string()),
        SESSION_MAX_AGE_SECS,
        secure_flag(secure)
    )
}

/// `Set-Cookie` value that clears the session cookie.
pub fn clear_session_cookie(secure: bool) -> String {
    format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0{}",
        SESSION_COOKIE,
        secure_flag(secure)
    )
}

#[async_trait]
impl AuthProvider for SessionAuthProvider {
    #[instrument(skip(self, parts), fields(scheme = "session"))]
    async fn authenticate(&self, parts: &Parts) -> Result<Caller, AuthError> {
        let signed_cookie = Self::extract_cookie(&parts.headers, SESSION_COOKIE)
            .filter(|value| !value.is_empty())
            .ok_or(AuthError::MissingCredentials)?;

        let user_id = self
            .signer
            .verify(&signed_cookie)
            .and_then(|id| DbUlid::from_string(&id))
            .ok_or(AuthError::InvalidCredentials)?;

        debug!(%user_id, "Session signature valid, loading user...");

        let user = UserStore::get_user(&*self.db, &user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        UserStore::touch_last_seen(&*self.db, &user.id, Utc::now()).await?;

        debug!(nickname = %user.nickname, "User authenticated successfully");

        Ok(user.to_caller())
    }

    fn scheme(&self) -> &'static str {
        "session"
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;
    use murmur_db::{accounts, storage::MemoryStorage};

    use super::*;

    fn parts_with_cookie(cookie: &str) -> Parts {
        Request::builder()
            .header(header::COOKIE, cookie)
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[test]
    fn test_extract_cookie_basic() {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "foo=bar; murmur_session=abc123; other=value"
                .parse()
                .unwrap(),
        );

        let result = SessionAuthProvider::extract_cookie(&headers, "murmur_session");
        assert_eq!(result, Some("abc123".to_string()));

        let result = SessionAuthProvider::extract_cookie(&headers, "foo");
        assert_eq!(result, Some("bar".to_string()));
    }

    #[test]
    fn test_extract_cookie_not_found() {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::COOKIE, "foo=bar".parse().unwrap());

        assert_eq!(
            SessionAuthProvider::extract_cookie(&headers, "nonexistent"),
            None
        );
        assert_eq!(
            SessionAuthProvider::extract_cookie(&header::HeaderMap::new(), "anything"),
            None
        );
    }

    #[test]
    fn test_extract_cookie_similar_names() {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "session=old; murmur_session=new".parse().unwrap(),
        );

        let result = SessionAuthProvider::extract_cookie(&headers, "session");
        assert_eq!(result, Some("old".to_string()));

        let result = SessionAuthProvider::extract_cookie(&headers, "murmur_session");
        assert_eq!(result, Some("new".to_string()));
    }

    #[test]
    fn test_session_cookie_format() {
        let signer = SessionSigner::new([7u8; 32]);
        let id = DbUlid::new();

        let cookie = session_cookie(&signer, &id, false);
        assert!(cookie.starts_with(&format!("murmur_session={}.", id)));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=2592000"));
        assert!(!cookie.contains("Secure"));

        assert!(session_cookie(&signer, &id, true).ends_with("; Secure"));
    }

    #[test]
    fn test_logout_cookie_format() {
        let cookie = clear_session_cookie(false);
        assert!(cookie.starts_with("murmur_session=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(!cookie.contains("Secure"));
        assert!(clear_session_cookie(true).contains("Secure"));
    }

    #[tokio::test]
    async fn test_authenticates_signed_session_and_touches_last_seen() {
        let db = Arc::new(MemoryStorage::new());
        let before = Utc::now() - chrono::Duration::hours(1);
        let john = accounts::create_user(&*db, "john", "j@x.com", before)
            .await
            .unwrap();

        let signer = Arc::new(SessionSigner::new([3u8; 32]));
        let provider = SessionAuthProvider::new(Arc::clone(&signer), db.clone());

        let cookie = format!("{}={}", SESSION_COOKIE, signer.sign(&john.id.to_string()));
        let caller = provider
            .authenticate(&parts_with_cookie(&cookie))
            .await
            .unwrap();

        assert_eq!(caller, john.to_caller());
        let seen = db.get_user(&john.id).await.unwrap().unwrap().last_seen;
        assert!(seen > before);
    }

    #[tokio::test]
    async fn test_rejects_foreign_signature() {
        let db = Arc::new(MemoryStorage::new());
        let john = accounts::create_user(&*db, "john", "j@x.com", Utc::now())
            .await
            .unwrap();

        let provider = SessionAuthProvider::new(Arc::new(SessionSigner::new([3u8; 32])), db);
        let forged = SessionSigner::new([4u8; 32]).sign(&john.id.to_string());

        let result = provider
            .authenticate(&parts_with_cookie(&format!("murmur_session={forged}")))
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_unknown_user_is_invalid() {
        let signer = Arc::new(SessionSigner::new([3u8; 32]));
        let provider =
            SessionAuthProvider::new(Arc::clone(&signer), Arc::new(MemoryStorage::new()));

        let cookie = format!("murmur_session={}", signer.sign(&DbUlid::new().to_string()));
        let result = provider.authenticate(&parts_with_cookie(&cookie)).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_missing_or_empty_cookie_is_missing_credentials() {
        let provider = SessionAuthProvider::new(
            Arc::new(SessionSigner::new([3u8; 32])),
            Arc::new(MemoryStorage::new()),
        );

        let result = provider
            .authenticate(&parts_with_cookie("other=value"))
            .await;
        assert!(matches!(result, Err(AuthError::MissingCredentials)));

        let result = provider
            .authenticate(&parts_with_cookie("murmur_session="))
            .await;
        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }
}
