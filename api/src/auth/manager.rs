use axum::http::request::Parts;
use murmur_common::caller::Caller;
use tracing::{debug, instrument, trace};

use super::{error::AuthError, provider::AuthProvider};

/// Coordinates authentication providers in priority order.
///
/// Each registered provider is asked in turn. A provider that finds no
/// credentials of its kind returns `MissingCredentials` and the next one is
/// tried; any other error ends the search.
///
/// # Examples
///
/// ```rust,ignore
/// let auth_manager = AuthManager::new()
///     .with_provider(SessionAuthProvider::new(signer, db.clone()));
///
/// let caller = auth_manager.authenticate(&request_parts).await?;
/// ```
pub struct AuthManager {
    providers: Vec<Box<dyn AuthProvider>>,
}

impl AuthManager {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    pub fn with_provider<P: AuthProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Try each provider in order until one succeeds
    #[instrument(skip(self, parts))]
    pub async fn authenticate(&self, parts: &Parts) -> Result<Caller, AuthError> {
        for provider in &self.providers {
            trace!(scheme = provider.scheme(), "Trying auth provider");

            match provider.authenticate(parts).await {
                Ok(caller) => {
                    debug!(scheme = provider.scheme(), "Auth succeeded");
                    return Ok(caller);
                }
                Err(AuthError::MissingCredentials) => {
                    trace!(scheme = provider.scheme(), "No credentials for this scheme");
                    continue;
                }
                Err(e) => {
                    debug!(scheme = provider.scheme(), error = %e, "Auth failed");
                    return Err(e);
                }
            }
        }

        Err(AuthError::MissingCredentials)
    }
}

impl Default for AuthManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::http::Request;

    use super::*;

    struct Fixed(fn() -> Result<Caller, AuthError>);

    #[async_trait]
    impl AuthProvider for Fixed {
        async fn authenticate(&self, _parts: &Parts) -> Result<Caller, AuthError> {
            (self.0)()
        }

        fn scheme(&self) -> &'static str {
            "fixed"
        }
    }

    fn parts() -> Parts {
        Request::builder().body(()).unwrap().into_parts().0
    }

    fn john() -> Result<Caller, AuthError> {
        Ok(Caller::new("01HZX3K6T8W7Q2M5N4P9R0S1V2", "john"))
    }

    #[tokio::test]
    async fn no_providers_means_missing_credentials() {
        let result = AuthManager::new().authenticate(&parts()).await;
        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }

    #[tokio::test]
    async fn skips_providers_without_credentials() {
        let manager = AuthManager::new()
            .with_provider(Fixed(|| Err(AuthError::MissingCredentials)))
            .with_provider(Fixed(john));

        let caller = manager.authenticate(&parts()).await.unwrap();
        assert_eq!(caller.nickname(), "john");
    }

    #[tokio::test]
    async fn stops_at_invalid_credentials() {
        let manager = AuthManager::new()
            .with_provider(Fixed(|| Err(AuthError::InvalidCredentials)))
            .with_provider(Fixed(john));

        let result = manager.authenticate(&parts()).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }
}
