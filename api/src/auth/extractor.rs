use std::future::Future;
use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use murmur_common::caller::{Caller, CallerError};

use crate::{context::ApiContext, error::ApiError};

/// Extractor that REQUIRES authentication.
///
/// Returns 401 Unauthorized if authentication fails. Handlers take the acting
/// user from here and pass it on explicitly.
///
/// # Examples
///
/// ```rust,ignore
/// use murmur_api::auth::extractor::Auth;
///
/// pub async fn follow_user(
///     State(ctx): State<ApiContext>,
///     Auth(caller): Auth,  // ← extracts authenticated caller
///     Path(nickname): Path<String>,
/// ) -> Result<Json<FollowResponse>, ApiError> {
///     let follower = acting_user_id(&caller)?;
///     // ... follow
/// }
/// ```
pub struct Auth(pub Caller);

impl FromRequestParts<ApiContext> for Auth {
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &ApiContext,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let auth_manager = Arc::clone(&state.auth_manager);
        async move {
            let caller = auth_manager.authenticate(parts).await.map_err(|e| match e {
                super::AuthError::Storage(se) if se.is_transient() => ApiError::Storage(se),
                e => ApiError::CallerError(CallerError::unauthorized(Some(e.to_string()))),
            })?;
            Ok(Auth(caller))
        }
    }
}
