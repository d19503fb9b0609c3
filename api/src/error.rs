use axum::{Json, http::StatusCode, response::IntoResponse};
use murmur_common::{caller::CallerError, params::ValidationError, views::ApiErrorResponse};
use murmur_db::storage::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found")]
    NotFound,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Well-formed input the operation refuses, e.g. unfollowing yourself.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    CallerError(#[from] CallerError),

    #[error(transparent)]
    InternalAnyhow(#[from] anyhow::Error),
}

impl ApiError {
    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest(reason.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Storage(se) => match se {
                StoreError::NotFound => StatusCode::NOT_FOUND,
                StoreError::Conflict { .. } => StatusCode::CONFLICT,
                StoreError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
                StoreError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::CallerError(CallerError::Unauthorized { .. }) => StatusCode::UNAUTHORIZED,
            Self::InternalAnyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "NotFound",
            Self::Validation(_) | Self::InvalidRequest(_) => "BadRequest",
            Self::Storage(se) => match se {
                StoreError::NotFound => "NotFound",
                StoreError::Conflict { .. } => "Conflict",
                StoreError::Transient(_) => "Unavailable",
                StoreError::Query(_) => "InternalError",
            },
            Self::CallerError(_) => "Unauthorized",
            Self::InternalAnyhow(_) => "InternalError",
        }
    }

    fn message(&self) -> String {
        match self {
            Self::NotFound | Self::Storage(StoreError::NotFound) => {
                "The requested resource was not found.".into()
            }
            // Validation messages name the offending field and are safe to show.
            Self::Validation(ve) => ve.to_string(),
            Self::InvalidRequest(reason) => reason.clone(),
            Self::Storage(StoreError::Conflict { field }) => {
                format!("That {} is already in use. Please choose another one.", field)
            }
            Self::Storage(StoreError::Transient(_)) => {
                "The service is temporarily unavailable. Please try again.".into()
            }
            Self::CallerError(_) => "You are not authenticated to perform this action.".into(),
            Self::Storage(StoreError::Query(_)) | Self::InternalAnyhow(_) => {
                "Something went wrong on our end. Please try again later.".into()
            }
        }
    }
}

impl From<ApiError> for ApiErrorResponse {
    fn from(err: ApiError) -> Self {
        ApiErrorResponse {
            code: Some(err.code().into()),
            message: err.message(),

            #[cfg(debug_assertions)]
            details: Some(err.to_string()),

            #[cfg(not(debug_assertions))]
            details: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            tracing::error!("Error returned by handler: {self}");
        } else {
            tracing::debug!("Request rejected: {self}");
        }

        (status_code, Json(Into::<ApiErrorResponse>::into(self))).into_response()
    }
}
