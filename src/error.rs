use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::{
    auth::{jwt::TokenError, password::PasswordError},
    users::repo::{StoreError, UniqueField},
};

/// Outcome of a failed auth or profile operation.
///
/// Validation and uniqueness failures are expected results; everything else
/// is `Internal` and keeps its cause for the logs only.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("email is required")]
    InvalidEmail,
    #[error("handle must be 3-30 characters of lowercase letters, digits, '-' or '_', starting with a letter or digit")]
    InvalidHandle,
    #[error("email already taken")]
    EmailTaken,
    #[error("handle already taken")]
    HandleTaken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("not found")]
    NotFound,
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::InvalidEmail => StatusCode::BAD_REQUEST,
            ServiceError::InvalidHandle => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::EmailTaken | ServiceError::HandleTaken => StatusCode::CONFLICT,
            ServiceError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn internal<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        ServiceError::Internal(err.into())
    }
}

impl From<UniqueField> for ServiceError {
    fn from(field: UniqueField) -> Self {
        match field {
            UniqueField::Email => ServiceError::EmailTaken,
            UniqueField::Handle => ServiceError::HandleTaken,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(field) => field.into(),
            StoreError::NotFound => ServiceError::NotFound,
            StoreError::Other(e) => ServiceError::Internal(e),
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(e: PasswordError) -> Self {
        ServiceError::internal(e)
    }
}

impl From<TokenError> for ServiceError {
    fn from(e: TokenError) -> Self {
        ServiceError::internal(e)
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ServiceError::Internal(cause) = &self {
            error!(error = ?cause, "internal error");
        }
        (status, self.to_string()).into_response()
    }
}

/// Error returned by HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized,
    Service(ServiceError),
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        ApiError::Service(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Not authenticated".to_string()).into_response()
            }
            ApiError::Service(e) => e.into_response(),
        }
    }
}
