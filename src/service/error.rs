use arion_core::ErrorResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::runpod::ProviderError;
use crate::supabase::IdentityError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Upstream(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        ApiError::Upstream(format!("gpu provider: {err}"))
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::AlreadyExists(message) => ApiError::Conflict(message),
            IdentityError::InvalidToken => ApiError::Unauthorized("invalid session".to_string()),
            other => ApiError::Upstream(format!("identity backend: {other}")),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error = match &self {
            ApiError::Internal(err) => {
                tracing::error!("internal error: {:?}", err);
                err.to_string()
            }
            other => {
                tracing::debug!("request failed with {}: {}", status, other);
                other.to_string()
            }
        };

        let body = ErrorResponse { ok: false, error };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Conflict("dup".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_identity_errors_map_to_taxonomy() {
        let conflict: ApiError = IdentityError::AlreadyExists("taken".into()).into();
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);

        let unauthorized: ApiError = IdentityError::InvalidToken.into();
        assert_eq!(unauthorized.status_code(), StatusCode::UNAUTHORIZED);

        let upstream: ApiError = IdentityError::Api {
            status: 500,
            message: "down".into(),
        }
        .into();
        assert_eq!(upstream.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_provider_errors_are_upstream() {
        let err: ApiError = ProviderError::GraphQl("pod not found".into()).into();

        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(err.to_string().contains("pod not found"));
    }
}
