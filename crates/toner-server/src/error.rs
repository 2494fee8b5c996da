use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use toner_core::CoreError;

/// Errors returned by API handlers.
#[derive(Debug)]
pub enum ApiError {
    Core(CoreError),
    MissingUser,
    BadRequest(String),
    RateLimited(Duration),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(CoreError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Core(CoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Core(CoreError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Core(CoreError::Configuration(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Core(CoreError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::MissingUser => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Core(e) => e.kind(),
            ApiError::MissingUser => "unauthorized",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::RateLimited(_) => "rate_limited",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Core(e) => e.to_string(),
            ApiError::MissingUser => "X-User-Id header is required".to_string(),
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::RateLimited(wait) => format!("Rate limited. Try again in {:?}", wait),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        ApiError::Core(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Core(CoreError::Storage(e)) = &self {
            tracing::error!(error = %e, "storage failure");
        }

        let body = ErrorBody {
            error: self.kind(),
            message: self.message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toner_core::{
        ConfigurationError, ConflictError, ConsumableId, NotFoundError, StorageError,
        ValidationError,
    };

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                CoreError::from(ValidationError::PrinterRequired),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                CoreError::from(NotFoundError::Consumable(ConsumableId::new())),
                StatusCode::NOT_FOUND,
            ),
            (
                CoreError::from(ConflictError {
                    consumable: ConsumableId::new(),
                    expected: 1,
                    found: 2,
                }),
                StatusCode::CONFLICT,
            ),
            (
                CoreError::from(ConfigurationError::NoServiceCenter),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                CoreError::Storage(StorageError::Database("disk".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
        assert_eq!(ApiError::MissingUser.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_duplicate_serial_is_validation() {
        let err = ApiError::from(CoreError::from(StorageError::DuplicateSerial(
            "CRT-1".to_string(),
        )));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.kind(), "validation");
    }
}
