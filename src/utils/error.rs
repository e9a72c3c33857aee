use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::gateway::GatewayError;
use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("This event has already passed")]
    EventPast,

    #[error("This event is no longer active")]
    EventInactive,

    #[error("Only {available} slots available")]
    CapacityExceeded { available: i64 },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("You can only review events you have attended")]
    NotEligible,

    #[error("You have already reviewed this event")]
    DuplicateReview,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Payment gateway error")]
    Gateway(#[from] GatewayError),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::EventPast | AppError::EventInactive | AppError::ValidationError(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::CapacityExceeded { .. }
            | AppError::InvalidState(_)
            | AppError::DuplicateReview => StatusCode::CONFLICT,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::NotEligible => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::EventPast => "EVENT_PAST",
            AppError::EventInactive => "EVENT_INACTIVE",
            AppError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            AppError::InvalidState(_) => "INVALID_STATE",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::NotEligible => "NOT_ELIGIBLE",
            AppError::DuplicateReview => "DUPLICATE_REVIEW",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::Gateway(_) => "GATEWAY_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
        }
    }

    /// Maps a unique-constraint violation onto a domain error; everything
    /// else stays a database error. The reviews table relies on this as the
    /// authoritative duplicate guard.
    pub fn from_unique_violation(err: sqlx::Error, duplicate: AppError) -> AppError {
        match err.as_database_error() {
            Some(db) if db.is_unique_violation() => duplicate,
            _ => AppError::DatabaseError(err),
        }
    }

    fn log(&self) {
        match self {
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
            AppError::Gateway(e) => {
                error!(error = ?e, "Payment gateway error");
            }
            other => {
                error!(error = ?other, code = other.code(), "Request rejected");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log internal details
        self.log();

        // Only expose high-level messages to the client
        let public_message = match &self {
            AppError::DatabaseError(_) => "A database error occurred".to_string(),
            AppError::Gateway(_) => "Payment could not be processed".to_string(),
            other => other.to_string(),
        };

        error_response(code, public_message, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_class_errors_are_client_errors() {
        for err in [
            AppError::EventPast,
            AppError::EventInactive,
            AppError::CapacityExceeded { available: 2 },
            AppError::InvalidState("already confirmed".into()),
            AppError::NotEligible,
            AppError::DuplicateReview,
        ] {
            assert!(err.status_code().is_client_error(), "{:?}", err);
        }
    }

    #[test]
    fn capacity_message_names_the_remaining_slots() {
        let err = AppError::CapacityExceeded { available: 2 };
        assert_eq!(err.to_string(), "Only 2 slots available");
    }

    #[test]
    fn gateway_errors_map_to_bad_gateway() {
        let err = AppError::Gateway(GatewayError::Provider {
            status: 503,
            message: "unavailable".into(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
