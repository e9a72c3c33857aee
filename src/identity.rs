use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::models::User;
use crate::routes::AppState;
use crate::utils::error::AppError;

const IDENTITY_HEADER: &str = "x-user-id";

/// The authenticated caller. Session management lives in an upstream
/// identity provider which injects the user id as a trusted header; this
/// extractor resolves it to an account row.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::AuthError("Please log in to access this page".to_string()))?;

        let user_id: Uuid = header
            .parse()
            .map_err(|_| AppError::AuthError("Invalid identity header".to_string()))?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&state.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Unknown user".to_string()))?;

        Ok(CurrentUser(user))
    }
}

impl CurrentUser {
    /// Staff gate for the dashboard routes.
    pub fn require_staff(self) -> Result<User, AppError> {
        if self.0.is_staff {
            Ok(self.0)
        } else {
            Err(AppError::Forbidden(
                "You do not have permission to access this page".to_string(),
            ))
        }
    }
}
