use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::identity::CurrentUser;
use crate::routes::AppState;
use crate::services::{events, reviews};
use crate::utils::error::AppError;
use crate::utils::response::created;

#[derive(Deserialize)]
pub struct SubmitReviewRequest {
    pub rating: i32,
    pub comment: String,
}

pub async fn submit_review(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<SubmitReviewRequest>,
) -> Result<Response, AppError> {
    let event = events::get_by_slug(&state.pool, &slug).await?;
    let review =
        reviews::submit_review(&state.pool, &user, event.id, body.rating, &body.comment).await?;
    Ok(created(review, "Review submitted successfully").into_response())
}
