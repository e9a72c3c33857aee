use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::identity::CurrentUser;
use crate::models::{Event, ReviewWithAuthor};
use crate::routes::AppState;
use crate::services::{availability, events, reviews};
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Serialize)]
struct EventDetail {
    #[serde(flatten)]
    event: Event,
    available_slots: i64,
    average_rating: f64,
    review_count: usize,
    reviews: Vec<ReviewWithAuthor>,
    can_review: bool,
}

pub async fn list_events(State(state): State<AppState>) -> Result<Response, AppError> {
    let events = events::list_active(&state.pool).await?;
    Ok(success(events, "Events retrieved").into_response())
}

pub async fn event_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    user: Option<CurrentUser>,
) -> Result<Response, AppError> {
    let event = events::get_by_slug(&state.pool, &slug).await?;

    let available_slots =
        availability::available_slots(&state.pool, event.id, event.capacity).await?;
    let event_reviews = reviews::reviews_for_event(&state.pool, event.id).await?;
    let average_rating = reviews::average_rating(&state.pool, event.id).await?;

    let can_review = match &user {
        Some(CurrentUser(u)) => reviews::can_review(&state.pool, u.id, event.id).await?,
        None => false,
    };

    let detail = EventDetail {
        available_slots,
        average_rating,
        review_count: event_reviews.len(),
        reviews: event_reviews,
        can_review,
        event,
    };

    Ok(success(detail, "Event retrieved").into_response())
}
