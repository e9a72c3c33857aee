use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::identity::CurrentUser;
use crate::routes::AppState;
use crate::services::bookings;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub guests: i32,
    pub booking_date: NaiveDate,
}

pub async fn create_booking(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateBookingRequest>,
) -> Result<Response, AppError> {
    let booking =
        bookings::create_booking(&state.pool, &slug, &user, body.guests, body.booking_date)
            .await?;
    Ok(created(booking, "Booking created! Please proceed to payment").into_response())
}

pub async fn booking_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    let bookings = bookings::booking_history(&state.pool, &user).await?;
    Ok(success(bookings, "Bookings retrieved").into_response())
}

pub async fn booking_detail(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    let booking = bookings::get_owned_booking(&state.pool, booking_id, &user).await?;
    Ok(success(booking, "Booking retrieved").into_response())
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    let booking = bookings::cancel_booking(&state.pool, booking_id, &user).await?;
    Ok(success(booking, "Booking cancelled successfully").into_response())
}
