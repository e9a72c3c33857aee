use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;
use uuid::Uuid;

use crate::identity::CurrentUser;
use crate::routes::AppState;
use crate::services::payments::{self, CallbackOutcome, CheckoutOutcome};
use crate::utils::error::AppError;
use crate::utils::response::success;

pub async fn checkout(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    let outcome = payments::checkout(
        &state.pool,
        &state.config,
        &state.gateway,
        state.notifier.clone(),
        booking_id,
        &user,
    )
    .await?;

    Ok(match outcome {
        CheckoutOutcome::Confirmed(booking) => {
            success(booking, "Booking confirmed! (Demo mode - gateway not configured)")
                .into_response()
        }
        CheckoutOutcome::PendingGateway(params) => {
            success(params, "Order created, proceed to payment").into_response()
        }
    })
}

/// Unauthenticated provider callback. Razorpay posts its identifiers as form
/// fields; missing fields still resolve to a recorded outcome whenever the
/// order can be matched to a payment.
#[derive(Deserialize)]
pub struct CallbackForm {
    #[serde(default)]
    pub razorpay_order_id: String,
    #[serde(default)]
    pub razorpay_payment_id: String,
    #[serde(default)]
    pub razorpay_signature: String,
}

pub async fn callback(
    State(state): State<AppState>,
    Form(form): Form<CallbackForm>,
) -> Result<Response, AppError> {
    let outcome = payments::process_callback(
        &state.pool,
        &state.gateway,
        state.notifier.clone(),
        &form.razorpay_order_id,
        &form.razorpay_payment_id,
        &form.razorpay_signature,
    )
    .await?;

    let destination = match outcome {
        CallbackOutcome::Success(booking_id) => state.config.payment_success_url(booking_id),
        CallbackOutcome::Failure(booking_id) => state.config.payment_failure_url(booking_id),
        CallbackOutcome::Unmatched => state.config.home_url(),
    };

    Ok(Redirect::to(&destination).into_response())
}
