use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::config::Config;
use crate::gateway::{GatewayError, PaymentGateway};
use crate::models::{Booking, BookingStatus, Payment, PaymentStatus, User};
use crate::notify::{self, Notification, Notifier};
use crate::utils::error::AppError;

pub const DEMO_PAYMENT_ID: &str = "demo_payment";

/// Minor-unit conversion for the gateway (rupees to paise).
pub fn amount_minor(amount: Decimal) -> Result<i64, AppError> {
    (amount * Decimal::from(100))
        .trunc()
        .to_i64()
        .ok_or_else(|| AppError::ValidationError(format!("Amount out of range: {amount}")))
}

/// Parameters the client needs to hand off to the provider's checkout.
#[derive(Debug, Serialize)]
pub struct OrderParams {
    pub booking_id: Uuid,
    pub order_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub key_id: String,
}

#[derive(Debug)]
pub enum CheckoutOutcome {
    /// Demo mode settled the booking synchronously.
    Confirmed(Booking),
    /// Live mode: redirect the client to the provider.
    PendingGateway(Box<OrderParams>),
}

#[derive(Debug, PartialEq, Eq)]
pub enum CallbackOutcome {
    Success(Uuid),
    Failure(Uuid),
    /// No payment matches the callback; nothing to record.
    Unmatched,
}

/// What to do with a callback, given the payment's current status and the
/// verification result. Factored out of the handler so the idempotency and
/// degradation rules are unit-testable.
#[derive(Debug, PartialEq, Eq)]
pub enum CallbackDecision {
    AlreadySettled,
    Confirm,
    Fail,
}

pub fn decide_callback(
    current: PaymentStatus,
    verification: Result<bool, GatewayError>,
) -> CallbackDecision {
    if current == PaymentStatus::Success {
        return CallbackDecision::AlreadySettled;
    }
    match verification {
        Ok(true) => CallbackDecision::Confirm,
        // Invalid signature, malformed callback and gateway trouble all
        // degrade to a recorded failure, never to a crashed request.
        Ok(false) | Err(_) => CallbackDecision::Fail,
    }
}

/// Starts (or retries) payment for a pending booking. One payment row per
/// booking: retries reuse it instead of inserting a duplicate.
pub async fn checkout(
    pool: &PgPool,
    config: &Config,
    gateway: &Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
    booking_id: Uuid,
    user: &User,
) -> Result<CheckoutOutcome, AppError> {
    let mut tx = pool.begin().await?;

    let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1 FOR UPDATE")
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking '{booking_id}' was not found")))?;

    if booking.user_id != user.id {
        return Err(AppError::Forbidden(
            "You can only pay for your own bookings".to_string(),
        ));
    }
    if booking.status != BookingStatus::Pending {
        return Err(AppError::InvalidState(
            "This booking cannot be paid for".to_string(),
        ));
    }

    let payment = sqlx::query_as::<_, Payment>(
        "INSERT INTO payments (booking_id, amount) VALUES ($1, $2)
         ON CONFLICT (booking_id) DO UPDATE SET updated_at = now()
         RETURNING *",
    )
    .bind(booking.id)
    .bind(booking.total_amount)
    .fetch_one(&mut *tx)
    .await?;

    if config.payments_demo_mode() {
        // No provider round-trip: settle payment and booking in this same
        // transaction, notify after commit.
        sqlx::query(
            "UPDATE payments
             SET status = 'success', gateway_payment_id = $2, updated_at = now()
             WHERE id = $1",
        )
        .bind(payment.id)
        .bind(DEMO_PAYMENT_ID)
        .execute(&mut *tx)
        .await?;

        let booking = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'confirmed', updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(booking.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(booking_id = %booking.id, "Booking confirmed (demo mode)");
        send_confirmation(pool, notifier, booking.id).await;

        return Ok(CheckoutOutcome::Confirmed(booking));
    }

    // Live mode: release the row lock before the network call.
    tx.commit().await?;

    let minor = amount_minor(booking.total_amount)?;
    let order = gateway
        .create_order(minor, &config.currency, &booking.id.to_string())
        .await?;

    sqlx::query(
        "UPDATE payments SET gateway_order_id = $2, updated_at = now() WHERE id = $1",
    )
    .bind(payment.id)
    .bind(&order.order_id)
    .execute(pool)
    .await?;

    tracing::info!(
        booking_id = %booking.id,
        order_id = %order.order_id,
        "Gateway order created"
    );

    Ok(CheckoutOutcome::PendingGateway(Box::new(OrderParams {
        booking_id: booking.id,
        order_id: order.order_id,
        amount_minor: minor,
        currency: order.currency,
        key_id: config.razorpay_key_id.clone(),
    })))
}

/// Reconciles a gateway callback with our records. Idempotent: replaying a
/// settled callback is a no-op; any matchable callback resolves to a
/// recorded outcome. Only AppError::DatabaseError escapes; gateway trouble
/// is folded into the failure outcome.
pub async fn process_callback(
    pool: &PgPool,
    gateway: &Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> Result<CallbackOutcome, AppError> {
    if order_id.is_empty() {
        tracing::warn!("Payment callback without an order id, nothing to reconcile");
        return Ok(CallbackOutcome::Unmatched);
    }

    let payment =
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE gateway_order_id = $1")
            .bind(order_id)
            .fetch_optional(pool)
            .await?;

    let Some(payment) = payment else {
        tracing::warn!(order_id, "Payment callback for unknown order");
        return Ok(CallbackOutcome::Unmatched);
    };

    let verification = gateway.verify_signature(order_id, payment_id, signature);

    match decide_callback(payment.status, verification) {
        CallbackDecision::AlreadySettled => {
            tracing::info!(order_id, "Callback replay for settled payment, no-op");
            Ok(CallbackOutcome::Success(payment.booking_id))
        }
        CallbackDecision::Confirm => match confirm(pool, &payment, payment_id, signature).await? {
            ConfirmResult::Settled => {
                send_confirmation(pool, notifier, payment.booking_id).await;
                Ok(CallbackOutcome::Success(payment.booking_id))
            }
            ConfirmResult::AlreadySettled => {
                tracing::info!(order_id, "Concurrent callback already settled this payment");
                Ok(CallbackOutcome::Success(payment.booking_id))
            }
            ConfirmResult::BookingClosed => Ok(CallbackOutcome::Failure(payment.booking_id)),
        },
        CallbackDecision::Fail => {
            // The status guard keeps a stale read from downgrading a payment
            // a concurrent callback settled after we loaded it.
            let updated = sqlx::query(
                "UPDATE payments SET status = 'failed', updated_at = now()
                 WHERE id = $1 AND status <> 'success'",
            )
            .bind(payment.id)
            .execute(pool)
            .await?;

            if updated.rows_affected() == 0 {
                tracing::info!(order_id, "Payment settled concurrently, failure ignored");
                return Ok(CallbackOutcome::Success(payment.booking_id));
            }
            tracing::warn!(order_id, "Payment verification failed");
            Ok(CallbackOutcome::Failure(payment.booking_id))
        }
    }
}

/// How the locked re-read inside `confirm` resolves, given what the rows
/// look like once the transaction holds them. The callback handler decides
/// from a snapshot that may be stale by the time the lock is taken.
#[derive(Debug, PartialEq, Eq)]
enum ConfirmResult {
    /// Payment and booking were settled by this transaction.
    Settled,
    /// A concurrent callback settled this payment first; nothing to write.
    AlreadySettled,
    /// The booking reached a terminal non-confirmed state (owner cancelled
    /// mid-flight); the payment is recorded failed.
    BookingClosed,
}

fn resolve_confirm(payment: PaymentStatus, booking: BookingStatus) -> ConfirmResult {
    if payment == PaymentStatus::Success || booking == BookingStatus::Confirmed {
        return ConfirmResult::AlreadySettled;
    }
    if booking.can_transition_to(BookingStatus::Confirmed) {
        ConfirmResult::Settled
    } else {
        ConfirmResult::BookingClosed
    }
}

/// The composite success transition: payment and booking settle in one
/// transaction, so a crash cannot leave a success payment on a pending
/// booking. Both rows are re-read under lock (booking first, the same order
/// the checkout path locks in) because the caller's snapshot may be stale:
/// a concurrent callback may have settled the payment, or the owner may
/// have cancelled the booking mid-flight.
async fn confirm(
    pool: &PgPool,
    payment: &Payment,
    gateway_payment_id: &str,
    gateway_signature: &str,
) -> Result<ConfirmResult, AppError> {
    let mut tx = pool.begin().await?;

    let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1 FOR UPDATE")
        .bind(payment.booking_id)
        .fetch_one(&mut *tx)
        .await?;

    let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1 FOR UPDATE")
        .bind(payment.id)
        .fetch_one(&mut *tx)
        .await?;

    match resolve_confirm(payment.status, booking.status) {
        ConfirmResult::AlreadySettled => Ok(ConfirmResult::AlreadySettled),
        ConfirmResult::BookingClosed => {
            sqlx::query("UPDATE payments SET status = 'failed', updated_at = now() WHERE id = $1")
                .bind(payment.id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            tracing::warn!(
                booking_id = %payment.booking_id,
                status = ?booking.status,
                "Verified payment for a booking no longer pending, recorded as failed"
            );
            Ok(ConfirmResult::BookingClosed)
        }
        ConfirmResult::Settled => {
            sqlx::query(
                "UPDATE payments
                 SET status = 'success', gateway_payment_id = $2, gateway_signature = $3,
                     updated_at = now()
                 WHERE id = $1",
            )
            .bind(payment.id)
            .bind(gateway_payment_id)
            .bind(gateway_signature)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "UPDATE bookings SET status = 'confirmed', updated_at = now() WHERE id = $1",
            )
            .bind(payment.booking_id)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;

            tracing::info!(booking_id = %payment.booking_id, "Payment reconciled, booking confirmed");
            Ok(ConfirmResult::Settled)
        }
    }
}

#[derive(Debug, FromRow)]
struct ConfirmationDetails {
    name: String,
    email: String,
    title: String,
    booking_date: NaiveDate,
    guests: i32,
    total_amount: Decimal,
}

/// Best-effort confirmation message, fired only after the state transaction
/// has committed. A lookup failure here is logged, not surfaced.
async fn send_confirmation(pool: &PgPool, notifier: Arc<dyn Notifier>, booking_id: Uuid) {
    let details = sqlx::query_as::<_, ConfirmationDetails>(
        "SELECT u.name, u.email, e.title, b.booking_date, b.guests, b.total_amount
         FROM bookings b
         JOIN users u ON u.id = b.user_id
         JOIN events e ON e.id = b.event_id
         WHERE b.id = $1",
    )
    .bind(booking_id)
    .fetch_one(pool)
    .await;

    match details {
        Ok(d) => notify::dispatch(
            notifier,
            Notification::booking_confirmed(
                &d.name,
                &d.email,
                &d.title,
                d.booking_date,
                d.guests,
                d.total_amount,
            ),
        ),
        Err(e) => {
            tracing::warn!(error = %e, %booking_id, "Could not load confirmation details");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verified_callback_confirms() {
        assert_eq!(
            decide_callback(PaymentStatus::Pending, Ok(true)),
            CallbackDecision::Confirm
        );
    }

    #[test]
    fn invalid_signature_records_failure() {
        assert_eq!(
            decide_callback(PaymentStatus::Pending, Ok(false)),
            CallbackDecision::Fail
        );
    }

    #[test]
    fn gateway_error_degrades_to_failure() {
        let err = GatewayError::Malformed("missing payment id".into());
        assert_eq!(
            decide_callback(PaymentStatus::Pending, Err(err)),
            CallbackDecision::Fail
        );
    }

    #[test]
    fn settled_payment_replay_is_a_no_op() {
        // Even an invalid replay must not un-confirm a settled payment.
        assert_eq!(
            decide_callback(PaymentStatus::Success, Ok(false)),
            CallbackDecision::AlreadySettled
        );
        assert_eq!(
            decide_callback(PaymentStatus::Success, Ok(true)),
            CallbackDecision::AlreadySettled
        );
    }

    #[test]
    fn failed_payment_may_still_confirm_on_retry() {
        assert_eq!(
            decide_callback(PaymentStatus::Failed, Ok(true)),
            CallbackDecision::Confirm
        );
    }

    #[test]
    fn stale_confirm_after_concurrent_settle_is_a_no_op() {
        // Two callbacks both read the payment as pending; the loser must
        // see the settled pair under lock and write nothing, not fail it.
        assert_eq!(
            resolve_confirm(PaymentStatus::Success, BookingStatus::Confirmed),
            ConfirmResult::AlreadySettled
        );
        assert_eq!(
            resolve_confirm(PaymentStatus::Pending, BookingStatus::Confirmed),
            ConfirmResult::AlreadySettled
        );
    }

    #[test]
    fn fresh_pending_pair_settles() {
        assert_eq!(
            resolve_confirm(PaymentStatus::Pending, BookingStatus::Pending),
            ConfirmResult::Settled
        );
        assert_eq!(
            resolve_confirm(PaymentStatus::Failed, BookingStatus::Pending),
            ConfirmResult::Settled
        );
    }

    #[test]
    fn cancelled_booking_closes_the_payment() {
        assert_eq!(
            resolve_confirm(PaymentStatus::Pending, BookingStatus::Cancelled),
            ConfirmResult::BookingClosed
        );
    }

    #[test]
    fn rupees_convert_to_paise() {
        assert_eq!(amount_minor(Decimal::new(100000, 2)).unwrap(), 100000);
        assert_eq!(amount_minor(Decimal::new(4999, 2)).unwrap(), 4999);
        assert_eq!(amount_minor(Decimal::ZERO).unwrap(), 0);
    }
}
