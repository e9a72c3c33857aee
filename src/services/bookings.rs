use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Booking, BookingStatus, Event, User};
use crate::services::availability;
use crate::utils::error::AppError;

/// Guards evaluated before any booking is written. Extracted so the rules
/// are testable without a database.
pub fn check_event_open(event: &Event, now: DateTime<Utc>) -> Result<(), AppError> {
    if !event.is_active {
        return Err(AppError::EventInactive);
    }
    if event.is_past(now) {
        return Err(AppError::EventPast);
    }
    Ok(())
}

pub fn check_capacity(available: i64, guests: i32) -> Result<(), AppError> {
    if i64::from(guests) > available {
        return Err(AppError::CapacityExceeded {
            available: available.max(0),
        });
    }
    Ok(())
}

/// Creates a pending booking for `guests` slots. The capacity check and the
/// insert run inside one transaction holding a row lock on the event, so two
/// concurrent requests cannot jointly oversell.
pub async fn create_booking(
    pool: &PgPool,
    event_slug: &str,
    user: &User,
    guests: i32,
    booking_date: NaiveDate,
) -> Result<Booking, AppError> {
    if guests < 1 {
        return Err(AppError::ValidationError(
            "At least one guest is required".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE slug = $1 FOR UPDATE")
        .bind(event_slug)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event '{event_slug}' was not found")))?;

    check_event_open(&event, Utc::now())?;

    let available = availability::available_slots(&mut *tx, event.id, event.capacity).await?;
    check_capacity(available, guests)?;

    let total_amount: Decimal = event.price * Decimal::from(guests);

    let booking = sqlx::query_as::<_, Booking>(
        "INSERT INTO bookings (user_id, event_id, guests, booking_date, total_amount, status)
         VALUES ($1, $2, $3, $4, $5, 'pending')
         RETURNING *",
    )
    .bind(user.id)
    .bind(event.id)
    .bind(guests)
    .bind(booking_date)
    .bind(total_amount)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        booking_id = %booking.id,
        event_id = %event.id,
        guests,
        "Booking created"
    );

    Ok(booking)
}

/// Cancels a pending booking owned by `user`. The row lock serializes
/// against a concurrent payment callback confirming the same booking.
pub async fn cancel_booking(
    pool: &PgPool,
    booking_id: Uuid,
    user: &User,
) -> Result<Booking, AppError> {
    let mut tx = pool.begin().await?;

    let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1 FOR UPDATE")
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking '{booking_id}' was not found")))?;

    if booking.user_id != user.id {
        return Err(AppError::Forbidden(
            "You can only cancel your own bookings".to_string(),
        ));
    }
    if !booking.status.can_transition_to(BookingStatus::Cancelled) {
        return Err(AppError::InvalidState(
            "This booking cannot be cancelled".to_string(),
        ));
    }

    let booking = sqlx::query_as::<_, Booking>(
        "UPDATE bookings SET status = 'cancelled', updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(booking.id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(booking_id = %booking.id, "Booking cancelled");

    Ok(booking)
}

pub async fn booking_history(pool: &PgPool, user: &User) -> Result<Vec<Booking>, AppError> {
    let bookings = sqlx::query_as::<_, Booking>(
        "SELECT * FROM bookings WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.id)
    .fetch_all(pool)
    .await?;
    Ok(bookings)
}

pub async fn get_owned_booking(
    pool: &PgPool,
    booking_id: Uuid,
    user: &User,
) -> Result<Booking, AppError> {
    let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
        .bind(booking_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking '{booking_id}' was not found")))?;

    if booking.user_id != user.id {
        return Err(AppError::Forbidden(
            "You can only view your own bookings".to_string(),
        ));
    }
    Ok(booking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_event(capacity: i32, is_active: bool, starts_in: Duration) -> Event {
        let now = Utc::now();
        Event {
            id: Uuid::new_v4(),
            title: "Jazz Night".to_string(),
            slug: "jazz-night-a1b2c3".to_string(),
            description: String::new(),
            category_id: None,
            location: "Blue Note".to_string(),
            starts_at: now + starts_in,
            price: Decimal::new(50000, 2),
            capacity,
            is_active,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn inactive_event_is_rejected() {
        let event = sample_event(10, false, Duration::days(1));
        assert!(matches!(
            check_event_open(&event, Utc::now()),
            Err(AppError::EventInactive)
        ));
    }

    #[test]
    fn past_event_is_rejected() {
        let event = sample_event(10, true, Duration::days(-1));
        assert!(matches!(
            check_event_open(&event, Utc::now()),
            Err(AppError::EventPast)
        ));
    }

    #[test]
    fn open_event_passes_the_guards() {
        let event = sample_event(10, true, Duration::days(1));
        assert!(check_event_open(&event, Utc::now()).is_ok());
    }

    #[test]
    fn three_guests_rejected_when_two_slots_remain() {
        // Capacity 10, 8 already booked.
        let err = check_capacity(2, 3).unwrap_err();
        match err {
            AppError::CapacityExceeded { available } => assert_eq!(available, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn two_guests_fit_into_two_slots() {
        assert!(check_capacity(2, 2).is_ok());
    }

    #[test]
    fn negative_availability_reports_zero_slots() {
        let err = check_capacity(-3, 1).unwrap_err();
        match err {
            AppError::CapacityExceeded { available } => assert_eq!(available, 0),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn total_amount_is_price_times_guests() {
        let event = sample_event(10, true, Duration::days(1));
        let total = event.price * Decimal::from(2);
        assert_eq!(total, Decimal::new(100000, 2));
    }
}
