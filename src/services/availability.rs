use sqlx::postgres::PgExecutor;
use uuid::Uuid;

/// Guests already holding capacity on an event. Cancelled bookings release
/// their slots, so only pending and confirmed rows count.
pub async fn booked_guests(
    executor: impl PgExecutor<'_>,
    event_id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(guests), 0)::BIGINT
         FROM bookings
         WHERE event_id = $1 AND status IN ('pending', 'confirmed')",
    )
    .bind(event_id)
    .fetch_one(executor)
    .await
}

/// Remaining capacity. Run on the same connection as a `FOR UPDATE` lock on
/// the event row when the result feeds a booking insert; on its own it is a
/// point-in-time read for display.
pub async fn available_slots(
    executor: impl PgExecutor<'_>,
    event_id: Uuid,
    capacity: i32,
) -> Result<i64, sqlx::Error> {
    let booked = booked_guests(executor, event_id).await?;
    Ok(slots_remaining(capacity, booked))
}

pub fn slots_remaining(capacity: i32, booked: i64) -> i64 {
    i64::from(capacity) - booked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_is_capacity_minus_booked() {
        assert_eq!(slots_remaining(10, 8), 2);
        assert_eq!(slots_remaining(10, 0), 10);
        assert_eq!(slots_remaining(10, 10), 0);
    }

    #[test]
    fn oversold_history_reports_negative_remainder() {
        // Capacity edits below current bookings surface as negative, which
        // the guard treats the same as zero.
        assert_eq!(slots_remaining(5, 8), -3);
    }
}
