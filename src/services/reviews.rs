use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Review, ReviewWithAuthor, User};
use crate::utils::error::AppError;

/// Advisory eligibility gate: a confirmed booking and no prior review. The
/// UNIQUE (user_id, event_id) constraint remains the authoritative guard
/// against concurrent duplicates.
pub async fn can_review(pool: &PgPool, user_id: Uuid, event_id: Uuid) -> Result<bool, AppError> {
    let has_booking = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (
            SELECT 1 FROM bookings
            WHERE user_id = $1 AND event_id = $2 AND status = 'confirmed'
         )",
    )
    .bind(user_id)
    .bind(event_id)
    .fetch_one(pool)
    .await?;

    if !has_booking {
        return Ok(false);
    }

    let has_reviewed = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM reviews WHERE user_id = $1 AND event_id = $2)",
    )
    .bind(user_id)
    .bind(event_id)
    .fetch_one(pool)
    .await?;

    Ok(!has_reviewed)
}

pub async fn submit_review(
    pool: &PgPool,
    user: &User,
    event_id: Uuid,
    rating: i32,
    comment: &str,
) -> Result<Review, AppError> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::ValidationError(
            "Rating must be between 1 and 5".to_string(),
        ));
    }

    if !can_review(pool, user.id, event_id).await? {
        return Err(AppError::NotEligible);
    }

    // A concurrent submission can still slip past the gate; the unique
    // constraint reports it and the user sees the same rejection either way.
    let review = sqlx::query_as::<_, Review>(
        "INSERT INTO reviews (user_id, event_id, rating, comment)
         VALUES ($1, $2, $3, $4)
         RETURNING *",
    )
    .bind(user.id)
    .bind(event_id)
    .bind(rating)
    .bind(comment)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::from_unique_violation(e, AppError::DuplicateReview))?;

    tracing::info!(review_id = %review.id, %event_id, rating, "Review submitted");

    Ok(review)
}

pub async fn reviews_for_event(
    pool: &PgPool,
    event_id: Uuid,
) -> Result<Vec<ReviewWithAuthor>, AppError> {
    let reviews = sqlx::query_as::<_, ReviewWithAuthor>(
        "SELECT r.id, r.rating, r.comment, u.name AS author, r.created_at
         FROM reviews r
         JOIN users u ON u.id = r.user_id
         WHERE r.event_id = $1
         ORDER BY r.created_at DESC",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await?;
    Ok(reviews)
}

/// Average rating rounded to one decimal place, 0 when unreviewed.
pub async fn average_rating(pool: &PgPool, event_id: Uuid) -> Result<f64, AppError> {
    let avg = sqlx::query_scalar::<_, Option<f64>>(
        "SELECT AVG(rating)::FLOAT8 FROM reviews WHERE event_id = $1",
    )
    .bind(event_id)
    .fetch_one(pool)
    .await?;
    Ok(round_rating(avg))
}

pub fn round_rating(avg: Option<f64>) -> f64 {
    avg.map(|a| (a * 10.0).round() / 10.0).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreviewed_event_averages_zero() {
        assert_eq!(round_rating(None), 0.0);
    }

    #[test]
    fn average_rounds_to_one_decimal() {
        assert_eq!(round_rating(Some(4.3333)), 4.3);
        assert_eq!(round_rating(Some(4.25)), 4.3);
        assert_eq!(round_rating(Some(5.0)), 5.0);
    }
}
