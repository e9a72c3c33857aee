use sqlx::PgPool;

use crate::models::Event;
use crate::utils::error::AppError;

pub async fn list_active(pool: &PgPool) -> Result<Vec<Event>, AppError> {
    let events = sqlx::query_as::<_, Event>(
        "SELECT * FROM events WHERE is_active = TRUE ORDER BY starts_at",
    )
    .fetch_all(pool)
    .await?;
    Ok(events)
}

pub async fn get_by_slug(pool: &PgPool, slug: &str) -> Result<Event, AppError> {
    sqlx::query_as::<_, Event>("SELECT * FROM events WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event '{slug}' was not found")))
}
