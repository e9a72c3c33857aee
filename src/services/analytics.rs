use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::utils::error::AppError;

const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MonthlyRevenue {
    pub month: DateTime<Utc>,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct RecentBooking {
    pub id: uuid::Uuid,
    pub user_name: String,
    pub event_title: String,
    pub guests: i32,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct DashboardTotals {
    pub total_users: i64,
    pub total_bookings: i64,
    pub total_revenue: Decimal,
    pub recent_bookings: Vec<RecentBooking>,
}

/// Successful-payment revenue per calendar month, chronological, truncated
/// to the most recent `last_n`.
pub async fn revenue_by_month(pool: &PgPool, last_n: usize) -> Result<Vec<MonthlyRevenue>, AppError> {
    let rows = sqlx::query_as::<_, MonthlyRevenue>(
        "SELECT date_trunc('month', created_at) AS month, SUM(amount) AS total
         FROM payments
         WHERE status = 'success'
         GROUP BY month
         ORDER BY month",
    )
    .fetch_all(pool)
    .await?;
    Ok(last_n_months(rows, last_n))
}

pub fn last_n_months(rows: Vec<MonthlyRevenue>, last_n: usize) -> Vec<MonthlyRevenue> {
    let skip = rows.len().saturating_sub(last_n);
    rows.into_iter().skip(skip).collect()
}

/// Events per category, unassigned events bucketed as "Uncategorized",
/// busiest category first.
pub async fn event_count_by_category(pool: &PgPool) -> Result<Vec<CategoryCount>, AppError> {
    let rows = sqlx::query_as::<_, (Option<String>, i64)>(
        "SELECT c.name, COUNT(e.id)::BIGINT AS count
         FROM events e
         LEFT JOIN categories c ON c.id = e.category_id
         GROUP BY c.name
         ORDER BY count DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(name, count)| CategoryCount {
            category: bucket_category(name),
            count,
        })
        .collect())
}

pub fn bucket_category(name: Option<String>) -> String {
    name.unwrap_or_else(|| UNCATEGORIZED.to_string())
}

pub async fn dashboard_totals(pool: &PgPool) -> Result<DashboardTotals, AppError> {
    let total_users = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    let total_bookings = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings")
        .fetch_one(pool)
        .await?;
    let total_revenue = sqlx::query_scalar::<_, Decimal>(
        "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE status = 'success'",
    )
    .fetch_one(pool)
    .await?;
    let recent_bookings = sqlx::query_as::<_, RecentBooking>(
        "SELECT b.id, u.name AS user_name, e.title AS event_title,
                b.guests, b.total_amount, b.created_at
         FROM bookings b
         JOIN users u ON u.id = b.user_id
         JOIN events e ON e.id = b.event_id
         ORDER BY b.created_at DESC
         LIMIT 10",
    )
    .fetch_all(pool)
    .await?;

    Ok(DashboardTotals {
        total_users,
        total_bookings,
        total_revenue,
        recent_bookings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn month(year: i32, month: u32) -> MonthlyRevenue {
        MonthlyRevenue {
            month: Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).unwrap(),
            total: Decimal::new(100, 0),
        }
    }

    #[test]
    fn keeps_the_most_recent_months() {
        let rows = vec![month(2025, 1), month(2025, 2), month(2025, 3)];
        let kept = last_n_months(rows, 2);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].month.to_rfc3339(), "2025-02-01T00:00:00+00:00");
        assert_eq!(kept[1].month.to_rfc3339(), "2025-03-01T00:00:00+00:00");
    }

    #[test]
    fn short_history_is_returned_whole() {
        let rows = vec![month(2025, 1)];
        assert_eq!(last_n_months(rows, 6).len(), 1);
    }

    #[test]
    fn unassigned_events_bucket_as_uncategorized() {
        assert_eq!(bucket_category(None), "Uncategorized");
        assert_eq!(bucket_category(Some("Music".into())), "Music");
    }
}
