use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub category_id: Option<Uuid>,
    pub location: String,
    pub starts_at: DateTime<Utc>,
    pub price: Decimal,
    pub capacity: i32,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event_starting_at(starts_at: DateTime<Utc>) -> Event {
        Event {
            id: Uuid::new_v4(),
            title: "Jazz Night".to_string(),
            slug: "jazz-night-a1b2c3".to_string(),
            description: String::new(),
            category_id: None,
            location: "Blue Note".to_string(),
            starts_at,
            price: Decimal::new(50000, 2),
            capacity: 10,
            is_active: true,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn future_event_is_not_past() {
        let now = Utc::now();
        let event = event_starting_at(now + Duration::hours(2));
        assert!(!event.is_past(now));
    }

    #[test]
    fn elapsed_event_is_past() {
        let now = Utc::now();
        let event = event_starting_at(now - Duration::minutes(1));
        assert!(event.is_past(now));
    }
}
