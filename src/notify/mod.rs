use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification channel error: {0}")]
    Channel(String),
}

/// A message for the outbound channel (email/SMS service); the channel
/// itself is an external collaborator.
#[derive(Debug, Clone)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn booking_confirmed(
        recipient_name: &str,
        recipient_email: &str,
        event_title: &str,
        booking_date: chrono::NaiveDate,
        guests: i32,
        total_amount: rust_decimal::Decimal,
    ) -> Self {
        Self {
            recipient: recipient_email.to_string(),
            subject: format!("Booking Confirmed - {event_title}"),
            body: format!(
                "Hi {recipient_name},\n\n\
                 Your booking for '{event_title}' has been confirmed!\n\n\
                 Booking Details:\n\
                 - Event: {event_title}\n\
                 - Date: {booking_date}\n\
                 - Guests: {guests}\n\
                 - Total Amount: Rs.{total_amount}\n\n\
                 Thank you for using EventManager!"
            ),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Default channel: structured log lines. Deployments with a real email/SMS
/// service swap in their own `Notifier`.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            recipient = %notification.recipient,
            subject = %notification.subject,
            "Notification sent"
        );
        Ok(())
    }
}

/// Fire-and-forget dispatch, called only after the owning transaction has
/// committed. Send failures are logged, never propagated, so a flaky channel
/// cannot reverse a confirmed booking.
pub fn dispatch(notifier: Arc<dyn Notifier>, notification: Notification) {
    tokio::spawn(async move {
        if let Err(e) = notifier.send(&notification).await {
            tracing::warn!(error = %e, recipient = %notification.recipient, "Notification failed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_body_carries_the_booking_details() {
        let n = Notification::booking_confirmed(
            "Priya",
            "priya@example.com",
            "Jazz Night",
            chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            2,
            rust_decimal::Decimal::new(100000, 2),
        );
        assert_eq!(n.recipient, "priya@example.com");
        assert_eq!(n.subject, "Booking Confirmed - Jazz Night");
        assert!(n.body.contains("Guests: 2"));
        assert!(n.body.contains("Rs.1000.00"));
        assert!(n.body.contains("2025-06-01"));
    }

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        let n = Notification {
            recipient: "a@b.c".into(),
            subject: "s".into(),
            body: "b".into(),
        };
        assert!(LogNotifier.send(&n).await.is_ok());
    }
}
