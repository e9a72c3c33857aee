use std::env;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::apply_security_headers;

/// Placeholder marker used in sample .env files; keys containing it are
/// treated as unconfigured.
const PLACEHOLDER_MARKER: &str = "XXXX";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub razorpay_key_id: String,
    pub razorpay_key_secret: String,
    pub currency: String,
    /// Origin the payment callback redirects back into.
    pub frontend_origin: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/eventmanager".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3001),
            razorpay_key_id: env::var("RAZORPAY_KEY_ID").unwrap_or_default(),
            razorpay_key_secret: env::var("RAZORPAY_KEY_SECRET").unwrap_or_default(),
            currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "INR".to_string()),
            frontend_origin: env::var("FRONTEND_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        }
    }

    /// Demo mode: no real gateway credentials configured. Checkout then
    /// auto-confirms without contacting any external service.
    pub fn payments_demo_mode(&self) -> bool {
        !is_real_credential(&self.razorpay_key_id) || !is_real_credential(&self.razorpay_key_secret)
    }

    pub fn payment_success_url(&self, booking_id: uuid::Uuid) -> String {
        format!(
            "{}/bookings/{}/payment-success",
            self.frontend_origin, booking_id
        )
    }

    pub fn payment_failure_url(&self, booking_id: uuid::Uuid) -> String {
        format!(
            "{}/bookings/{}/payment-failure",
            self.frontend_origin, booking_id
        )
    }

    pub fn home_url(&self) -> String {
        self.frontend_origin.clone()
    }
}

fn is_real_credential(value: &str) -> bool {
    !value.is_empty() && !value.contains(PLACEHOLDER_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_keys(key_id: &str, secret: &str) -> Config {
        Config {
            database_url: String::new(),
            port: 3001,
            razorpay_key_id: key_id.to_string(),
            razorpay_key_secret: secret.to_string(),
            currency: "INR".to_string(),
            frontend_origin: "http://localhost:3000".to_string(),
        }
    }

    #[test]
    fn absent_credentials_mean_demo_mode() {
        assert!(config_with_keys("", "").payments_demo_mode());
    }

    #[test]
    fn placeholder_credentials_mean_demo_mode() {
        let config = config_with_keys("rzp_test_XXXXXXXX", "XXXXsecret");
        assert!(config.payments_demo_mode());
    }

    #[test]
    fn real_credentials_disable_demo_mode() {
        let config = config_with_keys("rzp_live_abc123", "s3cr3t");
        assert!(!config.payments_demo_mode());
    }

    #[test]
    fn one_placeholder_key_is_still_demo_mode() {
        let config = config_with_keys("rzp_live_abc123", "XXXX");
        assert!(config.payments_demo_mode());
    }

    #[test]
    fn redirect_urls_are_keyed_by_booking() {
        let config = config_with_keys("", "");
        let id = uuid::Uuid::new_v4();
        assert_eq!(
            config.payment_success_url(id),
            format!("http://localhost:3000/bookings/{}/payment-success", id)
        );
        assert_eq!(
            config.payment_failure_url(id),
            format!("http://localhost:3000/bookings/{}/payment-failure", id)
        );
    }
}
