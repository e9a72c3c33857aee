use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Config;

pub mod demo;
pub mod razorpay;

pub use demo::DemoGateway;
pub use razorpay::RazorpayGateway;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway rejected request ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("malformed gateway input: {0}")]
    Malformed(String),
}

/// Order handle returned by the provider; the client redirects to the
/// provider's checkout with this id.
#[derive(Debug, Clone)]
pub struct GatewayOrder {
    pub order_id: String,
    pub amount_minor: i64,
    pub currency: String,
}

/// Capability surface of the external payment provider. Selected once at
/// startup; handlers only ever see the trait object.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a provider-side order for `amount_minor` (minor currency
    /// units). `receipt` is our booking id, echoed back for reconciliation.
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError>;

    /// Check the provider's callback signature. Invalid signatures are
    /// `Ok(false)`; only malformed input is an error.
    fn verify_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<bool, GatewayError>;
}

/// Picks the real adapter when credentials are configured, the demo stand-in
/// otherwise.
pub fn select_gateway(config: &Config) -> Arc<dyn PaymentGateway> {
    if config.payments_demo_mode() {
        tracing::warn!("Payments: no gateway credentials configured, running in demo mode");
        Arc::new(DemoGateway)
    } else {
        tracing::info!("Payments: Razorpay gateway configured");
        Arc::new(RazorpayGateway::new(
            config.razorpay_key_id.clone(),
            config.razorpay_key_secret.clone(),
        ))
    }
}
