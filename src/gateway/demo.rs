use async_trait::async_trait;

use super::{GatewayError, GatewayOrder, PaymentGateway};

/// Stand-in used when no gateway credentials are configured. Checkout never
/// actually calls it in demo mode (bookings auto-confirm), but the trait
/// object still needs a coherent implementation.
pub struct DemoGateway;

#[async_trait]
impl PaymentGateway for DemoGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        Ok(GatewayOrder {
            order_id: format!("demo_order_{receipt}"),
            amount_minor,
            currency: currency.to_string(),
        })
    }

    fn verify_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        _signature: &str,
    ) -> Result<bool, GatewayError> {
        if order_id.is_empty() || payment_id.is_empty() {
            return Err(GatewayError::Malformed(
                "callback missing order or payment id".to_string(),
            ));
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_orders_never_leave_the_process() {
        let order = DemoGateway.create_order(5000, "INR", "b42").await.unwrap();
        assert_eq!(order.order_id, "demo_order_b42");
        assert_eq!(order.amount_minor, 5000);
    }
}
