use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::{apply_security_headers, create_cors_layer, Config};
use crate::gateway::PaymentGateway;
use crate::handlers;
use crate::notify::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub notifier: Arc<dyn Notifier>,
}

pub fn create_routes(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/events", get(handlers::events::list_events))
        .route("/events/:slug", get(handlers::events::event_detail))
        .route(
            "/events/:slug/bookings",
            post(handlers::bookings::create_booking),
        )
        .route(
            "/events/:slug/reviews",
            post(handlers::reviews::submit_review),
        )
        .route("/bookings", get(handlers::bookings::booking_history))
        .route("/bookings/:id", get(handlers::bookings::booking_detail))
        .route(
            "/bookings/:id/cancel",
            post(handlers::bookings::cancel_booking),
        )
        .route("/bookings/:id/checkout", post(handlers::payments::checkout))
        .route("/payments/callback", post(handlers::payments::callback))
        .route("/dashboard", get(handlers::dashboard::dashboard))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer()),
        )
        .with_state(state);

    apply_security_headers(router)
}
