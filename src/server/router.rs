use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::repository::repository_routes;
use crate::provisioner::GitProvisioner;

pub struct AppState {
    pub provisioner: Arc<dyn GitProvisioner>,
}

impl AppState {
    pub fn new(provisioner: Arc<dyn GitProvisioner>) -> Self {
        Self { provisioner }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        %method,
        path = uri.path(),
        status = status.as_u16(),
        latency_ms = latency.as_millis() as u64,
        "Handled request"
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/repository", repository_routes())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
