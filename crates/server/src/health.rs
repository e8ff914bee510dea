use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use gavel_core::valuation::AppraisalService;
use serde::Serialize;

const SERVICE_NAME: &str = "gavel-server";

#[derive(Clone)]
pub struct HealthState {
    service: Arc<AppraisalService>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub strategy: &'static str,
    pub catalog: HealthCheck,
    pub checked_at: String,
}

pub fn router(service: Arc<AppraisalService>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .with_state(HealthState { service })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let catalog = catalog_check(&state.service);
    let ready = catalog.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        strategy: state.service.estimator().strategy().as_str(),
        catalog,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn catalog_check(service: &AppraisalService) -> HealthCheck {
    let labels = service.estimator().catalog().label_count();
    if labels == 0 {
        HealthCheck {
            status: "degraded",
            detail: "catalog has no label mappings; every item prices as `other`".to_string(),
        }
    } else {
        HealthCheck { status: "ready", detail: format!("{labels} label mappings loaded") }
    }
}
