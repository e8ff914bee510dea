//! JSON API for pricing classifier output.
//!
//! - `POST /api/v1/appraisals`: price a `(label, confidence, condition)` triple
//! - `POST /api/v1/adjustments`: apply condition and confidence adjustments to a base price
//! - `GET  /supported-formats`: image formats accepted upstream of the classifier

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use gavel_core::valuation::adjuster::base_price_from_value;
use gavel_core::valuation::appraisal::{validate_confidence, DEFAULT_CONDITION};
use gavel_core::valuation::{adjust, Appraisal, AppraisalRequest, AppraisalService};
use gavel_core::{DomainError, ValuationBreakdown};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

const SUPPORTED_FORMATS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];
const MAX_FILE_SIZE: &str = "10MB";

#[derive(Clone)]
pub struct AppraisalState {
    service: Arc<AppraisalService>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustmentRequest {
    #[serde(default)]
    pub base_price: Value,
    pub confidence: f64,
    #[serde(default = "default_condition")]
    pub condition: String,
}

fn default_condition() -> String {
    DEFAULT_CONDITION.to_string()
}

#[derive(Debug, Serialize)]
pub struct SupportedFormats {
    pub supported_formats: [&'static str; 4],
    pub max_file_size: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: &'static str,
    pub detail: String,
    pub correlation_id: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

pub fn router(service: Arc<AppraisalService>) -> Router {
    Router::new()
        .route("/api/v1/appraisals", post(create_appraisal))
        .route("/api/v1/adjustments", post(create_adjustment))
        .route("/supported-formats", get(supported_formats))
        .with_state(AppraisalState { service })
}

async fn create_appraisal(
    State(state): State<AppraisalState>,
    payload: Result<Json<AppraisalRequest>, JsonRejection>,
) -> ApiResult<Appraisal> {
    let correlation_id = Uuid::new_v4().to_string();
    let Json(request) = payload.map_err(|rejection| malformed(rejection, &correlation_id))?;

    match state.service.appraise(&request) {
        Ok(appraisal) => {
            info!(
                event_name = "api.appraisal.created",
                correlation_id = %correlation_id,
                name = %appraisal.name,
                final_price = appraisal.breakdown.final_price,
                "appraisal created"
            );
            Ok(Json(appraisal))
        }
        Err(error) => Err(reject(error, correlation_id)),
    }
}

async fn create_adjustment(
    State(state): State<AppraisalState>,
    payload: Result<Json<AdjustmentRequest>, JsonRejection>,
) -> ApiResult<ValuationBreakdown> {
    let correlation_id = Uuid::new_v4().to_string();
    let Json(request) = payload.map_err(|rejection| malformed(rejection, &correlation_id))?;

    if let Err(error) = validate_confidence(request.confidence) {
        return Err(reject(error, correlation_id));
    }

    let base_price = match base_price_from_value(&request.base_price) {
        Some(base_price) => base_price,
        None => {
            let sentinel = state.service.sentinel_base_price();
            warn!(
                event_name = "api.adjustment.sentinel_base_price",
                correlation_id = %correlation_id,
                raw_base_price = %request.base_price,
                sentinel,
                "base price was not numeric, using sentinel"
            );
            sentinel
        }
    };

    Ok(Json(adjust(base_price, &request.condition, request.confidence)))
}

async fn supported_formats() -> Json<SupportedFormats> {
    Json(SupportedFormats { supported_formats: SUPPORTED_FORMATS, max_file_size: MAX_FILE_SIZE })
}

fn malformed(rejection: JsonRejection, correlation_id: &str) -> (StatusCode, Json<ApiError>) {
    reject(DomainError::MalformedRequest(rejection.body_text()), correlation_id.to_string())
}

fn reject(error: DomainError, correlation_id: String) -> (StatusCode, Json<ApiError>) {
    let interface = error.into_interface(correlation_id);
    let status = StatusCode::BAD_REQUEST;

    warn!(
        event_name = "api.request.rejected",
        correlation_id = %interface.correlation_id(),
        status = status.as_u16(),
        error = %interface,
        "request rejected"
    );

    (
        status,
        Json(ApiError {
            error: interface.user_message(),
            detail: interface.message().to_string(),
            correlation_id: interface.correlation_id().to_string(),
        }),
    )
}
