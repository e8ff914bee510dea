//! Request-level orchestration: classifier output in, quoted price out.

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::adjuster::{adjust, confidence_percent, ValuationBreakdown};
use super::catalog::PriceRange;
use super::estimator::{Estimate, PriceEstimator, PricingBranch, OTHER_CATEGORY};
use super::resolver::normalize_label;
use crate::errors::DomainError;

pub const UNKNOWN_ITEM_NAME: &str = "Unknown Item";
pub const DEFAULT_CONDITION: &str = "New";

/// Top-1 output of an image classifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub confidence: f64,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("classifier model is not available: {0}")]
    Unavailable(String),
    #[error("classification failed: {0}")]
    Failed(String),
}

impl ClassifierError {
    fn user_description(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "Unable to analyze image - model not available",
            Self::Failed(_) => "Error analyzing image - please try again",
        }
    }
}

/// Image classification capability. Model weights and decoding live behind
/// this boundary.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, image: &[u8]) -> Result<Classification, ClassifierError>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppraisalRequest {
    pub label: String,
    pub confidence: f64,
    #[serde(default = "default_condition")]
    pub condition: String,
}

impl AppraisalRequest {
    pub fn new(label: impl Into<String>, confidence: f64, condition: impl Into<String>) -> Self {
        Self { label: label.into(), confidence, condition: condition.into() }
    }
}

fn default_condition() -> String {
    DEFAULT_CONDITION.to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub name: String,
    pub base_price: u64,
    pub description: String,
    pub confidence: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Appraisal {
    pub name: String,
    pub description: String,
    pub category: String,
    pub confidence: f64,
    pub price_range: PriceRange,
    /// `None` when the classifier failed and the sentinel price was quoted.
    pub pricing_branch: Option<PricingBranch>,
    pub formatted_price: String,
    pub breakdown: ValuationBreakdown,
}

#[derive(Clone, Debug)]
pub struct AppraisalService {
    estimator: PriceEstimator,
    sentinel_base_price: u64,
}

impl AppraisalService {
    pub fn new(estimator: PriceEstimator, sentinel_base_price: u64) -> Self {
        Self { estimator, sentinel_base_price }
    }

    pub fn estimator(&self) -> &PriceEstimator {
        &self.estimator
    }

    pub fn sentinel_base_price(&self) -> u64 {
        self.sentinel_base_price
    }

    pub fn predict<R: Rng + ?Sized>(
        &self,
        raw_label: &str,
        confidence: f64,
        rng: &mut R,
    ) -> Result<(PredictionResult, Estimate), DomainError> {
        validate_confidence(confidence)?;
        let label = normalize_label(raw_label);
        if label.is_empty() {
            return Err(DomainError::EmptyLabel);
        }

        let estimate = self.estimator.estimate_with_rng(&label, confidence, rng);
        let prediction = PredictionResult {
            name: display_name(&label),
            base_price: estimate.price,
            description: describe(&label, confidence),
            confidence,
        };

        Ok((prediction, estimate))
    }

    pub fn appraise(&self, request: &AppraisalRequest) -> Result<Appraisal, DomainError> {
        self.appraise_with_rng(request, &mut rand::thread_rng())
    }

    pub fn appraise_with_rng<R: Rng + ?Sized>(
        &self,
        request: &AppraisalRequest,
        rng: &mut R,
    ) -> Result<Appraisal, DomainError> {
        let (prediction, estimate) = self.predict(&request.label, request.confidence, rng)?;
        let breakdown = adjust(prediction.base_price, &request.condition, prediction.confidence);

        info!(
            event_name = "valuation.appraisal.completed",
            name = %prediction.name,
            category = %estimate.category,
            condition = %request.condition,
            base_price = breakdown.base_price,
            final_price = breakdown.final_price,
            "item appraised"
        );

        Ok(Appraisal {
            name: prediction.name,
            description: prediction.description,
            category: estimate.category,
            confidence: confidence_percent(prediction.confidence),
            price_range: estimate.price_range,
            pricing_branch: Some(estimate.branch),
            formatted_price: format_price(breakdown.final_price),
            breakdown,
        })
    }

    /// Classifies `image` and appraises the result. Classifier failures and
    /// out-of-range classifier output degrade to the sentinel quote instead of
    /// failing the request.
    pub async fn appraise_image<C: Classifier + ?Sized>(
        &self,
        classifier: &C,
        image: &[u8],
        condition: &str,
    ) -> Appraisal {
        let classification = classifier.classify(image).await;

        let error = match classification {
            Ok(classification) => {
                let request =
                    AppraisalRequest::new(classification.label, classification.confidence, condition);
                match self.appraise(&request) {
                    Ok(appraisal) => return appraisal,
                    Err(error) => ClassifierError::Failed(error.to_string()),
                }
            }
            Err(error) => error,
        };

        warn!(
            event_name = "valuation.classifier.failed",
            error = %error,
            sentinel_base_price = self.sentinel_base_price,
            "classifier output unusable, quoting sentinel price"
        );
        self.sentinel_appraisal(condition, error.user_description())
    }

    fn sentinel_appraisal(&self, condition: &str, description: &str) -> Appraisal {
        let breakdown = adjust(self.sentinel_base_price, condition, 0.0);
        Appraisal {
            name: UNKNOWN_ITEM_NAME.to_string(),
            description: description.to_string(),
            category: OTHER_CATEGORY.to_string(),
            confidence: 0.0,
            price_range: self.estimator.catalog().fallback_range(),
            pricing_branch: None,
            formatted_price: format_price(breakdown.final_price),
            breakdown,
        }
    }
}

/// Rejects NaN, infinite and out-of-range confidence before it reaches the
/// engine.
pub fn validate_confidence(confidence: f64) -> Result<(), DomainError> {
    if confidence.is_finite() && (0.0..=1.0).contains(&confidence) {
        Ok(())
    } else {
        Err(DomainError::InvalidConfidence(confidence))
    }
}

/// `sports_car` becomes `Sports Car`.
pub fn display_name(label: &str) -> String {
    let mut name = String::with_capacity(label.len());
    let mut word_start = true;
    for ch in label.replace('_', " ").chars() {
        if ch.is_alphabetic() {
            if word_start {
                name.extend(ch.to_uppercase());
            } else {
                name.extend(ch.to_lowercase());
            }
            word_start = false;
        } else {
            name.push(ch);
            word_start = true;
        }
    }
    name
}

pub fn describe(label: &str, confidence: f64) -> String {
    let percent = (confidence * 10_000.0).round() / 100.0;
    format!("Seems like a {}. Confidence: {}%", label.replace('_', " "), format_percent(percent))
}

fn format_percent(percent: f64) -> String {
    if percent.fract() == 0.0 {
        format!("{percent:.1}")
    } else {
        percent.to_string()
    }
}

/// Formats an integer price with thousands separators.
pub fn format_price(price: u64) -> String {
    let digits = price.to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(ch);
    }
    formatted
}
