use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_SENTINEL_BASE_PRICE: u64 = 1_000;

const CONDITIONS: &[(&str, f64)] = &[("New", 0.0), ("Used", 0.25), ("Heavily Used", 0.5)];

const LOW_CONFIDENCE_PENALTY: f64 = -0.10;
const HIGH_CONFIDENCE_PREMIUM: f64 = 0.05;
const PENALTY_BELOW: f64 = 0.6;
const PREMIUM_ABOVE: f64 = 0.9;

/// Itemized derivation of a quoted price from its base estimate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValuationBreakdown {
    pub base_price: u64,
    pub condition: String,
    pub condition_adjustment: String,
    pub price_after_condition: u64,
    /// Classifier confidence as a percentage, one decimal.
    pub confidence: f64,
    pub confidence_adjustment: String,
    pub final_price: u64,
}

/// Fraction of the base price removed for a declared condition. Unknown
/// conditions are treated like `New`.
pub fn condition_discount(condition: &str) -> f64 {
    CONDITIONS
        .iter()
        .find(|(name, _)| *name == condition)
        .map(|(_, fraction)| *fraction)
        .unwrap_or(0.0)
}

pub fn confidence_adjustment(confidence: f64) -> f64 {
    if confidence < PENALTY_BELOW {
        LOW_CONFIDENCE_PENALTY
    } else if confidence > PREMIUM_ABOVE {
        HIGH_CONFIDENCE_PREMIUM
    } else {
        0.0
    }
}

pub fn adjust(base_price: u64, condition: &str, confidence: f64) -> ValuationBreakdown {
    let condition_fraction = condition_discount(condition);
    let price_after_condition = floor_price(base_price as f64 * (1.0 - condition_fraction));

    let confidence_fraction = confidence_adjustment(confidence);
    let final_price = floor_price(price_after_condition as f64 * (1.0 + confidence_fraction));

    ValuationBreakdown {
        base_price,
        condition: condition.to_string(),
        condition_adjustment: format_adjustment(-condition_fraction),
        price_after_condition,
        confidence: confidence_percent(confidence),
        confidence_adjustment: format_adjustment(confidence_fraction),
        final_price,
    }
}

/// Renders a signed fraction as a whole percentage: `-25%`, `+5%`, `0%`.
pub fn format_adjustment(fraction: f64) -> String {
    let percent = (fraction * 100.0).round() as i64;
    match percent {
        0 => "0%".to_string(),
        p if p > 0 => format!("+{p}%"),
        p => format!("{p}%"),
    }
}

pub fn confidence_percent(confidence: f64) -> f64 {
    (confidence * 1_000.0).round() / 10.0
}

/// Coerces an upstream base price into an integer, falling back to
/// `sentinel` when the value is not a usable number.
pub fn coerce_base_price(raw: &Value, sentinel: u64) -> u64 {
    base_price_from_value(raw).unwrap_or(sentinel)
}

pub fn parse_base_price(raw: &str, sentinel: u64) -> u64 {
    base_price_from_str(raw).unwrap_or(sentinel)
}

/// Non-negative integer reading of a JSON price, or `None` when the sentinel
/// should be used.
pub fn base_price_from_value(raw: &Value) -> Option<u64> {
    match raw {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|v| v.is_finite() && *v >= 0.0).map(floor_price)),
        Value::String(text) => base_price_from_str(text),
        _ => None,
    }
}

pub fn base_price_from_str(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    trimmed.parse::<u64>().ok().or_else(|| {
        trimmed.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0).map(floor_price)
    })
}

fn floor_price(value: f64) -> u64 {
    value.floor() as u64
}
