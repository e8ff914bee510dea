use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::catalog::{Catalog, PriceRange, TierName};
use super::resolver::resolve;

pub const LOW_CONFIDENCE_CEILING: f64 = 0.5;
pub const HIGH_CONFIDENCE_FLOOR: f64 = 0.8;
pub const LUXURY_BOOST_THRESHOLD: f64 = 0.9;
pub const LUXURY_BOOST: f64 = 1.1;
pub const LINEAR_BOOST: f64 = 1.2;

pub const MISC_CATEGORY: &str = "misc";
pub const UNCERTAIN_CATEGORY: &str = "uncertain";
pub const OTHER_CATEGORY: &str = "other";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingStrategy {
    /// Confidence buckets with tier multipliers, luxury boost and clamping.
    #[default]
    Bucketed,
    /// Interpolates across the category range by confidence. Kept for parity
    /// with the older pricing path.
    Linear,
}

impl PricingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bucketed => "bucketed",
            Self::Linear => "linear",
        }
    }
}

impl fmt::Display for PricingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PricingStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bucketed" => Ok(Self::Bucketed),
            "linear" => Ok(Self::Linear),
            other => Err(format!("unsupported pricing strategy `{other}` (expected bucketed|linear)")),
        }
    }
}

/// Which rule produced a price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingBranch {
    Blacklisted,
    LowConfidence,
    MediumConfidence,
    HighConfidence,
    Linear,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estimate {
    pub price: u64,
    pub category: String,
    pub price_range: PriceRange,
    pub branch: PricingBranch,
}

#[derive(Clone, Debug)]
pub struct PriceEstimator {
    catalog: Arc<Catalog>,
    strategy: PricingStrategy,
}

impl PriceEstimator {
    pub fn new(catalog: Arc<Catalog>, strategy: PricingStrategy) -> Self {
        Self { catalog, strategy }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn strategy(&self) -> PricingStrategy {
        self.strategy
    }

    pub fn estimate(&self, label: &str, confidence: f64) -> Estimate {
        self.estimate_with_rng(label, confidence, &mut rand::thread_rng())
    }

    pub fn estimate_with_rng<R: Rng + ?Sized>(
        &self,
        label: &str,
        confidence: f64,
        rng: &mut R,
    ) -> Estimate {
        let estimate = match self.strategy {
            PricingStrategy::Bucketed => estimate_bucketed(&self.catalog, label, confidence, rng),
            PricingStrategy::Linear => estimate_linear(&self.catalog, label, confidence),
        };

        debug!(
            event_name = "valuation.estimate.completed",
            label,
            confidence,
            strategy = %self.strategy,
            category = %estimate.category,
            branch = ?estimate.branch,
            price = estimate.price,
            "price estimated"
        );

        estimate
    }
}

/// Confidence-bucketed pricing.
///
/// Blacklisted labels and confidence below 0.5 draw uniformly from their own
/// fallback bands and are never clamped. Medium (`[0.5, 0.8)`) and high
/// (`>= 0.8`) confidence scale the resolved range by the tier multiplier and
/// clamp back into it.
pub fn estimate_bucketed<R: Rng + ?Sized>(
    catalog: &Catalog,
    label: &str,
    confidence: f64,
    rng: &mut R,
) -> Estimate {
    if catalog.is_blacklisted(label) {
        let range = catalog.blacklist_range();
        return Estimate {
            price: draw(range, rng),
            category: MISC_CATEGORY.to_string(),
            price_range: range,
            branch: PricingBranch::Blacklisted,
        };
    }

    let resolution = resolve(catalog, label);

    if confidence < LOW_CONFIDENCE_CEILING {
        let range = catalog.fallback_range();
        return Estimate {
            price: draw(range, rng),
            category: UNCERTAIN_CATEGORY.to_string(),
            price_range: range,
            branch: PricingBranch::LowConfidence,
        };
    }

    let range = resolution.price_range;
    let multiplier = resolution.tier.multiplier;
    let (raw, branch) = if confidence < HIGH_CONFIDENCE_FLOOR {
        (floor_price(range.midpoint() * multiplier), PricingBranch::MediumConfidence)
    } else {
        let mut price = floor_price(range.max as f64 * multiplier);
        if resolution.tier.name == TierName::Luxury && confidence > LUXURY_BOOST_THRESHOLD {
            price = floor_price(price as f64 * LUXURY_BOOST);
        }
        (price, PricingBranch::HighConfidence)
    };

    Estimate {
        price: range.clamp(raw),
        category: resolution.category_or_other().to_string(),
        price_range: range,
        branch,
    }
}

/// Linear interpolation across the category range, boosted by 1.2 for the
/// catalog's linear boost categories above 0.9 confidence.
pub fn estimate_linear(catalog: &Catalog, label: &str, confidence: f64) -> Estimate {
    let resolved = catalog
        .category_for(label)
        .and_then(|category| catalog.price_range(category).map(|range| (category, range)));

    let Some((category, range)) = resolved else {
        let range = catalog.linear_fallback_range();
        return Estimate {
            price: interpolate(range, confidence),
            category: OTHER_CATEGORY.to_string(),
            price_range: range,
            branch: PricingBranch::Linear,
        };
    };

    let mut price = interpolate(range, confidence);
    if catalog.has_linear_boost(category) && confidence > LUXURY_BOOST_THRESHOLD {
        price = floor_price(price as f64 * LINEAR_BOOST);
    }

    Estimate {
        price,
        category: category.to_string(),
        price_range: range,
        branch: PricingBranch::Linear,
    }
}

fn interpolate(range: PriceRange, confidence: f64) -> u64 {
    floor_price(range.min as f64 + (range.max - range.min) as f64 * confidence)
}

fn draw<R: Rng + ?Sized>(range: PriceRange, rng: &mut R) -> u64 {
    rng.gen_range(range.min..=range.max)
}

// `as` saturates, so negative products from out-of-range input land on zero.
fn floor_price(value: f64) -> u64 {
    value.floor() as u64
}
