pub mod adjuster;
pub mod appraisal;
pub mod catalog;
pub mod estimator;
pub mod resolver;

pub use adjuster::{adjust, ValuationBreakdown};
pub use appraisal::{
    Appraisal, AppraisalRequest, AppraisalService, Classification, Classifier, ClassifierError,
    PredictionResult,
};
pub use catalog::{Catalog, CatalogError, PriceRange, Tier, TierName};
pub use estimator::{Estimate, PriceEstimator, PricingBranch, PricingStrategy};
pub use resolver::{normalize_label, resolve, Resolution};
