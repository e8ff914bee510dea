pub mod config;
pub mod errors;
pub mod valuation;

pub use errors::{DomainError, InterfaceError};
pub use valuation::{
    adjust, Appraisal, AppraisalRequest, AppraisalService, Catalog, Classification, Classifier,
    ClassifierError, Estimate, PriceEstimator, PriceRange, PricingBranch, PricingStrategy,
    ValuationBreakdown,
};
