use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::resolver::normalize_label;

pub const FALLBACK_RANGE: PriceRange = PriceRange { min: 500, max: 1500 };
pub const BLACKLIST_RANGE: PriceRange = PriceRange { min: 10, max: 200 };
pub const LINEAR_FALLBACK_RANGE: PriceRange = PriceRange { min: 500, max: 5000 };

const PRICE_RANGES: &[(&str, u64, u64)] = &[
    ("car", 5_000, 2_000_000),
    ("phone", 3_000, 150_000),
    ("handbag", 500, 50_000),
    ("laptop", 10_000, 300_000),
    ("furniture", 1_000, 100_000),
    ("watch", 1_000, 1_000_000),
    ("tv", 5_000, 500_000),
    ("camera", 2_000, 500_000),
    ("book", 100, 5_000),
    ("shoe", 200, 20_000),
    ("backpack", 200, 10_000),
    ("microwave", 1_000, 30_000),
    ("refrigerator", 5_000, 200_000),
    ("sofa", 2_000, 100_000),
    ("chair", 500, 20_000),
    ("table", 1_000, 50_000),
    ("bicycle", 1_000, 100_000),
    ("headphones", 500, 50_000),
    ("projector", 2_000, 100_000),
    ("airplane", 100_000, 10_000_000),
];

const LABELS: &[(&str, &str)] = &[
    ("sports_car", "car"),
    ("convertible", "car"),
    ("cab", "car"),
    ("minivan", "car"),
    ("jeep", "car"),
    ("cellular_telephone", "phone"),
    ("laptop", "laptop"),
    ("handbag", "handbag"),
    ("sofa", "furniture"),
    ("armchair", "furniture"),
    ("studio_couch", "furniture"),
    ("digital_watch", "watch"),
    ("tv", "tv"),
    ("camera", "camera"),
    ("book", "book"),
    ("shoe", "shoe"),
    ("backpack", "backpack"),
    ("microwave", "microwave"),
    ("refrigerator", "refrigerator"),
    ("bicycle", "bicycle"),
    ("headphones", "headphones"),
    ("projector", "projector"),
];

const BLACKLIST: &[&str] = &[
    "bottle",
    "plastic_bag",
    "plant",
    "carton",
    "can",
    "envelope",
    "packet",
    "vase",
    "pot",
    "plate",
    "cup",
    "bowl",
    "spoon",
    "fork",
    "knife",
    "toothbrush",
    "toothpaste",
    "soap",
    "towel",
    "bucket",
    "mop",
    "broom",
    "sponge",
    "rag",
    "tissue",
    "napkin",
    "paper_towel",
    "plastic_container",
];

const WHITELIST: &[&str] = &[
    "car",
    "phone",
    "handbag",
    "laptop",
    "furniture",
    "watch",
    "tv",
    "camera",
    "book",
    "shoe",
    "backpack",
    "microwave",
    "refrigerator",
    "sofa",
    "chair",
    "table",
    "bicycle",
    "headphones",
    "projector",
];

const TIERS: &[(&str, TierName, f64)] = &[
    ("car", TierName::Luxury, 1.2),
    ("airplane", TierName::Luxury, 1.5),
    ("phone", TierName::High, 1.1),
    ("laptop", TierName::High, 1.1),
    ("handbag", TierName::Mid, 1.0),
    ("book", TierName::Low, 0.7),
    ("bottle", TierName::Low, 0.5),
    ("plant", TierName::Low, 0.5),
];

const LINEAR_BOOST_CATEGORIES: &[&str] = &["car", "handbag", "watch", "laptop", "tv", "camera"];

/// Inclusive integer price band for a category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: u64,
    pub max: u64,
}

impl PriceRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, price: u64) -> bool {
        (self.min..=self.max).contains(&price)
    }

    pub fn clamp(&self, price: u64) -> u64 {
        price.clamp(self.min, self.max)
    }

    pub fn midpoint(&self) -> f64 {
        (self.min as f64 + self.max as f64) / 2.0
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierName {
    Luxury,
    High,
    Mid,
    Low,
    Other,
}

impl TierName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Luxury => "luxury",
            Self::High => "high",
            Self::Mid => "mid",
            Self::Low => "low",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for TierName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    #[serde(rename = "tier")]
    pub name: TierName,
    pub multiplier: f64,
}

impl Tier {
    pub const DEFAULT: Tier = Tier { name: TierName::Other, multiplier: 1.0 };
}

impl Default for Tier {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("catalog validation failed: {0}")]
    Validation(String),
}

/// Immutable lookup tables driving category resolution and pricing.
///
/// Built once at startup, either from the built-in tables or from a TOML file
/// whose sections replace the matching built-in table.
#[derive(Clone, Debug, PartialEq)]
pub struct Catalog {
    price_ranges: BTreeMap<String, PriceRange>,
    labels: BTreeMap<String, String>,
    tiers: BTreeMap<String, Tier>,
    blacklist: BTreeSet<String>,
    whitelist: BTreeSet<String>,
    fallback_range: PriceRange,
    blacklist_range: PriceRange,
    linear_fallback_range: PriceRange,
    linear_boost_categories: BTreeSet<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    pub fn builtin() -> Self {
        Self {
            price_ranges: PRICE_RANGES
                .iter()
                .map(|(name, min, max)| (name.to_string(), PriceRange::new(*min, *max)))
                .collect(),
            labels: LABELS
                .iter()
                .map(|(label, category)| (label.to_string(), category.to_string()))
                .collect(),
            tiers: TIERS
                .iter()
                .map(|(name, tier, multiplier)| {
                    (name.to_string(), Tier { name: *tier, multiplier: *multiplier })
                })
                .collect(),
            blacklist: BLACKLIST.iter().map(ToString::to_string).collect(),
            whitelist: WHITELIST.iter().map(ToString::to_string).collect(),
            fallback_range: FALLBACK_RANGE,
            blacklist_range: BLACKLIST_RANGE,
            linear_fallback_range: LINEAR_FALLBACK_RANGE,
            linear_boost_categories: LINEAR_BOOST_CATEGORIES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        let patch = toml::from_str::<CatalogPatch>(raw)?;
        let mut catalog = Self::builtin();
        catalog.apply_patch(patch);
        catalog.validate()?;
        Ok(catalog)
    }

    fn apply_patch(&mut self, patch: CatalogPatch) {
        if let Some(price_ranges) = patch.price_ranges {
            self.price_ranges = price_ranges;
        }
        if let Some(labels) = patch.labels {
            self.labels = labels;
        }
        if let Some(tiers) = patch.tiers {
            self.tiers = tiers;
        }
        if let Some(blacklist) = patch.blacklist {
            self.blacklist = blacklist;
        }
        if let Some(whitelist) = patch.whitelist {
            self.whitelist = whitelist;
        }
        if let Some(fallback_range) = patch.fallback_range {
            self.fallback_range = fallback_range;
        }
        if let Some(blacklist_range) = patch.blacklist_range {
            self.blacklist_range = blacklist_range;
        }
        if let Some(linear_fallback_range) = patch.linear_fallback_range {
            self.linear_fallback_range = linear_fallback_range;
        }
        if let Some(linear_boost_categories) = patch.linear_boost_categories {
            self.linear_boost_categories = linear_boost_categories;
        }
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        for (name, range) in self.price_ranges.iter() {
            validate_range(&format!("price_ranges.{name}"), range)?;
        }
        validate_range("fallback_range", &self.fallback_range)?;
        validate_range("blacklist_range", &self.blacklist_range)?;
        validate_range("linear_fallback_range", &self.linear_fallback_range)?;

        for (name, tier) in self.tiers.iter() {
            if !tier.multiplier.is_finite() || tier.multiplier <= 0.0 {
                return Err(CatalogError::Validation(format!(
                    "tiers.{name}.multiplier must be a finite value greater than zero"
                )));
            }
        }

        for (table, label) in self
            .labels
            .keys()
            .map(|label| ("labels", label))
            .chain(self.blacklist.iter().map(|label| ("blacklist", label)))
        {
            let normalized = normalize_label(label);
            if normalized.is_empty() {
                return Err(CatalogError::Validation(format!(
                    "{table} contains an empty label key (`{label}`)"
                )));
            }
            if normalized != *label {
                return Err(CatalogError::Validation(format!(
                    "{table} key `{label}` never matches a classifier label; write it as `{normalized}`"
                )));
            }
        }

        Ok(())
    }

    pub fn category_for(&self, label: &str) -> Option<&str> {
        self.labels.get(label).map(String::as_str)
    }

    pub fn price_range(&self, category: &str) -> Option<PriceRange> {
        self.price_ranges.get(category).copied()
    }

    pub fn tier(&self, category: &str) -> Option<Tier> {
        self.tiers.get(category).copied()
    }

    pub fn is_blacklisted(&self, label: &str) -> bool {
        self.blacklist.contains(label)
    }

    pub fn is_whitelisted(&self, category: &str) -> bool {
        self.whitelist.contains(category)
    }

    pub fn has_linear_boost(&self, category: &str) -> bool {
        self.linear_boost_categories.contains(category)
    }

    pub fn fallback_range(&self) -> PriceRange {
        self.fallback_range
    }

    pub fn blacklist_range(&self) -> PriceRange {
        self.blacklist_range
    }

    pub fn linear_fallback_range(&self) -> PriceRange {
        self.linear_fallback_range
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Every category named by any table, sorted.
    pub fn categories(&self) -> BTreeSet<&str> {
        self.price_ranges
            .keys()
            .chain(self.tiers.keys())
            .chain(self.whitelist.iter())
            .map(String::as_str)
            .chain(self.labels.values().map(String::as_str))
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels.iter().map(|(label, category)| (label.as_str(), category.as_str()))
    }

    #[cfg(test)]
    pub(crate) fn blacklist(&self) -> impl Iterator<Item = &str> {
        self.blacklist.iter().map(String::as_str)
    }

    pub fn labels_for(&self, category: &str) -> Vec<&str> {
        self.labels
            .iter()
            .filter(|(_, target)| target.as_str() == category)
            .map(|(label, _)| label.as_str())
            .collect()
    }
}

fn validate_range(key: &str, range: &PriceRange) -> Result<(), CatalogError> {
    if range.min > range.max {
        return Err(CatalogError::Validation(format!(
            "{key} has min {} greater than max {}",
            range.min, range.max
        )));
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogPatch {
    price_ranges: Option<BTreeMap<String, PriceRange>>,
    labels: Option<BTreeMap<String, String>>,
    tiers: Option<BTreeMap<String, Tier>>,
    blacklist: Option<BTreeSet<String>>,
    whitelist: Option<BTreeSet<String>>,
    fallback_range: Option<PriceRange>,
    blacklist_range: Option<PriceRange>,
    linear_fallback_range: Option<PriceRange>,
    linear_boost_categories: Option<BTreeSet<String>>,
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{Catalog, CatalogError, PriceRange, TierName, FALLBACK_RANGE};

    #[test]
    fn builtin_catalog_carries_reference_tables() {
        let catalog = Catalog::builtin();

        assert_eq!(catalog.category_for("sports_car"), Some("car"));
        assert_eq!(catalog.category_for("studio_couch"), Some("furniture"));
        assert_eq!(catalog.price_range("car"), Some(PriceRange::new(5_000, 2_000_000)));
        assert_eq!(catalog.price_range("airplane"), Some(PriceRange::new(100_000, 10_000_000)));
        assert_eq!(catalog.tier("car").map(|tier| tier.name), Some(TierName::Luxury));
        assert!(catalog.is_blacklisted("paper_towel"));
        assert!(!catalog.is_blacklisted("laptop"));
        assert!(catalog.is_whitelisted("projector"));
        assert!(!catalog.is_whitelisted("airplane"));
        assert_eq!(catalog.fallback_range(), FALLBACK_RANGE);
        assert!(catalog.validate().is_ok());
    }

    #[test]
    fn categories_are_collected_from_every_table() {
        let catalog = Catalog::builtin();
        let categories = catalog.categories();

        assert!(categories.contains("airplane"));
        assert!(categories.contains("bottle"), "tier-only categories are listed");
        assert!(categories.contains("furniture"));
        assert_eq!(catalog.labels_for("car").len(), 5);
    }

    #[test]
    fn file_sections_replace_only_matching_tables() {
        let catalog = Catalog::from_toml_str(
            r#"
fallback_range = { min = 100, max = 900 }

[labels]
tractor = "farm_equipment"

[price_ranges]
farm_equipment = { min = 50000, max = 4000000 }

[tiers]
farm_equipment = { tier = "high", multiplier = 1.3 }
"#,
        )
        .expect("catalog should parse");

        assert_eq!(catalog.category_for("tractor"), Some("farm_equipment"));
        assert_eq!(catalog.category_for("sports_car"), None, "labels table is replaced");
        assert_eq!(catalog.price_range("car"), None, "price ranges table is replaced");
        assert_eq!(catalog.fallback_range(), PriceRange::new(100, 900));
        assert!(catalog.is_blacklisted("bottle"), "blacklist keeps built-in values");
    }

    #[test]
    fn inverted_range_is_rejected() {
        let error = Catalog::from_toml_str(
            r#"
[price_ranges]
car = { min = 10, max = 1 }
"#,
        )
        .expect_err("inverted range should fail validation");

        assert!(matches!(error, CatalogError::Validation(ref message) if message.contains("car")));
    }

    #[test]
    fn non_positive_multiplier_is_rejected() {
        let error = Catalog::from_toml_str(
            r#"
[tiers]
car = { tier = "luxury", multiplier = 0.0 }
"#,
        )
        .expect_err("zero multiplier should fail validation");

        assert!(matches!(error, CatalogError::Validation(_)));
    }

    #[test]
    fn unknown_tier_name_fails_to_parse() {
        let error = Catalog::from_toml_str(
            r#"
[tiers]
car = { tier = "platinum", multiplier = 2.0 }
"#,
        )
        .expect_err("unknown tier should fail to parse");

        assert!(matches!(error, CatalogError::Parse(_)));
    }

    #[test]
    fn label_keys_must_already_be_normalized() {
        let error = Catalog::from_toml_str(
            r#"
[labels]
"Sports Car" = "car"
"#,
        )
        .expect_err("display-style label should be rejected");
        assert!(
            matches!(error, CatalogError::Validation(ref message) if message.contains("`sports_car`"))
        );

        let error = Catalog::from_toml_str(r#"blacklist = ["Bottle"]"#)
            .expect_err("capitalized blacklist entry should be rejected");
        assert!(
            matches!(error, CatalogError::Validation(ref message) if message.starts_with("blacklist"))
        );

        let error = Catalog::from_toml_str(
            r#"
[labels]
"  " = "car"
"#,
        )
        .expect_err("blank label should be rejected");
        assert!(matches!(error, CatalogError::Validation(ref message) if message.contains("empty")));
    }

    #[test]
    fn load_reads_catalog_from_disk() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("catalog.toml");
        fs::write(&path, "blacklist = [\"receipt\"]\n").expect("write catalog");

        let catalog = Catalog::load(&path).expect("catalog should load");

        assert!(catalog.is_blacklisted("receipt"));
        assert!(!catalog.is_blacklisted("bottle"));
    }

    #[test]
    fn missing_catalog_file_reports_path() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("absent.toml");

        let error = Catalog::load(&path).expect_err("missing file should fail");

        assert!(matches!(error, CatalogError::ReadFile { .. }));
        assert!(error.to_string().contains("absent.toml"));
    }
}
