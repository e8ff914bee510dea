use super::catalog::{Catalog, PriceRange, Tier};

/// Outcome of mapping a classifier label onto the catalog.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    pub category: Option<String>,
    pub tier: Tier,
    pub price_range: PriceRange,
}

impl Resolution {
    pub fn category_or_other(&self) -> &str {
        self.category.as_deref().unwrap_or("other")
    }
}

/// Lowercases a raw classifier label and joins its words with underscores.
pub fn normalize_label(raw: &str) -> String {
    raw.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join("_")
}

/// Looks up category, tier and price range for an already-normalized label.
///
/// Blacklist membership is not consulted here; the estimator short-circuits
/// blacklisted labels before resolution.
pub fn resolve(catalog: &Catalog, label: &str) -> Resolution {
    let category = catalog.category_for(label).map(ToOwned::to_owned);
    let (tier, price_range) = match category.as_deref() {
        Some(name) => (
            catalog.tier(name).unwrap_or_default(),
            catalog.price_range(name).unwrap_or_else(|| catalog.fallback_range()),
        ),
        None => (Tier::default(), catalog.fallback_range()),
    };

    Resolution { category, tier, price_range }
}

#[cfg(test)]
mod tests {
    use super::{normalize_label, resolve};
    use crate::valuation::catalog::{Catalog, PriceRange, Tier, TierName, FALLBACK_RANGE};

    #[test]
    fn mapped_label_resolves_category_tier_and_range() {
        let catalog = Catalog::builtin();
        let resolution = resolve(&catalog, "cellular_telephone");

        assert_eq!(resolution.category.as_deref(), Some("phone"));
        assert_eq!(resolution.tier, Tier { name: TierName::High, multiplier: 1.1 });
        assert_eq!(resolution.price_range, PriceRange::new(3_000, 150_000));
    }

    #[test]
    fn category_without_tier_defaults_to_other() {
        let catalog = Catalog::builtin();
        let resolution = resolve(&catalog, "digital_watch");

        assert_eq!(resolution.category.as_deref(), Some("watch"));
        assert_eq!(resolution.tier, Tier::DEFAULT);
        assert_eq!(resolution.price_range, PriceRange::new(1_000, 1_000_000));
    }

    #[test]
    fn unmapped_label_uses_fallback_range() {
        let catalog = Catalog::builtin();
        let resolution = resolve(&catalog, "hot_air_balloon");

        assert_eq!(resolution.category, None);
        assert_eq!(resolution.category_or_other(), "other");
        assert_eq!(resolution.tier, Tier::DEFAULT);
        assert_eq!(resolution.price_range, FALLBACK_RANGE);
    }

    #[test]
    fn category_without_range_uses_fallback_range() {
        let catalog = Catalog::from_toml_str(
            r#"
[labels]
kayak = "boat"
"#,
        )
        .expect("catalog should parse");
        let resolution = resolve(&catalog, "kayak");

        assert_eq!(resolution.category.as_deref(), Some("boat"));
        assert_eq!(resolution.price_range, FALLBACK_RANGE);
    }

    #[test]
    fn lookup_is_exact_on_normalized_labels() {
        let catalog = Catalog::builtin();

        assert_eq!(resolve(&catalog, "Sports Car").category, None);
        assert_eq!(normalize_label("  Sports   Car "), "sports_car");
        assert_eq!(resolve(&catalog, &normalize_label("Sports Car")).category.as_deref(), Some("car"));
    }
}
