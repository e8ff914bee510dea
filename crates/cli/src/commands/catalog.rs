use gavel_core::config::ConfigOverrides;
use gavel_core::Catalog;

use crate::commands::{load_config, CommandResult};

const COMMAND: &str = "catalog";

pub fn run(category: Option<&str>) -> CommandResult {
    let config = match load_config(COMMAND, ConfigOverrides::default()) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let service = match config.build_appraisal_service() {
        Ok(service) => service,
        Err(error) => {
            return CommandResult::failure(COMMAND, "catalog", error.to_string(), 3);
        }
    };
    let catalog = service.estimator().catalog();

    let mut lines = Vec::new();
    match category {
        Some(name) => {
            if !catalog.categories().contains(name) {
                return CommandResult::failure(
                    COMMAND,
                    "unknown_category",
                    format!("category `{name}` is not in the catalog"),
                    4,
                );
            }
            lines.push(render_category(catalog, name));
        }
        None => {
            lines.push(format!(
                "catalog: {} categories, {} labels (fallback {}, blacklist {})",
                catalog.categories().len(),
                catalog.label_count(),
                catalog.fallback_range(),
                catalog.blacklist_range()
            ));
            lines.extend(catalog.categories().into_iter().map(|name| render_category(catalog, name)));
        }
    }

    CommandResult::success(COMMAND, lines.join("\n"))
}

fn render_category(catalog: &Catalog, name: &str) -> String {
    let range = catalog
        .price_range(name)
        .map(|range| range.to_string())
        .unwrap_or_else(|| format!("{} (fallback)", catalog.fallback_range()));
    let tier = catalog.tier(name).unwrap_or_default();
    let mut flags = Vec::new();
    if catalog.is_whitelisted(name) {
        flags.push("whitelisted");
    }
    if catalog.has_linear_boost(name) {
        flags.push("linear_boost");
    }
    let labels = catalog.labels_for(name);

    let mut line = format!("- {name}: {range}, tier {} x{}", tier.name, tier.multiplier);
    if !flags.is_empty() {
        line.push_str(&format!(" [{}]", flags.join(", ")));
    }
    if !labels.is_empty() {
        line.push_str(&format!("; labels: {}", labels.join(", ")));
    }
    line
}
