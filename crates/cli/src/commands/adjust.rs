use gavel_core::config::ConfigOverrides;
use gavel_core::valuation::adjuster::parse_base_price;
use gavel_core::valuation::appraisal::validate_confidence;
use gavel_core::{adjust, ValuationBreakdown};

use crate::commands::{load_config, CommandResult};

const COMMAND: &str = "adjust";

pub fn run(base_price: &str, confidence: f64, condition: &str, json: bool) -> CommandResult {
    let config = match load_config(COMMAND, ConfigOverrides::default()) {
        Ok(config) => config,
        Err(result) => return result,
    };

    if let Err(error) = validate_confidence(confidence) {
        return CommandResult::failure(COMMAND, "invalid_input", error.to_string(), 4);
    }

    let base_price = parse_base_price(base_price, config.valuation.sentinel_base_price);
    let breakdown = adjust(base_price, condition, confidence);
    let human = render_human(&breakdown);
    CommandResult::report(COMMAND, json, &breakdown, human)
}

fn render_human(breakdown: &ValuationBreakdown) -> String {
    [
        format!("final price: {}", breakdown.final_price),
        format!("- base price: {}", breakdown.base_price),
        format!(
            "- condition: {} ({}) -> {}",
            breakdown.condition, breakdown.condition_adjustment, breakdown.price_after_condition
        ),
        format!("- confidence: {}% ({})", breakdown.confidence, breakdown.confidence_adjustment),
    ]
    .join("\n")
}
