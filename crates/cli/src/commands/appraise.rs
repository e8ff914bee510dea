use gavel_core::config::ConfigOverrides;
use gavel_core::{Appraisal, AppraisalRequest, PricingStrategy};

use crate::commands::{load_config, CommandResult};

const COMMAND: &str = "appraise";

pub fn run(
    label: &str,
    confidence: f64,
    condition: &str,
    strategy: Option<PricingStrategy>,
    json: bool,
) -> CommandResult {
    let config = match load_config(COMMAND, ConfigOverrides { strategy, ..Default::default() }) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let service = match config.build_appraisal_service() {
        Ok(service) => service,
        Err(error) => {
            return CommandResult::failure(COMMAND, "catalog", error.to_string(), 3);
        }
    };

    let request = AppraisalRequest::new(label, confidence, condition);
    match service.appraise(&request) {
        Ok(appraisal) => {
            let human = render_human(&appraisal);
            CommandResult::report(COMMAND, json, &appraisal, human)
        }
        Err(error) => CommandResult::failure(COMMAND, "invalid_input", error.to_string(), 4),
    }
}

fn render_human(appraisal: &Appraisal) -> String {
    let breakdown = &appraisal.breakdown;
    let branch = appraisal
        .pricing_branch
        .and_then(|branch| serde_json::to_value(branch).ok())
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_else(|| "sentinel".to_string());

    [
        format!("{}: ${}", appraisal.name, appraisal.formatted_price),
        format!("- {}", appraisal.description),
        format!("- category: {} (range {}, {branch})", appraisal.category, appraisal.price_range),
        format!("- base price: {}", breakdown.base_price),
        format!(
            "- condition: {} ({}) -> {}",
            breakdown.condition, breakdown.condition_adjustment, breakdown.price_after_condition
        ),
        format!(
            "- confidence: {}% ({}) -> {}",
            breakdown.confidence, breakdown.confidence_adjustment, breakdown.final_price
        ),
    ]
    .join("\n")
}
