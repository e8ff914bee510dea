use std::env;
use std::fs;
use std::sync::{Mutex, OnceLock};

use gavel_cli::commands::{adjust, appraise, catalog, config};
use gavel_core::PricingStrategy;
use serde_json::Value;

const CUSTOM_CATALOG: &str = r#"
[labels]
tractor = "farm_equipment"

[price_ranges]
farm_equipment = { min = 50000, max = 4000000 }

[tiers]
farm_equipment = { tier = "high", multiplier = 1.3 }
"#;

#[test]
fn appraise_returns_json_appraisal_with_default_config() {
    with_env(&[], || {
        let result = appraise::run("sports_car", 0.95, "Used", None, true);
        assert_eq!(result.exit_code, 0, "expected successful appraisal");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["name"], "Sports Car");
        assert_eq!(payload["category"], "car");
        assert_eq!(payload["pricing_branch"], "high_confidence");
        assert_eq!(payload["breakdown"]["condition_adjustment"], "-25%");
        assert_eq!(payload["breakdown"]["confidence_adjustment"], "+5%");
        assert_eq!(payload["breakdown"]["final_price"], 1_575_000);
        assert_eq!(payload["formatted_price"], "1,575,000");
    });
}

#[test]
fn appraise_renders_human_summary() {
    with_env(&[], || {
        let result = appraise::run("handbag", 0.6, "New", None, false);
        assert_eq!(result.exit_code, 0, "expected successful appraisal");

        assert!(result.output.starts_with("Handbag: $25,250"));
        assert!(result.output.contains("- category: handbag (range 500..=50000, medium_confidence)"));
        assert!(result.output.contains("- condition: New (0%) -> 25250"));
    });
}

#[test]
fn appraise_strategy_flag_overrides_config() {
    with_env(&[("GAVEL_VALUATION_STRATEGY", "bucketed")], || {
        let result = appraise::run("handbag", 0.5, "New", Some(PricingStrategy::Linear), true);
        assert_eq!(result.exit_code, 0, "expected successful appraisal");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["pricing_branch"], "linear");
        assert_eq!(payload["breakdown"]["base_price"], 25_250);
    });
}

#[test]
fn appraise_rejects_out_of_range_confidence() {
    with_env(&[], || {
        let result = appraise::run("laptop", 1.5, "New", None, true);
        assert_eq!(result.exit_code, 4, "expected invalid input code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "appraise");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "invalid_input");
    });
}

#[test]
fn appraise_returns_config_failure_for_unknown_strategy() {
    with_env(&[("GAVEL_VALUATION_STRATEGY", "auction")], || {
        let result = appraise::run("laptop", 0.7, "New", None, true);
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn appraise_uses_configured_catalog_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("catalog.toml");
    fs::write(&path, CUSTOM_CATALOG).expect("write catalog");
    let path = path.display().to_string();

    with_env(&[("GAVEL_VALUATION_CATALOG_PATH", path.as_str())], || {
        let result = appraise::run("tractor", 0.7, "New", None, true);
        assert_eq!(result.exit_code, 0, "expected successful appraisal");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["category"], "farm_equipment");
        assert_eq!(payload["breakdown"]["final_price"], 2_632_500);
    });
}

#[test]
fn adjust_falls_back_to_configured_sentinel() {
    with_env(&[("GAVEL_VALUATION_SENTINEL_BASE_PRICE", "2000")], || {
        let result = adjust::run("unknown", 0.95, "Used", true);
        assert_eq!(result.exit_code, 0, "expected successful adjustment");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["base_price"], 2_000);
        assert_eq!(payload["price_after_condition"], 1_500);
        assert_eq!(payload["final_price"], 1_575);
    });
}

#[test]
fn adjust_applies_low_confidence_penalty() {
    with_env(&[], || {
        let result = adjust::run("10000", 0.3, "Heavily Used", false);
        assert_eq!(result.exit_code, 0, "expected successful adjustment");

        assert!(result.output.starts_with("final price: 4500"));
        assert!(result.output.contains("- confidence: 30% (-10%)"));
    });
}

#[test]
fn catalog_lists_builtin_categories() {
    with_env(&[], || {
        let result = catalog::run(None);
        assert_eq!(result.exit_code, 0, "expected catalog listing");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "catalog");
        assert_eq!(payload["status"], "ok");
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.contains("fallback 500..=1500"));
        assert!(message.contains("- car: 5000..=2000000, tier luxury x1.2"));
    });
}

#[test]
fn catalog_rejects_unknown_category() {
    with_env(&[], || {
        let result = catalog::run(Some("spaceship"));
        assert_eq!(result.exit_code, 4, "expected unknown category code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "unknown_category");
    });
}

#[test]
fn catalog_reports_missing_catalog_file() {
    with_env(&[("GAVEL_VALUATION_CATALOG_PATH", "/definitely/not/here/catalog.toml")], || {
        let result = catalog::run(None);
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn config_attributes_env_sources() {
    with_env(&[("GAVEL_LOG_LEVEL", "debug"), ("GAVEL_SERVER_PORT", "9100")], || {
        let output = config::run();

        assert!(output.contains("- server.port = 9100 (source: env (GAVEL_SERVER_PORT))"));
        assert!(output.contains("- logging.level = debug (source: env (GAVEL_LOG_LEVEL))"));
        assert!(output.contains("- valuation.catalog_path = <builtin> (source: default)"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "GAVEL_SERVER_BIND_ADDRESS",
        "GAVEL_SERVER_PORT",
        "GAVEL_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "GAVEL_LOGGING_LEVEL",
        "GAVEL_LOGGING_FORMAT",
        "GAVEL_LOG_LEVEL",
        "GAVEL_LOG_FORMAT",
        "GAVEL_VALUATION_STRATEGY",
        "GAVEL_VALUATION_CATALOG_PATH",
        "GAVEL_VALUATION_SENTINEL_BASE_PRICE",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
