use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use gavel_core::config::{AppConfig, LoadOptions};
use toml::Value;

struct Field {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let (config_file_doc, file_warning) = match load_config_file_doc(config_file_path.as_deref()) {
        Ok(doc) => (doc, None),
        Err(error) => (None, Some(format!("warning: {error:#}"))),
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(file_warning);

    for field in fields(&config) {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    vec![
        Field {
            key_path: "server.bind_address",
            env_keys: &["GAVEL_SERVER_BIND_ADDRESS"],
            value: config.server.bind_address.clone(),
        },
        Field {
            key_path: "server.port",
            env_keys: &["GAVEL_SERVER_PORT"],
            value: config.server.port.to_string(),
        },
        Field {
            key_path: "server.graceful_shutdown_secs",
            env_keys: &["GAVEL_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            value: config.server.graceful_shutdown_secs.to_string(),
        },
        Field {
            key_path: "logging.level",
            env_keys: &["GAVEL_LOGGING_LEVEL", "GAVEL_LOG_LEVEL"],
            value: config.logging.level.clone(),
        },
        Field {
            key_path: "logging.format",
            env_keys: &["GAVEL_LOGGING_FORMAT", "GAVEL_LOG_FORMAT"],
            value: format!("{:?}", config.logging.format),
        },
        Field {
            key_path: "valuation.strategy",
            env_keys: &["GAVEL_VALUATION_STRATEGY"],
            value: config.valuation.strategy.to_string(),
        },
        Field {
            key_path: "valuation.catalog_path",
            env_keys: &["GAVEL_VALUATION_CATALOG_PATH"],
            value: config
                .valuation
                .catalog_path
                .as_deref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "<builtin>".to_string()),
        },
        Field {
            key_path: "valuation.sentinel_base_price",
            env_keys: &["GAVEL_VALUATION_SENTINEL_BASE_PRICE"],
            value: config.valuation.sentinel_base_price.to_string(),
        },
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("gavel.toml"), PathBuf::from("config/gavel.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> anyhow::Result<Option<Value>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read `{}` for source attribution", path.display()))?;
    let doc = raw
        .parse::<Value>()
        .with_context(|| format!("could not parse `{}` for source attribution", path.display()))?;
    Ok(Some(doc))
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
