use std::env;
use std::fs;
use std::path::Path;

use serde_json::{json, Value as JsonValue};
use toml::Value;
use velocity_core::config::{resolve_config_path, AppConfig, LoadOptions};

use crate::commands::CommandResult;

const COMMAND: &str = "config";

struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            );
        }
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields: Vec<JsonValue> = effective_fields(&config)
        .into_iter()
        .map(|field| {
            let source = field_source(
                field.key,
                field.env_keys,
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            );
            json!({ "key": field.key, "value": field.value, "source": source })
        })
        .collect();

    CommandResult::success_with(
        COMMAND,
        "effective config (source precedence: env > file > default)",
        Some(json!({
            "config_file": config_file_path.map(|path| path.display().to_string()),
            "fields": fields,
        })),
    )
}

fn effective_fields(config: &AppConfig) -> Vec<Field> {
    vec![
        Field {
            key: "store.url",
            value: config.store.url.clone(),
            env_keys: &["VELOCITY_STORE_URL"],
        },
        Field {
            key: "store.max_connections",
            value: config.store.max_connections.to_string(),
            env_keys: &["VELOCITY_STORE_MAX_CONNECTIONS"],
        },
        Field {
            key: "store.timeout_secs",
            value: config.store.timeout_secs.to_string(),
            env_keys: &["VELOCITY_STORE_TIMEOUT_SECS"],
        },
        Field {
            key: "places.api_key",
            value: redact_key(config.places.api_key()),
            env_keys: &["VELOCITY_PLACES_API_KEY", "VITE_GOOGLE_MAPS_API_KEY"],
        },
        Field {
            key: "places.base_url",
            value: config.places.base_url.clone(),
            env_keys: &["VELOCITY_PLACES_BASE_URL"],
        },
        Field {
            key: "places.timeout_secs",
            value: optional_secs(config.places.timeout_secs),
            env_keys: &["VELOCITY_PLACES_TIMEOUT_SECS"],
        },
        Field {
            key: "llm.api_key",
            value: redact_key(config.llm.api_key()),
            env_keys: &["VELOCITY_LLM_API_KEY", "API_KEY"],
        },
        Field {
            key: "llm.base_url",
            value: config.llm.base_url.clone(),
            env_keys: &["VELOCITY_LLM_BASE_URL"],
        },
        Field { key: "llm.model", value: config.llm.model.clone(), env_keys: &["VELOCITY_LLM_MODEL"] },
        Field {
            key: "llm.timeout_secs",
            value: optional_secs(config.llm.timeout_secs),
            env_keys: &["VELOCITY_LLM_TIMEOUT_SECS"],
        },
        Field {
            key: "cache.metrics_ttl_secs",
            value: config.cache.metrics_ttl_secs.to_string(),
            env_keys: &["VELOCITY_CACHE_METRICS_TTL_SECS"],
        },
        Field {
            key: "cache.analysis_ttl_secs",
            value: config.cache.analysis_ttl_secs.to_string(),
            env_keys: &["VELOCITY_CACHE_ANALYSIS_TTL_SECS"],
        },
        Field {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["VELOCITY_LOGGING_LEVEL", "VELOCITY_LOG_LEVEL"],
        },
        Field {
            key: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["VELOCITY_LOGGING_FORMAT", "VELOCITY_LOG_FORMAT"],
        },
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
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

fn optional_secs(value: Option<u64>) -> String {
    value.map(|secs| secs.to_string()).unwrap_or_else(|| "<transport default>".to_string())
}

/// Keep the last four characters so operators can tell keys apart.
fn redact_key(key: Option<&str>) -> String {
    let Some(key) = key else {
        return "<unset>".to_string();
    };
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "<redacted>".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("***{tail}")
}
