use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use gearfit_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_FILE, NESTED_CONFIG_FILE};
use serde::Serialize;
use toml::Value;

use crate::commands::CommandResult;

#[derive(Debug, Serialize, PartialEq, Eq)]
struct ConfigEntry {
    key: &'static str,
    value: String,
    source: String,
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            );
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let entries = effective_entries(&config, config_file_doc.as_ref(), config_file_path.as_deref());

    CommandResult::success_with_data(
        "config",
        "effective config (source precedence: env > file > default)",
        Some(entries),
    )
}

fn effective_entries(
    config: &AppConfig,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> Vec<ConfigEntry> {
    let database = &config.database;
    let matching = &config.matching;
    let cache = &config.cache;
    let logging = &config.logging;

    let values: [(&'static str, &'static [&'static str], String); 15] = [
        ("database.url", &["GEARFIT_DATABASE_URL"], database.url.clone()),
        ("database.max_connections", &["GEARFIT_DATABASE_MAX_CONNECTIONS"], database.max_connections.to_string()),
        ("database.timeout_secs", &["GEARFIT_DATABASE_TIMEOUT_SECS"], database.timeout_secs.to_string()),
        ("matching.default_limit", &["GEARFIT_MATCHING_DEFAULT_LIMIT"], matching.default_limit.to_string()),
        ("matching.max_limit", &["GEARFIT_MATCHING_MAX_LIMIT"], matching.max_limit.to_string()),
        ("matching.padding", &["GEARFIT_MATCHING_PADDING"], matching.padding.to_string()),
        (
            "matching.diversify_alternatives",
            &["GEARFIT_MATCHING_DIVERSIFY_ALTERNATIVES"],
            matching.diversify_alternatives.to_string(),
        ),
        ("cache.enabled", &["GEARFIT_CACHE_ENABLED"], cache.enabled.to_string()),
        ("cache.default_ttl_secs", &["GEARFIT_CACHE_DEFAULT_TTL_SECS"], cache.default_ttl_secs.to_string()),
        ("cache.static_ttl_secs", &["GEARFIT_CACHE_STATIC_TTL_SECS"], cache.static_ttl_secs.to_string()),
        ("cache.search_ttl_secs", &["GEARFIT_CACHE_SEARCH_TTL_SECS"], cache.search_ttl_secs.to_string()),
        ("cache.pricing_ttl_secs", &["GEARFIT_CACHE_PRICING_TTL_SECS"], cache.pricing_ttl_secs.to_string()),
        (
            "cache.lookup_timeout_secs",
            &["GEARFIT_CACHE_LOOKUP_TIMEOUT_SECS"],
            cache.lookup_timeout_secs.to_string(),
        ),
        ("logging.level", &["GEARFIT_LOGGING_LEVEL", "GEARFIT_LOG_LEVEL"], logging.level.clone()),
        ("logging.format", &["GEARFIT_LOGGING_FORMAT", "GEARFIT_LOG_FORMAT"], logging.format.as_str().to_string()),
    ];

    values
        .into_iter()
        .map(|(key, env_keys, value)| ConfigEntry {
            key,
            value,
            source: field_source(key, env_keys, config_file_doc, config_file_path),
        })
        .collect()
}

fn detect_config_path() -> Option<PathBuf> {
    [DEFAULT_CONFIG_FILE, NESTED_CONFIG_FILE].into_iter().map(PathBuf::from).find(|path| path.exists())
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
