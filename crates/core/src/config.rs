use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matching::{DEFAULT_PADDING, DEFAULT_RESULT_LIMIT, MAX_RESULT_LIMIT};

pub const DEFAULT_CONFIG_FILE: &str = "gearfit.toml";
pub const NESTED_CONFIG_FILE: &str = "config/gearfit.toml";

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub matching: MatchingConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchingConfig {
    pub default_limit: usize,
    pub max_limit: usize,
    /// Clearance per side, in the case interior's unit.
    pub padding: f64,
    pub diversify_alternatives: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub default_ttl_secs: u64,
    /// Geometry and other catalog data that rarely changes.
    pub static_ttl_secs: u64,
    pub search_ttl_secs: u64,
    pub pricing_ttl_secs: u64,
    pub lookup_timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub default_limit: Option<usize>,
    pub cache_enabled: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: "sqlite://gearfit.db".to_string(), max_connections: 5, timeout_secs: 30 }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_RESULT_LIMIT,
            max_limit: MAX_RESULT_LIMIT,
            padding: DEFAULT_PADDING,
            diversify_alternatives: true,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl_secs: 86_400,
            static_ttl_secs: 2_592_000,
            search_ttl_secs: 3_600,
            pricing_ttl_secs: 21_600,
            lookup_timeout_secs: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(matching) = patch.matching {
            if let Some(default_limit) = matching.default_limit {
                self.matching.default_limit = default_limit;
            }
            if let Some(max_limit) = matching.max_limit {
                self.matching.max_limit = max_limit;
            }
            if let Some(padding) = matching.padding {
                self.matching.padding = padding;
            }
            if let Some(diversify_alternatives) = matching.diversify_alternatives {
                self.matching.diversify_alternatives = diversify_alternatives;
            }
        }

        if let Some(cache) = patch.cache {
            if let Some(enabled) = cache.enabled {
                self.cache.enabled = enabled;
            }
            if let Some(default_ttl_secs) = cache.default_ttl_secs {
                self.cache.default_ttl_secs = default_ttl_secs;
            }
            if let Some(static_ttl_secs) = cache.static_ttl_secs {
                self.cache.static_ttl_secs = static_ttl_secs;
            }
            if let Some(search_ttl_secs) = cache.search_ttl_secs {
                self.cache.search_ttl_secs = search_ttl_secs;
            }
            if let Some(pricing_ttl_secs) = cache.pricing_ttl_secs {
                self.cache.pricing_ttl_secs = pricing_ttl_secs;
            }
            if let Some(lookup_timeout_secs) = cache.lookup_timeout_secs {
                self.cache.lookup_timeout_secs = lookup_timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("GEARFIT_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("GEARFIT_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_env("GEARFIT_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("GEARFIT_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_env("GEARFIT_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("GEARFIT_MATCHING_DEFAULT_LIMIT") {
            self.matching.default_limit = parse_env("GEARFIT_MATCHING_DEFAULT_LIMIT", &value)?;
        }
        if let Some(value) = read_env("GEARFIT_MATCHING_MAX_LIMIT") {
            self.matching.max_limit = parse_env("GEARFIT_MATCHING_MAX_LIMIT", &value)?;
        }
        if let Some(value) = read_env("GEARFIT_MATCHING_PADDING") {
            self.matching.padding = parse_env("GEARFIT_MATCHING_PADDING", &value)?;
        }
        if let Some(value) = read_env("GEARFIT_MATCHING_DIVERSIFY_ALTERNATIVES") {
            self.matching.diversify_alternatives =
                parse_env("GEARFIT_MATCHING_DIVERSIFY_ALTERNATIVES", &value)?;
        }

        if let Some(value) = read_env("GEARFIT_CACHE_ENABLED") {
            self.cache.enabled = parse_env("GEARFIT_CACHE_ENABLED", &value)?;
        }
        if let Some(value) = read_env("GEARFIT_CACHE_DEFAULT_TTL_SECS") {
            self.cache.default_ttl_secs = parse_env("GEARFIT_CACHE_DEFAULT_TTL_SECS", &value)?;
        }
        if let Some(value) = read_env("GEARFIT_CACHE_STATIC_TTL_SECS") {
            self.cache.static_ttl_secs = parse_env("GEARFIT_CACHE_STATIC_TTL_SECS", &value)?;
        }
        if let Some(value) = read_env("GEARFIT_CACHE_SEARCH_TTL_SECS") {
            self.cache.search_ttl_secs = parse_env("GEARFIT_CACHE_SEARCH_TTL_SECS", &value)?;
        }
        if let Some(value) = read_env("GEARFIT_CACHE_PRICING_TTL_SECS") {
            self.cache.pricing_ttl_secs = parse_env("GEARFIT_CACHE_PRICING_TTL_SECS", &value)?;
        }
        if let Some(value) = read_env("GEARFIT_CACHE_LOOKUP_TIMEOUT_SECS") {
            self.cache.lookup_timeout_secs =
                parse_env("GEARFIT_CACHE_LOOKUP_TIMEOUT_SECS", &value)?;
        }

        let log_level = read_env("GEARFIT_LOGGING_LEVEL").or_else(|| read_env("GEARFIT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("GEARFIT_LOGGING_FORMAT").or_else(|| read_env("GEARFIT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(default_limit) = overrides.default_limit {
            self.matching.default_limit = default_limit;
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = enabled;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_matching(&self.matching)?;
        validate_cache(&self.cache)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from(NESTED_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_matching(matching: &MatchingConfig) -> Result<(), ConfigError> {
    if matching.max_limit == 0 {
        return Err(ConfigError::Validation(
            "matching.max_limit must be greater than zero".to_string(),
        ));
    }

    if matching.default_limit == 0 || matching.default_limit > matching.max_limit {
        return Err(ConfigError::Validation(format!(
            "matching.default_limit must be in range 1..={}",
            matching.max_limit
        )));
    }

    if !matching.padding.is_finite() || matching.padding < 0.0 {
        return Err(ConfigError::Validation(
            "matching.padding must be a finite, non-negative length".to_string(),
        ));
    }

    Ok(())
}

fn validate_cache(cache: &CacheConfig) -> Result<(), ConfigError> {
    let ttls = [
        ("cache.default_ttl_secs", cache.default_ttl_secs),
        ("cache.static_ttl_secs", cache.static_ttl_secs),
        ("cache.search_ttl_secs", cache.search_ttl_secs),
        ("cache.pricing_ttl_secs", cache.pricing_ttl_secs),
    ];
    if let Some((key, _)) = ttls.iter().find(|(_, value)| *value == 0) {
        return Err(ConfigError::Validation(format!("{key} must be greater than zero")));
    }

    if cache.lookup_timeout_secs == 0 || cache.lookup_timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "cache.lookup_timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    matching: Option<MatchingPatch>,
    cache: Option<CachePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct MatchingPatch {
    default_limit: Option<usize>,
    max_limit: Option<usize>,
    padding: Option<f64>,
    diversify_alternatives: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct CachePatch {
    enabled: Option<bool>,
    default_ttl_secs: Option<u64>,
    static_ttl_secs: Option<u64>,
    search_ttl_secs: Option<u64>,
    pricing_ttl_secs: Option<u64>,
    lookup_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
