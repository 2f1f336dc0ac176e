use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::FreshnessPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "velocity.toml";
pub const NESTED_CONFIG_FILE: &str = "config/velocity.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub places: PlacesConfig,
    pub llm: LlmConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct PlacesConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub business_profile_url: String,
    pub account_management_url: String,
    pub timeout_secs: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    pub metrics_ttl_secs: u64,
    pub analysis_ttl_secs: u64,
}

#[derive(Clone, Debug)]
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
    pub store_url: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub places_api_key: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_model: Option<String>,
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

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                url: "sqlite://velocity.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            places: PlacesConfig {
                api_key: None,
                base_url: "https://places.googleapis.com/v1".to_string(),
                business_profile_url: "https://mybusinessbusinessinformation.googleapis.com/v1"
                    .to_string(),
                account_management_url: "https://mybusinessaccountmanagement.googleapis.com/v1"
                    .to_string(),
                timeout_secs: None,
            },
            llm: LlmConfig {
                api_key: None,
                base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                model: "gemini-2.5-flash".to_string(),
                timeout_secs: None,
            },
            cache: CacheConfig { metrics_ttl_secs: 86_400, analysis_ttl_secs: 604_800 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

/// Normalize a user-supplied API key.
///
/// Keys pasted into config files or env vars often arrive quoted, so every
/// `'` and `"` is dropped along with surrounding whitespace. Returns `None`
/// when nothing usable remains.
pub fn sanitize_credential(raw: &str) -> Option<String> {
    let stripped: String = raw.trim().chars().filter(|ch| *ch != '"' && *ch != '\'').collect();
    let trimmed = stripped.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn secret_credential(value: &str) -> Option<SecretString> {
    sanitize_credential(value).map(SecretString::from)
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

impl CacheConfig {
    pub fn freshness_policy(&self) -> FreshnessPolicy {
        FreshnessPolicy::from_secs(self.metrics_ttl_secs, self.analysis_ttl_secs)
    }
}

impl PlacesConfig {
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|key| key.expose_secret())
    }
}

impl LlmConfig {
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|key| key.expose_secret())
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
        if let Some(store) = patch.store {
            if let Some(url) = store.url {
                self.store.url = url;
            }
            if let Some(max_connections) = store.max_connections {
                self.store.max_connections = max_connections;
            }
            if let Some(timeout_secs) = store.timeout_secs {
                self.store.timeout_secs = timeout_secs;
            }
        }

        if let Some(places) = patch.places {
            if let Some(api_key) = places.api_key {
                self.places.api_key = secret_credential(&api_key);
            }
            if let Some(base_url) = places.base_url {
                self.places.base_url = base_url;
            }
            if let Some(url) = places.business_profile_url {
                self.places.business_profile_url = url;
            }
            if let Some(url) = places.account_management_url {
                self.places.account_management_url = url;
            }
            if let Some(timeout_secs) = places.timeout_secs {
                self.places.timeout_secs = Some(timeout_secs);
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(api_key) = llm.api_key {
                self.llm.api_key = secret_credential(&api_key);
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = Some(timeout_secs);
            }
        }

        if let Some(cache) = patch.cache {
            if let Some(ttl) = cache.metrics_ttl_secs {
                self.cache.metrics_ttl_secs = ttl;
            }
            if let Some(ttl) = cache.analysis_ttl_secs {
                self.cache.analysis_ttl_secs = ttl;
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
        if let Some(value) = read_env("VELOCITY_STORE_URL") {
            self.store.url = value;
        }
        if let Some(value) = read_env("VELOCITY_STORE_MAX_CONNECTIONS") {
            self.store.max_connections = parse_u32("VELOCITY_STORE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("VELOCITY_STORE_TIMEOUT_SECS") {
            self.store.timeout_secs = parse_u64("VELOCITY_STORE_TIMEOUT_SECS", &value)?;
        }

        let places_key =
            read_env("VELOCITY_PLACES_API_KEY").or_else(|| read_env("VITE_GOOGLE_MAPS_API_KEY"));
        if let Some(value) = places_key {
            self.places.api_key = secret_credential(&value);
        }
        if let Some(value) = read_env("VELOCITY_PLACES_BASE_URL") {
            self.places.base_url = value;
        }
        if let Some(value) = read_env("VELOCITY_PLACES_TIMEOUT_SECS") {
            self.places.timeout_secs = Some(parse_u64("VELOCITY_PLACES_TIMEOUT_SECS", &value)?);
        }

        let llm_key = read_env("VELOCITY_LLM_API_KEY").or_else(|| read_env("API_KEY"));
        if let Some(value) = llm_key {
            self.llm.api_key = secret_credential(&value);
        }
        if let Some(value) = read_env("VELOCITY_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("VELOCITY_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("VELOCITY_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = Some(parse_u64("VELOCITY_LLM_TIMEOUT_SECS", &value)?);
        }

        if let Some(value) = read_env("VELOCITY_CACHE_METRICS_TTL_SECS") {
            self.cache.metrics_ttl_secs = parse_u64("VELOCITY_CACHE_METRICS_TTL_SECS", &value)?;
        }
        if let Some(value) = read_env("VELOCITY_CACHE_ANALYSIS_TTL_SECS") {
            self.cache.analysis_ttl_secs =
                parse_u64("VELOCITY_CACHE_ANALYSIS_TTL_SECS", &value)?;
        }

        let log_level =
            read_env("VELOCITY_LOGGING_LEVEL").or_else(|| read_env("VELOCITY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("VELOCITY_LOGGING_FORMAT").or_else(|| read_env("VELOCITY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(store_url) = overrides.store_url {
            self.store.url = store_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(places_api_key) = overrides.places_api_key {
            self.places.api_key = secret_credential(&places_api_key);
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = secret_credential(&llm_api_key);
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_store(&self.store)?;
        validate_places(&self.places)?;
        validate_llm(&self.llm)?;
        validate_cache(&self.cache)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// The config file `load` would read for `explicit_path`, if it exists.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
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

fn validate_store(store: &StoreConfig) -> Result<(), ConfigError> {
    let url = store.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "store.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if store.max_connections == 0 {
        return Err(ConfigError::Validation(
            "store.max_connections must be greater than zero".to_string(),
        ));
    }

    if store.timeout_secs == 0 || store.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "store.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_places(places: &PlacesConfig) -> Result<(), ConfigError> {
    for (key, url) in [
        ("places.base_url", &places.base_url),
        ("places.business_profile_url", &places.business_profile_url),
        ("places.account_management_url", &places.account_management_url),
    ] {
        validate_http_url(key, url)?;
    }
    validate_timeout("places.timeout_secs", places.timeout_secs)
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    validate_http_url("llm.base_url", &llm.base_url)?;
    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }
    validate_timeout("llm.timeout_secs", llm.timeout_secs)
}

/// Ten years.
const MAX_CACHE_TTL_SECS: u64 = 315_360_000;

fn validate_cache(cache: &CacheConfig) -> Result<(), ConfigError> {
    if cache.metrics_ttl_secs == 0 || cache.analysis_ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "cache.metrics_ttl_secs and cache.analysis_ttl_secs must be greater than zero"
                .to_string(),
        ));
    }
    if cache.metrics_ttl_secs > MAX_CACHE_TTL_SECS || cache.analysis_ttl_secs > MAX_CACHE_TTL_SECS {
        return Err(ConfigError::Validation(format!(
            "cache.metrics_ttl_secs and cache.analysis_ttl_secs must be at most {MAX_CACHE_TTL_SECS}"
        )));
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

fn validate_http_url(key: &str, url: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!("{key} must start with http:// or https://")));
    }
    Ok(())
}

fn validate_timeout(key: &str, timeout_secs: Option<u64>) -> Result<(), ConfigError> {
    match timeout_secs {
        Some(secs) if secs == 0 || secs > 300 => {
            Err(ConfigError::Validation(format!("{key} must be in range 1..=300 when set")))
        }
        _ => Ok(()),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    store: Option<StorePatch>,
    places: Option<PlacesPatch>,
    llm: Option<LlmPatch>,
    cache: Option<CachePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct StorePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PlacesPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    business_profile_url: Option<String>,
    account_management_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CachePatch {
    metrics_ttl_secs: Option<u64>,
    analysis_ttl_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use chrono::Duration;
    use tempfile::TempDir;

    use super::{sanitize_credential, AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const TOUCHED_VARS: &[&str] = &[
        "VELOCITY_STORE_URL",
        "VELOCITY_PLACES_API_KEY",
        "VITE_GOOGLE_MAPS_API_KEY",
        "VELOCITY_LLM_API_KEY",
        "API_KEY",
        "VELOCITY_LOG_LEVEL",
        "VELOCITY_LOG_FORMAT",
        "VELOCITY_CACHE_METRICS_TTL_SECS",
        "VELOCITY_CACHE_ANALYSIS_TTL_SECS",
        "TEST_VELOCITY_LLM_KEY",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars() {
        for var in TOUCHED_VARS {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn sanitize_credential_strips_quotes_and_whitespace() {
        assert_eq!(sanitize_credential("  \"AIzaKey\" "), Some("AIzaKey".to_string()));
        assert_eq!(sanitize_credential("'AIza'Key'"), Some("AIzaKey".to_string()));
        assert_eq!(sanitize_credential(" \" ' \" "), None);
        assert_eq!(sanitize_credential(""), None);
    }

    #[test]
    fn defaults_load_without_any_file_or_keys() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.places.api_key().is_none(), "places key should default to unset")?;
        ensure(config.llm.api_key().is_none(), "llm key should default to unset")?;
        ensure(config.llm.model == "gemini-2.5-flash", "default model should be gemini")?;
        ensure(config.places.timeout_secs.is_none(), "no transport timeout by default")?;
        let policy = config.cache.freshness_policy();
        ensure(policy.metrics_window == Duration::hours(24), "metrics window is 24h")?;
        ensure(policy.analysis_window == Duration::days(7), "analysis window is 7d")
    }

    #[test]
    fn file_load_supports_env_interpolation_and_sanitizes_keys() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("TEST_VELOCITY_LLM_KEY", "llm-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("velocity.toml");
            fs::write(
                &path,
                r#"
[places]
api_key = "'quoted-maps-key'"

[llm]
api_key = "${TEST_VELOCITY_LLM_KEY}"

[cache]
metrics_ttl_secs = 60
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.places.api_key() == Some("quoted-maps-key"),
                "quoted places key should be sanitized",
            )?;
            ensure(
                config.llm.api_key() == Some("llm-from-env"),
                "llm key should be interpolated from environment",
            )?;
            ensure(config.cache.metrics_ttl_secs == 60, "file ttl should apply")
        })();

        clear_vars();
        result
    }

    #[test]
    fn legacy_key_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("VITE_GOOGLE_MAPS_API_KEY", "\"maps-alias\"");
        env::set_var("API_KEY", "gemini-alias");
        env::set_var("VELOCITY_LOG_LEVEL", "warn");
        env::set_var("VELOCITY_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.places.api_key() == Some("maps-alias"), "maps alias should apply")?;
            ensure(config.llm.api_key() == Some("gemini-alias"), "llm alias should apply")?;
            ensure(config.logging.level == "warn", "log level alias should apply")?;
            ensure(matches!(config.logging.format, LogFormat::Json), "log format alias applies")
        })();

        clear_vars();
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("VELOCITY_STORE_URL", "sqlite://from-env.db");
        env::set_var("VELOCITY_PLACES_API_KEY", "maps-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("velocity.toml");
            fs::write(
                &path,
                r#"
[store]
url = "sqlite://from-file.db"

[places]
api_key = "maps-from-file"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    store_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.store.url == "sqlite://from-override.db", "override store url wins")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.places.api_key() == Some("maps-from-env"),
                "env places key should win over file",
            )
        })();

        clear_vars();
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("VELOCITY_CACHE_METRICS_TTL_SECS", "0");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("cache.metrics_ttl_secs")
            );
            ensure(has_message, "validation failure should mention cache.metrics_ttl_secs")
        })();

        clear_vars();
        result
    }

    #[test]
    fn oversized_cache_ttl_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("VELOCITY_CACHE_ANALYSIS_TTL_SECS", "18446744073709551615");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected oversized ttl to fail validation".to_string()),
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("must be at most")
            );
            ensure(has_message, "validation failure should name the ttl upper bound")
        })();

        clear_vars();
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("VELOCITY_PLACES_API_KEY", "maps-secret-value");
        env::set_var("VELOCITY_LLM_API_KEY", "llm-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("maps-secret-value"), "debug output should hide maps key")?;
            ensure(!debug.contains("llm-secret-value"), "debug output should hide llm key")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )
        })();

        clear_vars();
        result
    }
}
