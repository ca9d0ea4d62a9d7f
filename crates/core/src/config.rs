use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub checkout: CheckoutServiceConfig,
    pub store: StoreApiConfig,
    pub payments: PaymentsConfig,
    pub database: DatabaseConfig,
    pub polling: PollingConfig,
    pub logging: LoggingConfig,
}

/// The checkout worker that fills and submits the payment form.
#[derive(Clone, Debug)]
pub struct CheckoutServiceConfig {
    pub base_url: String,
    pub submit_timeout_secs: u64,
}

/// Read-only product catalog service.
#[derive(Clone, Debug)]
pub struct StoreApiConfig {
    pub base_url: String,
}

#[derive(Clone, Debug)]
pub struct PaymentsConfig {
    /// VaultPay SDK key; absent in offline demo mode.
    pub api_key: Option<SecretString>,
    pub merchant_name: String,
    /// Storefront URL the automation worker drives.
    pub checkout_url: String,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Copy, Debug)]
pub struct PollingConfig {
    pub interval_secs: u64,
    pub max_attempts: u32,
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

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub checkout_base_url: Option<String>,
    pub store_base_url: Option<String>,
    pub payments_api_key: Option<String>,
    pub log_level: Option<String>,
    pub polling_interval_secs: Option<u64>,
    pub polling_max_attempts: Option<u32>,
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
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            checkout: CheckoutServiceConfig {
                base_url: "http://localhost:8001".to_string(),
                submit_timeout_secs: 30,
            },
            store: StoreApiConfig { base_url: "http://localhost:8000".to_string() },
            payments: PaymentsConfig {
                api_key: None,
                merchant_name: "Shopwright Store".to_string(),
                checkout_url: "http://localhost:5173".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://shopwright.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            polling: PollingConfig { interval_secs: 5, max_attempts: 120 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    checkout: Option<CheckoutPatch>,
    store: Option<StorePatch>,
    payments: Option<PaymentsPatch>,
    database: Option<DatabasePatch>,
    polling: Option<PollingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CheckoutPatch {
    base_url: Option<String>,
    submit_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct StorePatch {
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PaymentsPatch {
    api_key: Option<String>,
    merchant_name: Option<String>,
    checkout_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PollingPatch {
    interval_secs: Option<u64>,
    max_attempts: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("shopwright.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(checkout) = patch.checkout {
            if let Some(base_url) = checkout.base_url {
                self.checkout.base_url = base_url;
            }
            if let Some(submit_timeout_secs) = checkout.submit_timeout_secs {
                self.checkout.submit_timeout_secs = submit_timeout_secs;
            }
        }

        if let Some(store) = patch.store {
            if let Some(base_url) = store.base_url {
                self.store.base_url = base_url;
            }
        }

        if let Some(payments) = patch.payments {
            if let Some(api_key_value) = payments.api_key {
                self.payments.api_key = Some(api_key_value.into());
            }
            if let Some(merchant_name) = payments.merchant_name {
                self.payments.merchant_name = merchant_name;
            }
            if let Some(checkout_url) = payments.checkout_url {
                self.payments.checkout_url = checkout_url;
            }
        }

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

        if let Some(polling) = patch.polling {
            if let Some(interval_secs) = polling.interval_secs {
                self.polling.interval_secs = interval_secs;
            }
            if let Some(max_attempts) = polling.max_attempts {
                self.polling.max_attempts = max_attempts;
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
        if let Some(value) = read_env("SHOPWRIGHT_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("SHOPWRIGHT_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("SHOPWRIGHT_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("SHOPWRIGHT_CHECKOUT_BASE_URL") {
            self.checkout.base_url = value;
        }
        if let Some(value) = read_env("SHOPWRIGHT_STORE_BASE_URL") {
            self.store.base_url = value;
        }
        if let Some(value) = read_env("VAULTPAY_API_KEY") {
            self.payments.api_key = Some(value.into());
        }
        if let Some(value) = read_env("SHOPWRIGHT_MERCHANT_NAME") {
            self.payments.merchant_name = value;
        }
        if let Some(value) = read_env("SHOPWRIGHT_CHECKOUT_URL") {
            self.payments.checkout_url = value;
        }
        if let Some(value) = read_env("SHOPWRIGHT_POLL_INTERVAL_SECS") {
            self.polling.interval_secs = parse_u64("SHOPWRIGHT_POLL_INTERVAL_SECS", &value)?;
        }
        if let Some(value) = read_env("SHOPWRIGHT_POLL_MAX_ATTEMPTS") {
            self.polling.max_attempts = parse_u32("SHOPWRIGHT_POLL_MAX_ATTEMPTS", &value)?;
        }
        if let Some(value) = read_env("SHOPWRIGHT_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("SHOPWRIGHT_LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(checkout_base_url) = overrides.checkout_base_url {
            self.checkout.base_url = checkout_base_url;
        }
        if let Some(store_base_url) = overrides.store_base_url {
            self.store.base_url = store_base_url;
        }
        if let Some(api_key_value) = overrides.payments_api_key {
            self.payments.api_key = Some(api_key_value.into());
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(interval_secs) = overrides.polling_interval_secs {
            self.polling.interval_secs = interval_secs;
        }
        if let Some(max_attempts) = overrides.polling_max_attempts {
            self.polling.max_attempts = max_attempts;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_base_url("checkout.base_url", &self.checkout.base_url)?;
        validate_base_url("store.base_url", &self.store.base_url)?;
        validate_base_url("payments.checkout_url", &self.payments.checkout_url)?;

        if self.payments.merchant_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "payments.merchant_name must not be empty".to_string(),
            ));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Validation("database.url must not be empty".to_string()));
        }
        if self.polling.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "polling.max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn validate_base_url(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!("{key} must be an http(s) URL, got `{value}`")))
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }
    let default = PathBuf::from("shopwright.toml");
    default.exists().then_some(default)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    #[test]
    fn defaults_match_the_demo_topology() {
        let config = AppConfig::load(LoadOptions::default()).expect("defaults are valid");
        assert_eq!(config.polling.interval_secs, 5);
        assert_eq!(config.polling.max_attempts, 120);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn config_file_patch_is_applied() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[checkout]\nbase_url = \"http://worker:9001\"\n\n[polling]\nmax_attempts = 3\n"
        )
        .expect("write config");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            ..LoadOptions::default()
        })
        .expect("load patched config");

        assert_eq!(config.checkout.base_url, "http://worker:9001");
        assert_eq!(config.polling.max_attempts, 3);
        assert_eq!(config.polling.interval_secs, 5);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let error = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/shopwright.toml")),
            require_file: true,
            ..LoadOptions::default()
        })
        .expect_err("missing file must fail when required");

        assert!(matches!(error, ConfigError::MissingConfigFile(_)));
    }

    #[test]
    fn programmatic_overrides_win() {
        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                polling_interval_secs: Some(0),
                polling_max_attempts: Some(2),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("overrides are valid");

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.polling.interval_secs, 0);
        assert_eq!(config.polling.max_attempts, 2);
    }

    #[test]
    fn non_http_base_url_fails_validation() {
        let error = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                checkout_base_url: Some("worker:9001".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect_err("bare host must fail validation");

        assert!(matches!(error, ConfigError::Validation(_)));
        assert!(error.to_string().contains("checkout.base_url"));
    }

    #[test]
    fn zero_max_attempts_fails_validation() {
        let error = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                polling_max_attempts: Some(0),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect_err("zero attempts must fail validation");

        assert!(error.to_string().contains("polling.max_attempts"));
    }
}
