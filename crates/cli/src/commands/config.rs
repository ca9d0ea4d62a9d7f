use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use shopwright_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let file_path = detect_config_path();
    let file_doc = load_config_file_doc(file_path.as_deref());
    let source = |dotted: &str, env_key: &str| {
        field_source(dotted, env_key, file_doc.as_ref(), file_path.as_deref())
    };

    let api_key = config
        .payments
        .api_key
        .as_ref()
        .map(|secret| redact(secret.expose_secret()))
        .unwrap_or_else(|| "(unset, offline demo mode)".to_string());

    let fields: Vec<(&str, String, String)> = vec![
        ("database.url", config.database.url.clone(), source("database.url", "SHOPWRIGHT_DATABASE_URL")),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            source("database.max_connections", "SHOPWRIGHT_DATABASE_MAX_CONNECTIONS"),
        ),
        (
            "checkout.base_url",
            config.checkout.base_url.clone(),
            source("checkout.base_url", "SHOPWRIGHT_CHECKOUT_BASE_URL"),
        ),
        (
            "store.base_url",
            config.store.base_url.clone(),
            source("store.base_url", "SHOPWRIGHT_STORE_BASE_URL"),
        ),
        (
            "payments.merchant_name",
            config.payments.merchant_name.clone(),
            source("payments.merchant_name", "SHOPWRIGHT_MERCHANT_NAME"),
        ),
        (
            "payments.checkout_url",
            config.payments.checkout_url.clone(),
            source("payments.checkout_url", "SHOPWRIGHT_CHECKOUT_URL"),
        ),
        ("payments.api_key", api_key, source("payments.api_key", "VAULTPAY_API_KEY")),
        (
            "polling.interval_secs",
            config.polling.interval_secs.to_string(),
            source("polling.interval_secs", "SHOPWRIGHT_POLL_INTERVAL_SECS"),
        ),
        (
            "polling.max_attempts",
            config.polling.max_attempts.to_string(),
            source("polling.max_attempts", "SHOPWRIGHT_POLL_MAX_ATTEMPTS"),
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            source("logging.level", "SHOPWRIGHT_LOG_LEVEL"),
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format).to_lowercase(),
            source("logging.format", "SHOPWRIGHT_LOG_FORMAT"),
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, source) in fields {
        lines.push(format!("  {key} = {value}  [{source}]"));
    }
    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let path = PathBuf::from("shopwright.toml");
    path.exists().then_some(path)
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    dotted_key: &str,
    env_key: &str,
    file_doc: Option<&Value>,
    file_path: Option<&Path>,
) -> String {
    if env::var(env_key).map(|value| !value.trim().is_empty()).unwrap_or(false) {
        return format!("env:{env_key}");
    }

    if let (Some(doc), Some(path)) = (file_doc, file_path) {
        let mut cursor = Some(doc);
        for part in dotted_key.split('.') {
            cursor = cursor.and_then(|value| value.get(part));
        }
        if cursor.is_some() {
            return format!("file:{}", path.display());
        }
    }

    "default".to_string()
}

fn redact(token: &str) -> String {
    if token.chars().count() <= 4 {
        "****".to_string()
    } else {
        let prefix: String = token.chars().take(4).collect();
        format!("{prefix}****")
    }
}
