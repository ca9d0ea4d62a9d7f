use std::env;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use shopwright_cli::commands::{config, demo, doctor, migrate};

#[test]
fn migrate_succeeds_against_an_in_memory_database() {
    with_env(&[("SHOPWRIGHT_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_reports_config_validation_failures() {
    with_env(&[("SHOPWRIGHT_POLL_MAX_ATTEMPTS", "0")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn doctor_passes_with_an_in_memory_database() {
    with_env(&[("SHOPWRIGHT_DATABASE_URL", "sqlite::memory:")], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 0, "expected passing doctor run");
        let payload = parse_payload(&result.output);

        assert_eq!(payload["overall_status"], "pass");
        let checks = payload["checks"].as_array().expect("checks array");
        let by_name = |name: &str| {
            checks
                .iter()
                .find(|check| check["name"] == name)
                .unwrap_or_else(|| panic!("missing check {name}"))
        };
        assert_eq!(by_name("config_validation")["status"], "pass");
        assert_eq!(by_name("payment_key_readiness")["status"], "skipped");
        assert_eq!(by_name("database_connectivity")["status"], "pass");
    });
}

#[test]
fn doctor_marks_payment_key_ready_when_configured() {
    with_env(
        &[
            ("SHOPWRIGHT_DATABASE_URL", "sqlite::memory:"),
            ("VAULTPAY_API_KEY", "vp_live_000111222333"),
        ],
        || {
            let result = doctor::run(true);
            let payload = parse_payload(&result.output);
            let checks = payload["checks"].as_array().expect("checks array");
            let key_check = checks
                .iter()
                .find(|check| check["name"] == "payment_key_readiness")
                .expect("payment key check");
            assert_eq!(key_check["status"], "pass");
        },
    );
}

#[test]
fn config_attributes_env_overrides() {
    with_env(&[("SHOPWRIGHT_DATABASE_URL", "sqlite::memory:")], || {
        let output = config::run();
        assert!(output.contains("database.url = sqlite::memory:"), "output: {output}");
        assert!(output.contains("[env:SHOPWRIGHT_DATABASE_URL]"), "output: {output}");
        assert!(output.contains("polling.max_attempts = 120  [default]"), "output: {output}");
    });
}

#[test]
fn demo_runs_the_scripted_conversation_to_completion() {
    with_env(&[], || {
        let result = demo::run();
        assert_eq!(result.exit_code, 0, "expected successful demo run");

        assert!(result.output.contains("Purchase complete"), "output: {}", result.output);
        assert!(result.output.contains("ord-demo-001"), "output: {}", result.output);
        assert!(
            result.output.contains("Filling payment details with VaultPay"),
            "output: {}",
            result.output
        );

        let payload = parse_payload(last_line(&result.output));
        assert_eq!(payload["command"], "demo");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn demo_is_deterministic_across_runs() {
    with_env(&[], || {
        let first = demo::run();
        let second = demo::run();
        assert_eq!(first.output, second.output);
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn last_line(output: &str) -> &str {
    output.lines().last().unwrap_or_default()
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "SHOPWRIGHT_DATABASE_URL",
        "SHOPWRIGHT_DATABASE_MAX_CONNECTIONS",
        "SHOPWRIGHT_CHECKOUT_BASE_URL",
        "SHOPWRIGHT_STORE_BASE_URL",
        "VAULTPAY_API_KEY",
        "SHOPWRIGHT_MERCHANT_NAME",
        "SHOPWRIGHT_CHECKOUT_URL",
        "SHOPWRIGHT_POLL_INTERVAL_SECS",
        "SHOPWRIGHT_POLL_MAX_ATTEMPTS",
        "SHOPWRIGHT_LOG_LEVEL",
        "SHOPWRIGHT_LOG_FORMAT",
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
