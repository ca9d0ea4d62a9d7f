//! Failure classification for the checkout path.
//!
//! Raw failures arrive in several shapes: transport errors from the HTTP
//! client, `detail` strings from a rejected submission, and `failed`
//! status payloads from the automation worker. They are all flattened to a
//! message string and classified by keyword inspection, in a fixed
//! priority order, so the assistant can show a tailored remediation hint.
//!
//! Every kind is currently recoverable: the cart and stored token survive
//! all failure paths, and the shopper decides whether to retry.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Network,
    Automation,
    Payment,
    Timeout,
    Unknown,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Automation => "automation",
            Self::Payment => "payment",
            Self::Timeout => "timeout",
            Self::Unknown => "unknown",
        }
    }

    /// Keyword inspection in priority order. Earlier rules win, so a
    /// message mentioning both "browser automation" and "payment" is an
    /// automation failure.
    fn from_message(lowered: &str) -> Self {
        const NETWORK: &[&str] = &["fetch", "network", "connection"];
        const AUTOMATION: &[&str] = &["automation", "browser"];
        const PAYMENT: &[&str] = &["payment", "vaultpay", "sdk"];

        if NETWORK.iter().any(|needle| lowered.contains(needle)) {
            Self::Network
        } else if AUTOMATION.iter().any(|needle| lowered.contains(needle)) {
            Self::Automation
        } else if PAYMENT.iter().any(|needle| lowered.contains(needle)) {
            Self::Payment
        } else if lowered.contains("timeout") {
            Self::Timeout
        } else {
            Self::Unknown
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedError {
    pub kind: FailureKind,
    pub message: String,
    pub details: Option<String>,
    pub recoverable: bool,
}

impl ClassifiedError {
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Remediation hint shown to the shopper alongside the raw message.
    pub fn remediation(&self) -> &'static str {
        match self.kind {
            FailureKind::Network => {
                "Cannot reach the checkout service. Make sure it is running, then restart it if needed."
            }
            FailureKind::Automation => {
                "The browser automation worker hit a problem. Check the worker logs and try again."
            }
            FailureKind::Payment => {
                "Payment could not be processed. Check your VaultPay SDK credentials and stored payment details."
            }
            FailureKind::Timeout => {
                "The checkout took too long to complete. The worker may still be running; try again shortly."
            }
            FailureKind::Unknown => {
                "Something went wrong during checkout. Your cart was preserved; please try again."
            }
        }
    }

    pub fn user_message(&self) -> String {
        format!("{} {}", self.message, self.remediation())
    }
}

pub fn classify(raw: impl AsRef<str>) -> ClassifiedError {
    let raw = raw.as_ref();
    let kind = FailureKind::from_message(&raw.to_lowercase());
    ClassifiedError { kind, message: raw.to_string(), details: None, recoverable: true }
}

/// Best-effort message extraction for status payloads that carry both an
/// advisory `message` and a raw `error` field, either of which may be
/// empty.
pub fn classify_status_failure(message: Option<&str>, error: Option<&str>) -> ClassifiedError {
    let picked = message
        .filter(|text| !text.is_empty())
        .or_else(|| error.filter(|text| !text.is_empty()))
        .unwrap_or("Checkout failed");

    let mut classified = classify(picked);
    if let Some(error) = error.filter(|text| !text.is_empty()) {
        if Some(error) != message {
            classified = classified.with_details(error);
        }
    }
    classified
}
