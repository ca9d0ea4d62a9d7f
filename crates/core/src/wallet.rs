//! Validity rules for stored payment tokens.
//!
//! Tokens are opaque credential references issued by the payment SDK. Two
//! sentinel values circulate in the demo UI and must be treated as absent:
//! the empty string and the `token_placeholder` literal the UI seeds before
//! real collection has happened.

/// Sentinel the UI writes before a real token has been collected.
pub const TOKEN_PLACEHOLDER: &str = "token_placeholder";

/// Real SDK tokens are always at least this long; anything shorter is a
/// truncated or fabricated value.
pub const MIN_TOKEN_LEN: usize = 10;

pub fn is_valid_token(token: &str) -> bool {
    !token.is_empty() && token != TOKEN_PLACEHOLDER && token.len() >= MIN_TOKEN_LEN
}

/// Convenience for the common `Option<String>` shape coming out of the
/// wallet store.
pub fn has_valid_token(token: Option<&str>) -> bool {
    token.is_some_and(is_valid_token)
}
