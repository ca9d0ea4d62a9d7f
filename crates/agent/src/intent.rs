//! Keyword routing from shopper text to assistant commands.

/// The commands the assistant can act on. Anything else stays `Unknown`
/// and gets a conversational fallback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShopperIntent {
    StartCheckout,
    ProvidePayment,
    ConfirmPurchase,
    Abandon,
    Unknown,
}

impl ShopperIntent {
    pub fn parse(text: &str) -> Self {
        let normalized = normalize(text);
        let has = |needles: &[&str]| needles.iter().any(|needle| normalized.contains(needle));

        if has(&["cancel", "never mind", "keep shopping", "abandon"]) {
            Self::Abandon
        } else if has(&["check out", "checkout", "buy it", "place my order", "purchase"])
            && !has(&["confirm", "yes"])
        {
            Self::StartCheckout
        } else if has(&["card", "payment detail", "pay with"]) {
            Self::ProvidePayment
        } else if has(&["confirm", "yes", "go ahead", "do it"]) {
            Self::ConfirmPurchase
        } else {
            Self::Unknown
        }
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
