use anyhow::Result;
use async_trait::async_trait;

/// Turns a shopper's card details into a vault token.
///
/// The real collection UI lives outside this process (the VaultPay SDK
/// renders its own form); the assistant only needs the resulting token.
#[async_trait]
pub trait PaymentCollector: Send + Sync {
    async fn collect(&self, user_id: &str) -> Result<String>;
}

/// Offline collector used by the demo and tests: hands back a fixed,
/// well-formed token without talking to any payment service.
#[derive(Clone, Debug)]
pub struct DemoPaymentCollector {
    token: String,
}

impl DemoPaymentCollector {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl Default for DemoPaymentCollector {
    fn default() -> Self {
        Self::new("tok_demo_4242424242")
    }
}

#[async_trait]
impl PaymentCollector for DemoPaymentCollector {
    async fn collect(&self, _user_id: &str) -> Result<String> {
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use shopwright_core::wallet::is_valid_token;

    use super::{DemoPaymentCollector, PaymentCollector};

    #[tokio::test]
    async fn demo_collector_issues_a_well_formed_token() {
        let collector = DemoPaymentCollector::default();
        let token = collector.collect("user-1").await.expect("collect");
        assert!(is_valid_token(&token));
    }
}
