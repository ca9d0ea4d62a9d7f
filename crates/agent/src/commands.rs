//! The three stage-gated assistant commands.
//!
//! Each command checks the session's stage first and answers with a
//! harmless explanation when it is not its turn, leaving all state
//! untouched. Stage changes only ever go through the session's event
//! application.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use shopwright_checkout::orchestrator::CheckoutOrchestrator;
use shopwright_checkout::types::ConversationContext;
use shopwright_core::cart::Cart;
use shopwright_core::session::CheckoutSession;
use shopwright_core::stage::{
    CommandAvailability, Stage, StageAction, StageContext, StageEvent,
};
use shopwright_core::wallet::{has_valid_token, is_valid_token};
use shopwright_db::repositories::WalletRepository;

use crate::collector::PaymentCollector;

/// Everything the assistant tracks for one shopper.
pub struct AssistantState {
    pub session: CheckoutSession,
    pub cart: Cart,
    pub conversation: ConversationContext,
}

impl AssistantState {
    pub fn new(user_id: impl Into<String>) -> Self {
        let session = CheckoutSession::new(user_id);
        let conversation = ConversationContext {
            session_id: session.session_id.clone(),
            intent: None,
            messages: Vec::new(),
        };
        Self { session, cart: Cart::new(), conversation }
    }

    pub fn record_user(&mut self, text: impl Into<String>) {
        self.conversation.push("user", text);
    }

    pub fn record_assistant(&mut self, text: impl Into<String>) {
        self.conversation.push("assistant", text);
    }
}

pub struct AssistantCommands {
    wallet: Arc<dyn WalletRepository>,
    collector: Arc<dyn PaymentCollector>,
    orchestrator: CheckoutOrchestrator,
}

impl AssistantCommands {
    pub fn new(
        wallet: Arc<dyn WalletRepository>,
        collector: Arc<dyn PaymentCollector>,
        orchestrator: CheckoutOrchestrator,
    ) -> Self {
        Self { wallet, collector, orchestrator }
    }

    /// Entry point of the checkout flow. Routes to payment collection or
    /// straight to the purchase stage depending on whether a valid token
    /// is already stored.
    pub async fn start_checkout(&self, state: &mut AssistantState) -> Result<String> {
        match state.session.stage() {
            Stage::CompletePurchase => Ok(
                "I'm already completing your purchase. Say \"confirm\" if you haven't yet."
                    .to_string(),
            ),
            Stage::CollectPayment => {
                // Re-asking to check out mid-collection is a no-op.
                state
                    .session
                    .apply_event(StageEvent::CheckoutRequested, StageContext::default())?;
                Ok("I still need your payment details to finish checking out.".to_string())
            }
            Stage::Shopping => {
                if state.cart.is_empty() {
                    return Ok(
                        "Your cart is empty. Add something before checking out.".to_string()
                    );
                }

                let token = self.wallet.get(&state.session.user_id).await?;
                let context = StageContext { has_valid_token: has_valid_token(token.as_deref()) };
                let transition =
                    state.session.apply_event(StageEvent::CheckoutRequested, context)?;

                info!(
                    event_name = "assistant.checkout_started",
                    user_id = %state.session.user_id,
                    to_stage = transition.to.as_str(),
                    "checkout started"
                );

                if transition.actions.contains(&StageAction::BeginPurchase) {
                    Ok("You have payment details on file. Say \"confirm\" and I'll complete \
                        the purchase."
                        .to_string())
                } else {
                    Ok("Happy to check you out! First I need your payment details.".to_string())
                }
            }
        }
    }

    /// Collects and stores a payment token. Idempotent: a valid stored
    /// token is reused without prompting the shopper again.
    pub async fn collect_payment(&self, state: &mut AssistantState) -> Result<String> {
        if let CommandAvailability::Unavailable { current, .. } =
            state.session.availability(Stage::CollectPayment)
        {
            return Ok(format!(
                "There are no payment details to collect right now (currently {}).",
                current.as_str()
            ));
        }

        let user_id = state.session.user_id.clone();
        let existing = self.wallet.get(&user_id).await?;
        if has_valid_token(existing.as_deref()) {
            state.session.apply_event(StageEvent::PaymentCollected, StageContext::default())?;
            return Ok(
                "You already have payment details saved. Completing your purchase with those."
                    .to_string(),
            );
        }

        let token = self.collector.collect(&user_id).await?;
        if !is_valid_token(&token) {
            return Ok(
                "Those payment details didn't go through. Let's try entering them again."
                    .to_string(),
            );
        }

        self.wallet.save(&user_id, &token).await?;
        state.session.apply_event(StageEvent::PaymentCollected, StageContext::default())?;

        info!(
            event_name = "assistant.payment_collected",
            user_id = %user_id,
            "payment token stored"
        );

        Ok("Payment details saved securely. Completing your purchase now.".to_string())
    }

    /// Explicit "start over": empties the cart, forgets the stored token,
    /// and returns to shopping from any mid-checkout stage.
    pub async fn reset_cart(&self, state: &mut AssistantState) -> Result<String> {
        state.cart.clear();
        self.wallet.clear(&state.session.user_id).await?;
        state.session.clear_error();
        if state.session.stage() != Stage::Shopping {
            state.session.apply_event(StageEvent::CartAbandoned, StageContext::default())?;
        }

        info!(
            event_name = "assistant.cart_reset",
            user_id = %state.session.user_id,
            "cart and stored payment token cleared"
        );

        Ok("Cart cleared and payment details forgotten. Happy to keep shopping!".to_string())
    }

    /// Runs the purchase end to end and phrases the outcome.
    pub async fn process_purchase(&self, state: &mut AssistantState) -> Result<String> {
        let report = self
            .orchestrator
            .process_purchase(&mut state.session, &mut state.cart, Some(&state.conversation))
            .await?;
        Ok(report.reply())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::Result;
    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use shopwright_checkout::client::{TransportError, WorkerApi};
    use shopwright_checkout::orchestrator::{CheckoutOrchestrator, MerchantProfile, PollPolicy};
    use shopwright_checkout::progress::InMemoryProgressSink;
    use shopwright_checkout::types::{
        PurchaseRequest, PurchaseStatus, PurchaseSubmission, StatusKind,
    };
    use shopwright_core::cart::{CartItem, ProductId};
    use shopwright_core::stage::Stage;
    use shopwright_db::repositories::{InMemoryWalletRepository, WalletRepository};

    use crate::collector::PaymentCollector;

    use super::{AssistantCommands, AssistantState};

    /// Worker double that accepts every submission and reports completion
    /// on the first poll.
    struct InstantWorker;

    #[async_trait]
    impl WorkerApi for InstantWorker {
        async fn submit_purchase(
            &self,
            _request: &PurchaseRequest,
        ) -> Result<PurchaseSubmission, TransportError> {
            Ok(PurchaseSubmission {
                purchase_id: "purchase-1".to_string(),
                status: StatusKind::Pending,
                message: None,
            })
        }

        async fn purchase_status(
            &self,
            purchase_id: &str,
        ) -> Result<PurchaseStatus, TransportError> {
            Ok(PurchaseStatus {
                purchase_id: purchase_id.to_string(),
                status: StatusKind::Completed,
                message: Some("Purchase successful".to_string()),
                created_at: None,
                updated_at: None,
                result: None,
                error: None,
            })
        }
    }

    struct CountingCollector {
        token: String,
        calls: AtomicU32,
    }

    #[async_trait]
    impl PaymentCollector for CountingCollector {
        async fn collect(&self, _user_id: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.token.clone())
        }
    }

    fn commands(
        wallet: InMemoryWalletRepository,
        collector: Arc<CountingCollector>,
    ) -> AssistantCommands {
        let orchestrator = CheckoutOrchestrator::new(
            Arc::new(InstantWorker),
            Arc::new(wallet.clone()),
            Arc::new(InMemoryProgressSink::new()),
            PollPolicy { interval: Duration::ZERO, max_attempts: 5 },
            MerchantProfile {
                store_id: "demo-store".to_string(),
                merchant_name: "Shopwright Demo Store".to_string(),
                checkout_url: "http://localhost:5173/checkout".to_string(),
            },
        );
        AssistantCommands::new(Arc::new(wallet), collector, orchestrator)
    }

    fn collector(token: &str) -> Arc<CountingCollector> {
        Arc::new(CountingCollector { token: token.to_string(), calls: AtomicU32::new(0) })
    }

    fn state_with_cart() -> AssistantState {
        let mut state = AssistantState::new("user-1");
        state.cart.add(CartItem {
            product_id: ProductId("sku-1".to_string()),
            name: "Canvas Tote".to_string(),
            unit_price: Decimal::new(2_499, 2),
            quantity: 1,
        });
        state
    }

    #[tokio::test]
    async fn start_checkout_without_token_prompts_for_payment() {
        let cmds = commands(InMemoryWalletRepository::new(), collector("tok_demo_4242424242"));
        let mut state = state_with_cart();

        let reply = cmds.start_checkout(&mut state).await.expect("start checkout");

        assert!(reply.contains("payment details"));
        assert_eq!(state.session.stage(), Stage::CollectPayment);
    }

    #[tokio::test]
    async fn start_checkout_with_stored_token_skips_collection() {
        let wallet = InMemoryWalletRepository::new();
        wallet.save("user-1", "tok_1234567890").await.expect("seed token");
        let cmds = commands(wallet, collector("tok_demo_4242424242"));
        let mut state = state_with_cart();

        let reply = cmds.start_checkout(&mut state).await.expect("start checkout");

        assert!(reply.contains("on file"));
        assert_eq!(state.session.stage(), Stage::CompletePurchase);
    }

    #[tokio::test]
    async fn start_checkout_with_empty_cart_stays_in_shopping() {
        let cmds = commands(InMemoryWalletRepository::new(), collector("tok_demo_4242424242"));
        let mut state = AssistantState::new("user-1");

        let reply = cmds.start_checkout(&mut state).await.expect("start checkout");

        assert!(reply.contains("cart is empty"));
        assert_eq!(state.session.stage(), Stage::Shopping);
    }

    #[tokio::test]
    async fn collect_payment_outside_its_stage_is_a_no_op() {
        let wallet = InMemoryWalletRepository::new();
        let counting = collector("tok_demo_4242424242");
        let cmds = commands(wallet.clone(), counting.clone());
        let mut state = state_with_cart();

        let reply = cmds.collect_payment(&mut state).await.expect("collect payment");

        assert!(reply.contains("right now"));
        assert_eq!(state.session.stage(), Stage::Shopping);
        assert_eq!(counting.calls.load(Ordering::SeqCst), 0);
        assert_eq!(wallet.get("user-1").await.expect("wallet"), None);
    }

    #[tokio::test]
    async fn collect_payment_reuses_an_existing_valid_token() {
        let wallet = InMemoryWalletRepository::new();
        wallet.save("user-1", "tok_1234567890").await.expect("seed token");
        let counting = collector("tok_demo_4242424242");
        let cmds = commands(wallet.clone(), counting.clone());

        let mut state = state_with_cart();
        state.session.force_stage(Stage::CollectPayment);

        let reply = cmds.collect_payment(&mut state).await.expect("collect payment");

        assert!(reply.contains("already have payment details"));
        assert_eq!(counting.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            wallet.get("user-1").await.expect("wallet"),
            Some("tok_1234567890".to_string())
        );
        assert_eq!(state.session.stage(), Stage::CompletePurchase);
    }

    #[tokio::test]
    async fn collect_payment_stores_a_new_token_and_advances() {
        let wallet = InMemoryWalletRepository::new();
        let counting = collector("tok_fresh_9876543210");
        let cmds = commands(wallet.clone(), counting.clone());

        let mut state = state_with_cart();
        state.session.force_stage(Stage::CollectPayment);

        let reply = cmds.collect_payment(&mut state).await.expect("collect payment");

        assert!(reply.contains("saved securely"));
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            wallet.get("user-1").await.expect("wallet"),
            Some("tok_fresh_9876543210".to_string())
        );
        assert_eq!(state.session.stage(), Stage::CompletePurchase);
    }

    #[tokio::test]
    async fn collect_payment_rejects_a_placeholder_token() {
        let wallet = InMemoryWalletRepository::new();
        let counting = collector("token_placeholder");
        let cmds = commands(wallet.clone(), counting.clone());

        let mut state = state_with_cart();
        state.session.force_stage(Stage::CollectPayment);

        let reply = cmds.collect_payment(&mut state).await.expect("collect payment");

        assert!(reply.contains("didn't go through"));
        assert_eq!(wallet.get("user-1").await.expect("wallet"), None);
        assert_eq!(state.session.stage(), Stage::CollectPayment);
    }

    #[tokio::test]
    async fn reset_cart_clears_cart_and_token_from_any_stage() {
        let wallet = InMemoryWalletRepository::new();
        wallet.save("user-1", "tok_1234567890").await.expect("seed token");
        let cmds = commands(wallet.clone(), collector("tok_demo_4242424242"));

        let mut state = state_with_cart();
        state.session.force_stage(Stage::CollectPayment);

        let reply = cmds.reset_cart(&mut state).await.expect("reset cart");

        assert!(reply.contains("Cart cleared"));
        assert!(state.cart.is_empty());
        assert_eq!(wallet.get("user-1").await.expect("wallet"), None);
        assert_eq!(state.session.stage(), Stage::Shopping);
    }

    #[tokio::test]
    async fn full_conversation_completes_a_purchase() {
        let wallet = InMemoryWalletRepository::new();
        let cmds = commands(wallet.clone(), collector("tok_demo_4242424242"));
        let mut state = state_with_cart();
        state.record_user("buy me a tote");

        cmds.start_checkout(&mut state).await.expect("start checkout");
        cmds.collect_payment(&mut state).await.expect("collect payment");
        let reply = cmds.process_purchase(&mut state).await.expect("process purchase");

        assert!(reply.contains("Purchase complete"), "reply: {reply}");
        assert!(state.cart.is_empty());
        assert_eq!(state.session.stage(), Stage::Shopping);
        assert_eq!(wallet.get("user-1").await.expect("wallet"), None);
    }
}
