//! Purchase orchestration: submit the cart to the checkout worker, poll
//! its record until a terminal status, and translate every outcome into a
//! report the assistant can speak.
//!
//! Every failure path leaves the shopper able to retry: the cart and the
//! stored payment token survive all failures and are cleared only after a
//! completed purchase. The session always ends back in the shopping stage
//! except when the precondition check routes to payment collection.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;
use tracing::{info, warn};

use shopwright_core::cart::Cart;
use shopwright_core::classify::{classify, classify_status_failure, ClassifiedError};
use shopwright_core::config::PollingConfig;
use shopwright_core::session::CheckoutSession;
use shopwright_core::stage::{
    CommandAvailability, Stage, StageContext, StageEvent, StageTransitionError,
};
use shopwright_core::wallet::has_valid_token;
use shopwright_db::repositories::{RepositoryError, WalletRepository};

use crate::client::WorkerApi;
use crate::progress::{ProgressSink, ProgressUpdate};
use crate::types::{
    build_purchase_request, ConversationContext, PurchaseOutcome, PurchaseRequest, StatusKind,
};

/// Polling cadence for the purchase record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self { interval: Duration::from_secs(5), max_attempts: 120 }
    }
}

impl PollPolicy {
    pub fn from_config(config: &PollingConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_secs),
            max_attempts: config.max_attempts,
        }
    }
}

/// Store identity baked into every submission.
#[derive(Clone, Debug)]
pub struct MerchantProfile {
    pub store_id: String,
    pub merchant_name: String,
    pub checkout_url: String,
}

/// Orchestrator-level faults. Worker failures never surface here; they are
/// classified into the returned report. Only wallet access and stage
/// bookkeeping can error.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("wallet access failed: {0}")]
    Wallet(#[from] RepositoryError),
    #[error(transparent)]
    Stage(#[from] StageTransitionError),
}

/// What the purchase attempt came to, phrased for the chat surface.
#[derive(Clone, Debug, PartialEq)]
pub enum CheckoutReport {
    /// The session is not in the purchase stage; nothing ran.
    Unavailable { current: Stage },
    /// Empty-cart guard fired before any network traffic.
    EmptyCart { reply: String },
    /// No usable token; the session moved back to payment collection.
    MissingPayment { reply: String },
    Failure { reply: String, error: ClassifiedError, progress_history: Vec<String> },
    Success { reply: String, purchase_id: String, outcome: PurchaseOutcome },
}

impl CheckoutReport {
    pub fn reply(&self) -> String {
        match self {
            Self::Unavailable { current } => format!(
                "I can only complete a purchase after checkout starts (currently {}).",
                current.as_str()
            ),
            Self::EmptyCart { reply }
            | Self::MissingPayment { reply }
            | Self::Failure { reply, .. }
            | Self::Success { reply, .. } => reply.clone(),
        }
    }
}

pub struct CheckoutOrchestrator {
    worker: Arc<dyn WorkerApi>,
    wallet: Arc<dyn WalletRepository>,
    progress: Arc<dyn ProgressSink>,
    policy: PollPolicy,
    merchant: MerchantProfile,
}

impl CheckoutOrchestrator {
    pub fn new(
        worker: Arc<dyn WorkerApi>,
        wallet: Arc<dyn WalletRepository>,
        progress: Arc<dyn ProgressSink>,
        policy: PollPolicy,
        merchant: MerchantProfile,
    ) -> Self {
        Self { worker, wallet, progress, policy, merchant }
    }

    /// Runs one purchase attempt end to end.
    ///
    /// Preconditions are checked in order before any network call: the
    /// session must be in the purchase stage, the cart must not be empty,
    /// and a valid payment token must exist for the user.
    pub async fn process_purchase(
        &self,
        session: &mut CheckoutSession,
        cart: &mut Cart,
        conversation: Option<&ConversationContext>,
    ) -> Result<CheckoutReport, OrchestratorError> {
        if let CommandAvailability::Unavailable { current, .. } =
            session.availability(Stage::CompletePurchase)
        {
            return Ok(CheckoutReport::Unavailable { current });
        }

        if cart.is_empty() {
            session.apply_event(StageEvent::CartAbandoned, StageContext::default())?;
            info!(
                event_name = "checkout.guard.empty_cart",
                user_id = %session.user_id,
                "purchase attempt with an empty cart"
            );
            return Ok(CheckoutReport::EmptyCart {
                reply: "Your cart is empty. Add something before checking out.".to_string(),
            });
        }

        let token = self.wallet.get(&session.user_id).await?;
        if !has_valid_token(token.as_deref()) {
            session.apply_event(StageEvent::PaymentMissing, StageContext::default())?;
            info!(
                event_name = "checkout.guard.missing_token",
                user_id = %session.user_id,
                "purchase attempt without a stored payment token"
            );
            return Ok(CheckoutReport::MissingPayment {
                reply: "Your payment information is missing. Let's set that up first."
                    .to_string(),
            });
        }
        let token = token.unwrap_or_default();

        let snapshot = cart.snapshot();
        let request = build_purchase_request(
            &session.user_id,
            &self.merchant.store_id,
            &self.merchant.merchant_name,
            &self.merchant.checkout_url,
            &token,
            &snapshot,
            conversation,
        );

        info!(
            event_name = "checkout.submit",
            session_id = %session.session_id,
            user_id = %session.user_id,
            item_count = request.item_count(),
            total = %request.total,
            "submitting purchase to the checkout worker"
        );

        let submission = match self.worker.submit_purchase(&request).await {
            Ok(submission) => submission,
            Err(err) => {
                return self.fail(session, classify(err.to_string()), Vec::new());
            }
        };

        info!(
            event_name = "checkout.submit.accepted",
            user_id = %session.user_id,
            purchase_id = %submission.purchase_id,
            status = submission.status.as_str(),
            "purchase accepted, polling for the outcome"
        );

        self.poll_until_settled(session, cart, &request, &submission.purchase_id).await
    }

    async fn poll_until_settled(
        &self,
        session: &mut CheckoutSession,
        cart: &mut Cart,
        request: &PurchaseRequest,
        purchase_id: &str,
    ) -> Result<CheckoutReport, OrchestratorError> {
        let mut history: Vec<String> = Vec::new();
        let mut last_surfaced: Option<String> = None;

        for attempt in 1..=self.policy.max_attempts {
            sleep(self.policy.interval).await;

            let status = match self.worker.purchase_status(purchase_id).await {
                Ok(status) => status,
                Err(err) => {
                    // A poll that cannot reach the worker is fatal for this
                    // attempt; the worker may still finish on its own.
                    return self.fail(session, classify(err.to_string()), history);
                }
            };

            if let Some(message) = status.message.as_deref().filter(|text| !text.is_empty()) {
                history.push(message.to_string());
                if last_surfaced.as_deref() != Some(message) {
                    self.progress.publish(ProgressUpdate {
                        purchase_id: purchase_id.to_string(),
                        attempt,
                        message: message.to_string(),
                    });
                    last_surfaced = Some(message.to_string());
                }
            }

            match status.status {
                StatusKind::Completed => {
                    return self.settle_success(session, cart, request, purchase_id, status.result, attempt).await;
                }
                StatusKind::Failed => {
                    let classified = classify_status_failure(
                        status.message.as_deref(),
                        status.error.as_deref(),
                    );
                    return self.fail(session, classified, history);
                }
                StatusKind::Pending | StatusKind::Processing => {}
            }
        }

        let classified = classify(format!(
            "Purchase status polling timeout after {} attempts",
            self.policy.max_attempts
        ));
        self.fail(session, classified, history)
    }

    async fn settle_success(
        &self,
        session: &mut CheckoutSession,
        cart: &mut Cart,
        request: &PurchaseRequest,
        purchase_id: &str,
        result: Option<PurchaseOutcome>,
        attempt: u32,
    ) -> Result<CheckoutReport, OrchestratorError> {
        let outcome = result.unwrap_or_else(|| PurchaseOutcome {
            success: true,
            message: None,
            store_order_id: None,
            payment_method: Some(request.payment_method.clone()),
            total_amount: Some(request.total),
            items_processed: Some(request.item_count()),
            checkout_method: Some("browser_automation".to_string()),
        });
        let order_id = outcome.store_order_id.clone().unwrap_or_else(|| purchase_id.to_string());
        let summary = cart.snapshot().item_summary();

        self.wallet.clear(&session.user_id).await?;
        cart.clear();
        session.clear_error();
        session.apply_event(StageEvent::PurchaseSettled, StageContext::default())?;

        info!(
            event_name = "checkout.settled",
            session_id = %session.session_id,
            user_id = %session.user_id,
            purchase_id = %purchase_id,
            order_id = %order_id,
            attempt,
            "purchase completed"
        );

        let reply = format!(
            "Purchase complete! Order {order_id} for {user}: {summary}, total ${total}. \
             Your cart has been cleared.",
            user = session.user_id,
            total = request.total,
        );

        Ok(CheckoutReport::Success {
            reply,
            purchase_id: purchase_id.to_string(),
            outcome,
        })
    }

    /// Records the classified failure, returns the session to shopping,
    /// and composes the report. Cart and token are deliberately left
    /// alone.
    fn fail(
        &self,
        session: &mut CheckoutSession,
        error: ClassifiedError,
        progress_history: Vec<String>,
    ) -> Result<CheckoutReport, OrchestratorError> {
        warn!(
            event_name = "checkout.failed",
            session_id = %session.session_id,
            user_id = %session.user_id,
            kind = error.kind.as_str(),
            message = %error.message,
            "purchase attempt failed"
        );

        session.record_error(error.clone());
        session.apply_event(StageEvent::PurchaseSettled, StageContext::default())?;

        let mut reply = String::new();
        if !progress_history.is_empty() {
            reply.push_str(&format!("Progress before failure: {}. ", progress_history.join(" / ")));
        }
        reply.push_str(&error.user_message());

        Ok(CheckoutReport::Failure { reply, error, progress_history })
    }
}
