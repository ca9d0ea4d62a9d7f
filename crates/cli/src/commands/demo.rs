//! Offline, deterministic run of the whole checkout conversation.
//!
//! No network and no real database: the worker is a scripted double, the
//! wallet lives in memory, and the payment collector hands out the demo
//! token. Useful as a smoke test and as a readable transcript of the flow.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use shopwright_agent::collector::DemoPaymentCollector;
use shopwright_agent::commands::{AssistantCommands, AssistantState};
use shopwright_agent::intent::ShopperIntent;
use shopwright_checkout::client::{TransportError, WorkerApi};
use shopwright_checkout::orchestrator::{CheckoutOrchestrator, MerchantProfile, PollPolicy};
use shopwright_checkout::progress::InMemoryProgressSink;
use shopwright_checkout::types::{
    PurchaseOutcome, PurchaseRequest, PurchaseStatus, PurchaseSubmission, StatusKind,
};
use shopwright_core::cart::{CartItem, ProductId};
use shopwright_db::repositories::InMemoryWalletRepository;

use crate::commands::{async_runtime, CommandResult};

/// Worker double that walks one purchase through two progress updates and
/// a completed record derived from the submitted request.
#[derive(Default)]
struct ScriptedDemoWorker {
    submitted: Mutex<Option<PurchaseRequest>>,
    polls: AtomicU32,
}

#[async_trait]
impl WorkerApi for ScriptedDemoWorker {
    async fn submit_purchase(
        &self,
        request: &PurchaseRequest,
    ) -> Result<PurchaseSubmission, TransportError> {
        match self.submitted.lock() {
            Ok(mut slot) => *slot = Some(request.clone()),
            Err(poisoned) => *poisoned.into_inner() = Some(request.clone()),
        }
        Ok(PurchaseSubmission {
            purchase_id: "demo-purchase-001".to_string(),
            status: StatusKind::Pending,
            message: Some("Purchase initiated".to_string()),
        })
    }

    async fn purchase_status(&self, purchase_id: &str) -> Result<PurchaseStatus, TransportError> {
        let poll = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        let request = match self.submitted.lock() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };

        let mut status = PurchaseStatus {
            purchase_id: purchase_id.to_string(),
            status: StatusKind::Processing,
            message: None,
            created_at: None,
            updated_at: None,
            result: None,
            error: None,
        };

        match poll {
            1 => status.message = Some("Opening the store checkout page".to_string()),
            2 => status.message = Some("Filling payment details with VaultPay".to_string()),
            _ => {
                status.status = StatusKind::Completed;
                status.message = Some("Purchase successful".to_string());
                status.result = Some(PurchaseOutcome {
                    success: true,
                    message: Some("Purchase successful".to_string()),
                    store_order_id: Some("ord-demo-001".to_string()),
                    payment_method: request.as_ref().map(|r| r.payment_method.clone()),
                    total_amount: request.as_ref().map(|r| r.total),
                    items_processed: request.as_ref().map(PurchaseRequest::item_count),
                    checkout_method: Some("browser_automation".to_string()),
                });
            }
        }

        Ok(status)
    }
}

pub fn run() -> CommandResult {
    let runtime = match async_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "demo",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    match runtime.block_on(run_conversation()) {
        Ok(transcript) => {
            let summary = CommandResult::success("demo", "scripted checkout completed");
            CommandResult {
                exit_code: 0,
                output: format!("{}\n{}", transcript.join("\n"), summary.output),
            }
        }
        Err(error) => CommandResult::failure("demo", "conversation", error.to_string(), 7),
    }
}

async fn run_conversation() -> anyhow::Result<Vec<String>> {
    let wallet = InMemoryWalletRepository::new();
    let sink = InMemoryProgressSink::new();
    let orchestrator = CheckoutOrchestrator::new(
        Arc::new(ScriptedDemoWorker::default()),
        Arc::new(wallet.clone()),
        Arc::new(sink.clone()),
        PollPolicy { interval: Duration::ZERO, max_attempts: 10 },
        MerchantProfile {
            store_id: "demo-store".to_string(),
            merchant_name: "Shopwright Demo Store".to_string(),
            checkout_url: "http://localhost:5173/checkout".to_string(),
        },
    );
    let assistant = AssistantCommands::new(
        Arc::new(wallet),
        Arc::new(DemoPaymentCollector::default()),
        orchestrator,
    );

    let mut state = AssistantState::new("demo-shopper");
    state.cart.add(CartItem {
        product_id: ProductId("sku-tote".to_string()),
        name: "Canvas Tote".to_string(),
        unit_price: Decimal::new(2_499, 2),
        quantity: 2,
    });
    state.cart.add(CartItem {
        product_id: ProductId("sku-mug".to_string()),
        name: "Enamel Mug".to_string(),
        unit_price: Decimal::new(1_250, 2),
        quantity: 1,
    });

    let mut transcript =
        vec!["demo transcript (offline worker, in-memory wallet):".to_string()];

    let turns =
        ["I'd like to check out now.", "Here are my card details.", "Yes, go ahead."];
    for user in turns {
        state.record_user(user);
        let reply = match ShopperIntent::parse(user) {
            ShopperIntent::StartCheckout => assistant.start_checkout(&mut state).await?,
            ShopperIntent::ProvidePayment => assistant.collect_payment(&mut state).await?,
            ShopperIntent::ConfirmPurchase => assistant.process_purchase(&mut state).await?,
            ShopperIntent::Abandon => assistant.reset_cart(&mut state).await?,
            ShopperIntent::Unknown => {
                "I can add items to your cart, check you out, or start over.".to_string()
            }
        };
        transcript.push(format!("shopper>   {user}"));
        transcript.push(format!("assistant> {reply}"));
        state.record_assistant(reply.as_str());
    }

    for update in sink.updates() {
        transcript.push(format!("progress>  [{}] {}", update.attempt, update.message));
    }

    Ok(transcript)
}
