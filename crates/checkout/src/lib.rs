//! Checkout worker client and purchase orchestration.

pub mod client;
pub mod orchestrator;
pub mod progress;
pub mod types;

pub use client::{CatalogApi, HttpCatalogApi, HttpWorkerApi, TransportError, WorkerApi};
pub use orchestrator::{
    CheckoutOrchestrator, CheckoutReport, MerchantProfile, OrchestratorError, PollPolicy,
};
pub use progress::{InMemoryProgressSink, ProgressSink, ProgressUpdate, TracingProgressSink};
pub use types::{
    build_purchase_request, ConversationContext, ConversationMessage, OrderItem, PurchaseOutcome,
    PurchaseRequest, PurchaseStatus, PurchaseSubmission, StatusKind, StoreProduct,
};
