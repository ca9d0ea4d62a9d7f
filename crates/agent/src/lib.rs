//! Shopping assistant runtime.
//!
//! This crate is the conversational layer over the checkout machinery:
//! - **Intent routing** (`intent`) maps free-form shopper text onto the
//!   small set of commands the assistant understands
//! - **Payment collection** (`collector`) is a pluggable seam for turning
//!   card details into a stored token
//! - **Gated commands** (`commands`) run the three stage-bound operations
//!   and phrase their outcomes for the chat surface
//!
//! The assistant never decides purchase outcomes itself. Stage rules live
//! in `shopwright-core` and the purchase loop in `shopwright-checkout`;
//! this crate only wires them to a conversation.

pub mod collector;
pub mod commands;
pub mod intent;

pub use collector::{DemoPaymentCollector, PaymentCollector};
pub use commands::{AssistantCommands, AssistantState};
pub use intent::ShopperIntent;
