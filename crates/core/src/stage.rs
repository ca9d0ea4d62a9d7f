use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The single active phase of a checkout session.
///
/// Serialized names match the wire values the chat UI exchanges with the
/// assistant (`shopping`, `collectPayment`, `completePurchase`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Shopping,
    CollectPayment,
    CompletePurchase,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shopping => "shopping",
            Self::CollectPayment => "collectPayment",
            Self::CompletePurchase => "completePurchase",
        }
    }
}

/// Business events that drive stage transitions. Components never set a
/// stage directly; they apply one of these through the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageEvent {
    /// The shopper asked to check out. Routing depends on token validity
    /// carried in [`StageContext`].
    CheckoutRequested,
    /// Payment collection produced a stored token.
    PaymentCollected,
    /// The purchase precondition check found no usable token.
    PaymentMissing,
    /// The purchase reached a terminal outcome, success or failure.
    PurchaseSettled,
    /// Empty-cart guard fired or the shopper chose to keep shopping.
    CartAbandoned,
}

/// Facts the transition table consults but does not own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct StageContext {
    pub has_valid_token: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageAction {
    PromptPaymentDetails,
    BeginPurchase,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTransition {
    pub from: Stage,
    pub to: Stage,
    pub event: StageEvent,
    pub actions: Vec<StageAction>,
}

impl StageTransition {
    /// An idempotent transition leaves the session where it already is.
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StageTransitionError {
    #[error("invalid transition from {stage:?} using event {event:?}")]
    InvalidTransition { stage: Stage, event: StageEvent },
}

pub trait StageFlow {
    fn initial_stage(&self) -> Stage;
    fn transition(
        &self,
        current: &Stage,
        event: &StageEvent,
        context: &StageContext,
    ) -> Result<StageTransition, StageTransitionError>;
}

/// The demo's single checkout flow: shopping, collect payment, complete
/// purchase, back to shopping.
#[derive(Clone, Debug, Default)]
pub struct CheckoutFlow;

impl StageFlow for CheckoutFlow {
    fn initial_stage(&self) -> Stage {
        Stage::Shopping
    }

    fn transition(
        &self,
        current: &Stage,
        event: &StageEvent,
        context: &StageContext,
    ) -> Result<StageTransition, StageTransitionError> {
        transition_checkout(current, event, context)
    }
}

pub struct StageEngine<F = CheckoutFlow> {
    flow: F,
}

impl<F> StageEngine<F>
where
    F: StageFlow,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_stage(&self) -> Stage {
        self.flow.initial_stage()
    }

    pub fn apply(
        &self,
        current: &Stage,
        event: &StageEvent,
        context: &StageContext,
    ) -> Result<StageTransition, StageTransitionError> {
        self.flow.transition(current, event, context)
    }
}

impl Default for StageEngine<CheckoutFlow> {
    fn default() -> Self {
        Self::new(CheckoutFlow)
    }
}

fn transition_checkout(
    current: &Stage,
    event: &StageEvent,
    context: &StageContext,
) -> Result<StageTransition, StageTransitionError> {
    use Stage::{CollectPayment, CompletePurchase, Shopping};
    use StageAction::{BeginPurchase, PromptPaymentDetails};
    use StageEvent::{
        CartAbandoned, CheckoutRequested, PaymentCollected, PaymentMissing, PurchaseSettled,
    };

    let (to, actions) = match (current, event) {
        (Shopping, CheckoutRequested) => {
            if context.has_valid_token {
                (CompletePurchase, vec![BeginPurchase])
            } else {
                (CollectPayment, vec![PromptPaymentDetails])
            }
        }
        // Asking to check out again while collection is pending is an
        // idempotent no-op; collection returns any existing token.
        (CollectPayment, CheckoutRequested) => (CollectPayment, Vec::new()),
        (CollectPayment, PaymentCollected) => (CompletePurchase, vec![BeginPurchase]),
        // The stored token can disappear or fail validation between the
        // checkout request and the purchase attempt.
        (CompletePurchase, PaymentMissing) => (CollectPayment, vec![PromptPaymentDetails]),
        (CompletePurchase, PurchaseSettled) | (CompletePurchase, CartAbandoned) => {
            (Shopping, Vec::new())
        }
        // Backing out of payment collection abandons the checkout too.
        (CollectPayment, CartAbandoned) => (Shopping, Vec::new()),
        _ => {
            return Err(StageTransitionError::InvalidTransition {
                stage: *current,
                event: event.clone(),
            });
        }
    };

    Ok(StageTransition { from: *current, to, event: event.clone(), actions })
}

/// Result of the per-operation entry guard: gated operations check the
/// active stage and refuse to run, side-effect free, when it does not
/// match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandAvailability {
    Available,
    Unavailable { current: Stage, required: Stage },
}

impl CommandAvailability {
    pub fn check(current: Stage, required: Stage) -> Self {
        if current == required {
            Self::Available
        } else {
            Self::Unavailable { current, required }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}
