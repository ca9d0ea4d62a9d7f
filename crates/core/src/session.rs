use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classify::ClassifiedError;
use crate::stage::{
    CommandAvailability, Stage, StageContext, StageEngine, StageEvent, StageTransition,
    StageTransitionError,
};

/// Explicitly owned session state for one shopper.
///
/// The stage, last error, and session identity live here instead of in
/// ambient shared state; `apply_event` (via the engine) and `force_stage`
/// are the only stage mutators, and gated operations consult
/// [`CheckoutSession::availability`] before doing anything.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub session_id: String,
    pub user_id: String,
    stage: Stage,
    last_error: Option<ClassifiedError>,
}

impl CheckoutSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            stage: StageEngine::default().initial_stage(),
            last_error: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn last_error(&self) -> Option<&ClassifiedError> {
        self.last_error.as_ref()
    }

    /// Applies a business event through the stage engine and commits the
    /// resulting stage.
    pub fn apply_event(
        &mut self,
        event: StageEvent,
        context: StageContext,
    ) -> Result<StageTransition, StageTransitionError> {
        let transition = StageEngine::default().apply(&self.stage, &event, &context)?;
        self.stage = transition.to;
        Ok(transition)
    }

    /// Direct stage assignment for recovery paths where the engine has
    /// already been consulted (e.g. returning to shopping after a
    /// classified failure).
    pub fn force_stage(&mut self, stage: Stage) {
        self.stage = stage;
    }

    pub fn availability(&self, required: Stage) -> CommandAvailability {
        CommandAvailability::check(self.stage, required)
    }

    pub fn record_error(&mut self, error: ClassifiedError) {
        self.last_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }
}
