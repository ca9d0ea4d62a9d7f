pub mod cart;
pub mod classify;
pub mod config;
pub mod session;
pub mod stage;
pub mod wallet;

pub use cart::{Cart, CartItem, CartSnapshot, ProductId};
pub use classify::{classify, classify_status_failure, ClassifiedError, FailureKind};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, PollingConfig};
pub use session::CheckoutSession;
pub use stage::{
    CheckoutFlow, CommandAvailability, Stage, StageAction, StageContext, StageEngine, StageEvent,
    StageFlow, StageTransition, StageTransitionError,
};
pub use wallet::{has_valid_token, is_valid_token, MIN_TOKEN_LEN, TOKEN_PLACEHOLDER};
