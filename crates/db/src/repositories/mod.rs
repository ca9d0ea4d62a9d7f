use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod wallet;

pub use memory::InMemoryWalletRepository;
pub use wallet::SqlWalletRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Durable per-user wallet slot: at most one payment token per user id.
///
/// `save` overwrites any prior token; `clear` is idempotent. Token
/// validity is not checked here. That rule lives in
/// `shopwright_core::wallet` and is applied by callers.
#[async_trait]
pub trait WalletRepository: Send + Sync {
    async fn save(&self, user_id: &str, token: &str) -> Result<(), RepositoryError>;
    async fn get(&self, user_id: &str) -> Result<Option<String>, RepositoryError>;
    async fn clear(&self, user_id: &str) -> Result<(), RepositoryError>;
}
