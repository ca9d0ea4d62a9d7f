use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::{RepositoryError, WalletRepository};

/// Process-local wallet used by tests and the offline demo path.
#[derive(Clone, Default)]
pub struct InMemoryWalletRepository {
    tokens: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryWalletRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl WalletRepository for InMemoryWalletRepository {
    async fn save(&self, user_id: &str, token: &str) -> Result<(), RepositoryError> {
        self.tokens.lock().await.insert(user_id.to_string(), token.to_string());
        Ok(())
    }

    async fn get(&self, user_id: &str) -> Result<Option<String>, RepositoryError> {
        Ok(self.tokens.lock().await.get(user_id).cloned())
    }

    async fn clear(&self, user_id: &str) -> Result<(), RepositoryError> {
        self.tokens.lock().await.remove(user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryWalletRepository;
    use crate::repositories::WalletRepository;

    #[tokio::test]
    async fn behaves_like_the_sql_wallet() {
        let repo = InMemoryWalletRepository::new();

        repo.save("user-1", "tok_1234567890").await.expect("save");
        assert_eq!(repo.get("user-1").await.expect("get"), Some("tok_1234567890".to_string()));

        repo.save("user-1", "tok_overwritten").await.expect("overwrite");
        assert_eq!(repo.get("user-1").await.expect("get"), Some("tok_overwritten".to_string()));

        repo.clear("user-1").await.expect("clear");
        assert_eq!(repo.get("user-1").await.expect("get"), None);
    }
}
