use chrono::Utc;
use sqlx::Row;

use super::{RepositoryError, WalletRepository};
use crate::DbPool;

pub struct SqlWalletRepository {
    pool: DbPool,
}

impl SqlWalletRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl WalletRepository for SqlWalletRepository {
    async fn save(&self, user_id: &str, token: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO payment_tokens (user_id, token, updated_at) \
             VALUES (?1, ?2, ?3) \
             ON CONFLICT(user_id) DO UPDATE SET token = ?2, updated_at = ?3",
        )
        .bind(user_id)
        .bind(token)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, user_id: &str) -> Result<Option<String>, RepositoryError> {
        let row = sqlx::query("SELECT token FROM payment_tokens WHERE user_id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.get::<String, _>("token")))
    }

    async fn clear(&self, user_id: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM payment_tokens WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SqlWalletRepository;
    use crate::repositories::WalletRepository;
    use crate::{connect_with_settings, migrations};

    async fn repository() -> SqlWalletRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        SqlWalletRepository::new(pool)
    }

    #[tokio::test]
    async fn save_get_clear_round_trip() {
        let repo = repository().await;

        repo.save("user-1", "tok_1234567890").await.expect("save");
        assert_eq!(repo.get("user-1").await.expect("get"), Some("tok_1234567890".to_string()));

        repo.clear("user-1").await.expect("clear");
        assert_eq!(repo.get("user-1").await.expect("get after clear"), None);
    }

    #[tokio::test]
    async fn save_overwrites_the_previous_token() {
        let repo = repository().await;

        repo.save("user-1", "tok_first_0001").await.expect("first save");
        repo.save("user-1", "tok_second_0002").await.expect("second save");

        assert_eq!(repo.get("user-1").await.expect("get"), Some("tok_second_0002".to_string()));
    }

    #[tokio::test]
    async fn token_slots_are_scoped_per_user() {
        let repo = repository().await;

        repo.save("user-1", "tok_for_user_one").await.expect("save user-1");
        repo.save("user-2", "tok_for_user_two").await.expect("save user-2");
        repo.clear("user-1").await.expect("clear user-1");

        assert_eq!(repo.get("user-1").await.expect("user-1"), None);
        assert_eq!(repo.get("user-2").await.expect("user-2"), Some("tok_for_user_two".to_string()));
    }

    #[tokio::test]
    async fn clear_without_a_stored_token_is_a_no_op() {
        let repo = repository().await;
        repo.clear("user-unknown").await.expect("clear on empty slot");
        assert_eq!(repo.get("user-unknown").await.expect("get"), None);
    }
}
