//! SQLite-backed bearer token store.
//!
//! Tokens are opaque strings minted at login. Only the lowercase hex
//! SHA-256 hash is stored; a leaked database does not leak usable
//! credentials. There is no offline expiry, tokens live until the user
//! row is deleted.

use clarimed_types::error::RepositoryError;
use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::Row;
use tracing::warn;
use uuid::Uuid;

use super::pool::DatabasePool;

/// Prefix on every minted token, useful for secret scanners.
pub const TOKEN_PREFIX: &str = "clm_";

/// Lowercase hex SHA-256 of a presented token.
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest)
}

fn generate_token() -> String {
    // 64 hex chars; each v7 value carries 74 random bits.
    let a = Uuid::now_v7().simple();
    let b = Uuid::now_v7().simple();
    format!("{TOKEN_PREFIX}{a}{b}")
}

/// SQLite-backed store for login tokens.
pub struct SqliteTokenStore {
    pool: DatabasePool,
}

impl SqliteTokenStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Mint a fresh token for a user and return the plaintext once.
    pub async fn mint(&self, user_id: &Uuid) -> Result<String, RepositoryError> {
        let token = generate_token();
        sqlx::query(
            "INSERT INTO auth_tokens (id, user_id, token_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(Uuid::now_v7().to_string())
        .bind(user_id.to_string())
        .bind(hash_token(&token))
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(token)
    }

    /// Resolve a presented token to its user id.
    ///
    /// Refreshes `last_used_at` on a hit; that write is best-effort and
    /// never fails the lookup.
    pub async fn resolve(&self, token: &str) -> Result<Option<Uuid>, RepositoryError> {
        let token_hash = hash_token(token);
        let row = sqlx::query("SELECT user_id FROM auth_tokens WHERE token_hash = ?")
            .bind(&token_hash)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let user_id: String = row
            .try_get("user_id")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        let user_id = Uuid::parse_str(&user_id)
            .map_err(|e| RepositoryError::Query(format!("invalid user_id: {e}")))?;

        if let Err(e) = sqlx::query("UPDATE auth_tokens SET last_used_at = ? WHERE token_hash = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(&token_hash)
            .execute(&self.pool.writer)
            .await
        {
            warn!(error = %e, "Failed to refresh token last_used_at");
        }

        Ok(Some(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::DatabasePool;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    async fn seed_user(pool: &DatabasePool) -> Uuid {
        let user_id = Uuid::now_v7();
        sqlx::query(
            r#"INSERT INTO users (id, external_id, display_name, email, plan, created_at, last_active_at)
               VALUES (?, ?, 'Test', 'test@example.com', 'free', ?, ?)"#,
        )
        .bind(user_id.to_string())
        .bind(format!("ext-{user_id}"))
        .bind(Utc::now().to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(&pool.writer)
        .await
        .unwrap();
        user_id
    }

    #[test]
    fn test_token_shape() {
        let token = generate_token();
        assert!(token.starts_with(TOKEN_PREFIX));
        assert_eq!(token.len(), TOKEN_PREFIX.len() + 64);
        assert!(token[TOKEN_PREFIX.len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_token_known_value() {
        // SHA-256 of empty string
        assert_eq!(
            hash_token(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn test_mint_and_resolve() {
        let pool = test_pool().await;
        let store = SqliteTokenStore::new(pool.clone());
        let user_id = seed_user(&pool).await;

        let token = store.mint(&user_id).await.unwrap();
        let resolved = store.resolve(&token).await.unwrap();
        assert_eq!(resolved, Some(user_id));
    }

    #[tokio::test]
    async fn test_plaintext_token_never_stored() {
        let pool = test_pool().await;
        let store = SqliteTokenStore::new(pool.clone());
        let user_id = seed_user(&pool).await;

        let token = store.mint(&user_id).await.unwrap();

        let stored: (String,) = sqlx::query_as("SELECT token_hash FROM auth_tokens")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        assert_ne!(stored.0, token);
        assert_eq!(stored.0, hash_token(&token));
    }

    #[tokio::test]
    async fn test_unknown_token_resolves_to_none() {
        let pool = test_pool().await;
        let store = SqliteTokenStore::new(pool.clone());
        seed_user(&pool).await;

        let resolved = store.resolve("clm_not_a_real_token").await.unwrap();
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn test_resolve_touches_last_used() {
        let pool = test_pool().await;
        let store = SqliteTokenStore::new(pool.clone());
        let user_id = seed_user(&pool).await;

        let token = store.mint(&user_id).await.unwrap();
        let before: (Option<String>,) = sqlx::query_as("SELECT last_used_at FROM auth_tokens")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        assert!(before.0.is_none());

        store.resolve(&token).await.unwrap();
        let after: (Option<String>,) = sqlx::query_as("SELECT last_used_at FROM auth_tokens")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        assert!(after.0.is_some());
    }
}
