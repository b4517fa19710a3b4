use async_trait::async_trait;
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

#[cfg(test)]
pub mod memory;
pub mod postgres;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64, // internal id, never sent to clients
    pub public_id: Uuid,
    pub email: String,
    pub password_hash: String, // argon2 PHC string
    pub referral_code: String,
    pub referred_by_id: Option<i64>,
    pub created_at: OffsetDateTime,
}

/// Row to insert. `email` is expected to be normalized already.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub referral_code: String,
    pub referred_by_id: Option<i64>,
}

/// Which unique constraint an insert ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    ReferralCode,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated on {0:?}")]
    Conflict(UniqueField),

    #[error("store query failed: {0}")]
    Query(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Query surface over the `users` table.
///
/// Implementations must enforce email and referral code uniqueness
/// atomically and report violations as [`StoreError::Conflict`].
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_by_referral_code(&self, code: &str) -> StoreResult<Option<User>>;

    async fn referral_code_exists(&self, code: &str) -> StoreResult<bool> {
        Ok(self.find_by_referral_code(code).await?.is_some())
    }

    async fn insert(&self, user: NewUser) -> StoreResult<User>;

    /// Direct children of every id in `parent_ids`, ordered by
    /// `created_at` then `id`. Ordering across different parents is left
    /// to the caller.
    async fn children_of_many(&self, parent_ids: &[i64]) -> StoreResult<Vec<User>>;

    async fn count_children(&self, parent_id: i64) -> StoreResult<i64>;
}
