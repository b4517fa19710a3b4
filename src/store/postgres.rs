use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::{NewUser, StoreError, StoreResult, UniqueField, User, UserStore};

const USER_COLUMNS: &str =
    "id, public_id, email, password_hash, referral_code, referred_by_id, created_at";

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Translate a unique-violation into the field it guards, using the
/// constraint names from the `users` migration.
fn map_insert_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            match db_err.constraint() {
                Some("users_email_key") => return StoreError::Conflict(UniqueField::Email),
                Some("users_referral_code_key") => {
                    return StoreError::Conflict(UniqueField::ReferralCode)
                }
                _ => {}
            }
        }
    }
    StoreError::Query(err)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_referral_code(&self, code: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE referral_code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn referral_code_exists(&self, code: &str) -> StoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE referral_code = $1)")
                .bind(code)
                .fetch_one(&self.db)
                .await?;
        Ok(exists)
    }

    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, referral_code, referred_by_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.referral_code)
        .bind(user.referred_by_id)
        .fetch_one(&self.db)
        .await
        .map_err(map_insert_error)?;
        debug!(user_id = created.id, "user row inserted");
        Ok(created)
    }

    async fn children_of_many(&self, parent_ids: &[i64]) -> StoreResult<Vec<User>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
              FROM users
             WHERE referred_by_id = ANY($1)
             ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(parent_ids)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn count_children(&self, parent_id: i64) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE referred_by_id = $1")
            .bind(parent_id)
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }
}
