use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{NewUser, StoreError, StoreResult, UniqueField, User, UserStore};

/// In-process `UserStore` for tests. Same uniqueness rules as the
/// Postgres schema; timestamps advance by one millisecond per insert so
/// creation order is deterministic.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrites a parent pointer without any checks. Only for simulating
    /// corrupted data such as cycles.
    pub async fn force_parent(&self, id: i64, parent: Option<i64>) {
        let mut users = self.users.write().await;
        if let Some(u) = users.iter_mut().find(|u| u.id == id) {
            u.referred_by_id = parent;
        }
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_referral_code(&self, code: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.referral_code == code)
            .cloned())
    }

    async fn insert(&self, new: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::Conflict(UniqueField::Email));
        }
        if users.iter().any(|u| u.referral_code == new.referral_code) {
            return Err(StoreError::Conflict(UniqueField::ReferralCode));
        }

        let id = users.len() as i64 + 1;
        let user = User {
            id,
            public_id: Uuid::new_v4(),
            email: new.email,
            password_hash: new.password_hash,
            referral_code: new.referral_code,
            referred_by_id: new.referred_by_id,
            created_at: OffsetDateTime::UNIX_EPOCH + Duration::milliseconds(id),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn children_of_many(&self, parent_ids: &[i64]) -> StoreResult<Vec<User>> {
        let mut rows: Vec<User> = self
            .users
            .read()
            .await
            .iter()
            .filter(|u| u.referred_by_id.is_some_and(|p| parent_ids.contains(&p)))
            .cloned()
            .collect();
        rows.sort_by_key(|u| (u.created_at, u.id));
        Ok(rows)
    }

    async fn count_children(&self, parent_id: i64) -> StoreResult<i64> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .filter(|u| u.referred_by_id == Some(parent_id))
            .count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, code: &str, parent: Option<i64>) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "hash".into(),
            referral_code: code.into(),
            referred_by_id: parent,
        }
    }

    #[tokio::test]
    async fn rejects_duplicate_email_and_code() {
        let store = MemoryUserStore::new();
        store.insert(new_user("a@x.io", "AAAAAA", None)).await.unwrap();

        let err = store
            .insert(new_user("a@x.io", "BBBBBB", None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(UniqueField::Email)));

        let err = store
            .insert(new_user("b@x.io", "AAAAAA", None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(UniqueField::ReferralCode)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn children_come_back_in_creation_order() {
        let store = MemoryUserStore::new();
        let root = store.insert(new_user("r@x.io", "ROOT00", None)).await.unwrap();
        let b = store.insert(new_user("b@x.io", "BBBBBB", Some(root.id))).await.unwrap();
        let c = store.insert(new_user("c@x.io", "CCCCCC", Some(root.id))).await.unwrap();

        let kids = store.children_of_many(&[root.id]).await.unwrap();
        let ids: Vec<i64> = kids.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![b.id, c.id]);
        assert_eq!(store.count_children(root.id).await.unwrap(), 2);
        assert_eq!(store.count_children(b.id).await.unwrap(), 0);
    }
}
