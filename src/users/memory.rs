use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::users::{
    repo::{StoreError, UniqueField, UserStore},
    repo_types::{Lifecycle, NewUser, User},
};

/// Process-local user store.
///
/// Holds every record, deleted ones included, behind a single lock so the
/// live-uniqueness check and the write it guards happen atomically.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn find_live<'a, P>(users: &'a HashMap<Uuid, User>, pred: P) -> Option<&'a User>
where
    P: Fn(&User) -> bool,
{
    users.values().find(|u| u.lifecycle.is_live() && pred(u))
}

/// Rejects `candidate` if another live record already owns its email or handle.
fn check_unique(users: &HashMap<Uuid, User>, candidate: &User) -> Result<(), StoreError> {
    if find_live(users, |u| u.id != candidate.id && u.email == candidate.email).is_some() {
        return Err(StoreError::Conflict(UniqueField::Email));
    }
    if let Some(handle) = candidate.handle.as_deref() {
        if find_live(users, |u| u.id != candidate.id && u.handle.as_deref() == Some(handle))
            .is_some()
        {
            return Err(StoreError::Conflict(UniqueField::Handle));
        }
    }
    Ok(())
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.contains_key(&new.id) {
            return Err(StoreError::Other(anyhow::anyhow!("user id {} already used", new.id)));
        }
        let user = new.into_user(OffsetDateTime::now_utc());
        check_unique(&users, &user)?;
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.get(&id).filter(|u| u.lifecycle.is_live()).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(find_live(&users, |u| u.email == email).cloned())
    }

    async fn get_by_handle(&self, handle: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(find_live(&users, |u| u.handle.as_deref() == Some(handle)).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let users = self.users.read().await;
        Ok(find_live(&users, |u| u.email == email).is_some())
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        let current = users
            .get(&user.id)
            .filter(|u| u.lifecycle.is_live())
            .ok_or(StoreError::NotFound)?;
        let mut updated = user.clone();
        updated.created_at = current.created_at;
        updated.lifecycle = Lifecycle::Live;
        updated.updated_at = OffsetDateTime::now_utc();
        check_unique(&users, &updated)?;
        users.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) if user.lifecycle.is_live() => {
                let now = OffsetDateTime::now_utc();
                user.lifecycle = Lifecycle::Deleted { at: now };
                user.updated_at = now;
                Ok(())
            }
            _ => Err(StoreError::NotFound),
        }
    }
}
