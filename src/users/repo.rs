use async_trait::async_trait;
use uuid::Uuid;

use crate::users::repo_types::{NewUser, User};

/// Column guarded by a live-only unique constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    Handle,
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UniqueField::Email => f.write_str("email"),
            UniqueField::Handle => f.write_str("handle"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user not found")]
    NotFound,
    #[error("unique constraint violated on {0}")]
    Conflict(UniqueField),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Durable storage for user records.
///
/// Every read ignores soft-deleted rows. `create` and `update` report
/// uniqueness violations as [`StoreError::Conflict`]; the check must be atomic
/// with the write, callers only pre-check for friendlier errors.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new: NewUser) -> Result<User, StoreError>;
    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn get_by_handle(&self, handle: &str) -> Result<Option<User>, StoreError>;
    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;
    /// Persists every mutable field and bumps `updated_at`.
    async fn update(&self, user: &User) -> Result<User, StoreError>;
    async fn soft_delete(&self, id: Uuid) -> Result<(), StoreError>;
}
