//! Shared fixtures for unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    auth::{jwt::JwtKeys, services::AuthService},
    config::{AuthConfig, JwtConfig},
    users::{
        repo::{StoreError, UserStore},
        repo_types::{NewUser, User},
    },
};

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret".into(),
        issuer: "test-issuer".into(),
        audience: "test-aud".into(),
        ttl_minutes: 5,
    }
}

pub fn test_keys() -> JwtKeys {
    JwtKeys::new(&jwt_config())
}

pub fn auth_service(store: Arc<dyn UserStore>, handle_required: bool) -> AuthService {
    AuthService::new(store, test_keys(), &AuthConfig { handle_required })
}

/// Store whose advisory lookups never see anything, as if every other
/// request committed right after the pre-check ran.
struct BlindPrecheck {
    inner: Arc<dyn UserStore>,
}

#[async_trait]
impl UserStore for BlindPrecheck {
    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        self.inner.create(new).await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.inner.get_by_id(id).await
    }

    async fn get_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
        Ok(None)
    }

    async fn get_by_handle(&self, _handle: &str) -> Result<Option<User>, StoreError> {
        Ok(None)
    }

    async fn exists_by_email(&self, _email: &str) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        self.inner.update(user).await
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.inner.soft_delete(id).await
    }
}

pub fn blind_precheck_store(inner: Arc<dyn UserStore>) -> Arc<dyn UserStore> {
    Arc::new(BlindPrecheck { inner })
}
