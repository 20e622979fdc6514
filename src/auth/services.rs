use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        jwt::JwtKeys,
        password::{hash_password, verify_dummy, verify_password},
    },
    config::AuthConfig,
    error::ServiceError,
    users::{
        handle::is_valid_handle,
        repo::{StoreError, UserStore},
        repo_types::{NewUser, User},
    },
};

/// Signup, login and token resolution over a [`UserStore`].
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    keys: JwtKeys,
    handle_required: bool,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, keys: JwtKeys, cfg: &AuthConfig) -> Self {
        Self {
            store,
            keys,
            handle_required: cfg.handle_required,
        }
    }

    /// Registers a user and returns a session token for it.
    ///
    /// The email/handle lookups only produce early errors; the store's own
    /// unique constraint decides races between concurrent signups.
    #[instrument(skip(self, password))]
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        handle: Option<&str>,
    ) -> Result<String, ServiceError> {
        if email.trim().is_empty() {
            warn!("signup without email");
            return Err(ServiceError::InvalidEmail);
        }
        match handle {
            Some(h) if !is_valid_handle(h) => {
                warn!(handle = %h, "invalid handle");
                return Err(ServiceError::InvalidHandle);
            }
            None if self.handle_required => {
                warn!("handle required but missing");
                return Err(ServiceError::InvalidHandle);
            }
            _ => {}
        }

        if self.store.exists_by_email(email).await? {
            warn!("email already registered");
            return Err(ServiceError::EmailTaken);
        }
        if let Some(h) = handle {
            if self.store.get_by_handle(h).await?.is_some() {
                warn!(handle = %h, "handle already taken");
                return Err(ServiceError::HandleTaken);
            }
        }

        let password_hash = hash_off_thread(password.to_owned()).await?;

        let new = NewUser {
            id: Uuid::new_v4(),
            email: email.to_owned(),
            password_hash,
            handle: handle.map(str::to_owned),
        };
        let user = self.store.create(new).await.map_err(|e| {
            match &e {
                StoreError::Conflict(field) => warn!(%field, "signup lost uniqueness race"),
                other => error!(error = %other, "create user failed"),
            }
            ServiceError::from(e)
        })?;

        let token = self.keys.sign(&user.id.to_string())?;
        info!(user_id = %user.id, "user signed up");
        Ok(token)
    }

    /// Unknown email and wrong password fail identically.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ServiceError> {
        let user = self.store.get_by_email(email).await?;

        let plain = password.to_owned();
        let hash = user.as_ref().map(|u| u.password_hash.clone());
        let ok = tokio::task::spawn_blocking(move || match hash {
            Some(hash) => verify_password(&plain, &hash),
            None => verify_dummy(&plain),
        })
        .await
        .map_err(ServiceError::internal)?;

        let user = match user {
            Some(u) if ok => u,
            Some(u) => {
                warn!(user_id = %u.id, "login invalid password");
                return Err(ServiceError::InvalidCredentials);
            }
            None => {
                warn!("login unknown email");
                return Err(ServiceError::InvalidCredentials);
            }
        };

        let token = self.keys.sign(&user.id.to_string())?;
        info!(user_id = %user.id, "user logged in");
        Ok(token)
    }

    /// Cookie lifetime matching the tokens this service signs.
    pub fn session_ttl_secs(&self) -> i64 {
        self.keys.ttl_secs()
    }

    /// Maps a bearer token to its live user. Every failure is `None`.
    #[instrument(skip_all)]
    pub async fn resolve_current_user(&self, token: Option<&str>) -> Option<User> {
        let token = token.map(str::trim).filter(|t| !t.is_empty())?;

        let claims = match self.keys.verify(token) {
            Ok(c) => c,
            Err(e) => {
                debug!(error = %e, "rejected session token");
                return None;
            }
        };

        let Ok(user_id) = Uuid::parse_str(&claims.sub) else {
            debug!(sub = %claims.sub, "session token subject is not a user id");
            return None;
        };

        match self.store.get_by_id(user_id).await {
            Ok(user) => user,
            Err(e) => {
                error!(error = %e, %user_id, "load current user failed");
                None
            }
        }
    }
}

/// Argon2 is deliberately slow; keep it off the async workers.
async fn hash_off_thread(password: String) -> Result<String, ServiceError> {
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(ServiceError::internal)??;
    Ok(hash)
}
