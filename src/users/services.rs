use std::sync::Arc;

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    error::ServiceError,
    users::{
        handle::is_valid_handle,
        repo::{StoreError, UserStore},
        repo_types::{SocialLinks, User},
    },
};

/// Fields submitted by the profile edit form.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileInput {
    pub handle: String,
    pub display_name: String,
    pub bio: String,
    pub country: String,
    pub social_links: SocialLinks,
    /// `None` keeps the current avatar.
    pub avatar_url: Option<String>,
}

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn UserStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Applies a profile edit for `user_id` and returns the saved record.
    #[instrument(skip(self, input), fields(handle = %input.handle))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        input: UpdateProfileInput,
    ) -> Result<User, ServiceError> {
        if !is_valid_handle(&input.handle) {
            warn!("invalid handle");
            return Err(ServiceError::InvalidHandle);
        }

        // An authenticated caller whose record vanished holds a stale token.
        let mut user = self.store.get_by_id(user_id).await?.ok_or_else(|| {
            error!(%user_id, "acting user not found");
            ServiceError::internal(anyhow::anyhow!("user {user_id} not found"))
        })?;

        if user.handle.as_deref() != Some(input.handle.as_str()) {
            if let Some(owner) = self.store.get_by_handle(&input.handle).await? {
                if owner.id != user.id {
                    warn!(owner_id = %owner.id, "handle already taken");
                    return Err(ServiceError::HandleTaken);
                }
            }
        }

        user.handle = Some(input.handle);
        user.display_name = input.display_name;
        user.bio = input.bio;
        user.country = input.country;
        user.social_links = input.social_links;
        if let Some(url) = input.avatar_url.filter(|u| !u.is_empty()) {
            user.avatar_url = url;
        }

        let saved = self.store.update(&user).await.map_err(|e| match e {
            StoreError::NotFound => {
                ServiceError::internal(anyhow::anyhow!("user {user_id} deleted during update"))
            }
            other => ServiceError::from(other),
        })?;
        info!(%user_id, "profile updated");
        Ok(saved)
    }

    /// Public profile lookup.
    #[instrument(skip(self))]
    pub async fn get_by_handle(&self, handle: &str) -> Result<User, ServiceError> {
        self.store
            .get_by_handle(handle)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    #[instrument(skip(self))]
    pub async fn delete_account(&self, user_id: Uuid) -> Result<(), ServiceError> {
        self.store.soft_delete(user_id).await?;
        info!(%user_id, "account soft-deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{auth_service, blind_precheck_store};
    use crate::users::memory::MemoryUserStore;

    struct Fixture {
        store: Arc<MemoryUserStore>,
        profiles: ProfileService,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(MemoryUserStore::new());
            Self {
                profiles: ProfileService::new(store.clone()),
                store,
            }
        }

        async fn signup(&self, email: &str, handle: &str) -> User {
            let auth = auth_service(self.store.clone(), false);
            let token = auth.signup(email, "password123", Some(handle)).await.unwrap();
            auth.resolve_current_user(Some(&token)).await.unwrap()
        }
    }

    fn input(handle: &str) -> UpdateProfileInput {
        UpdateProfileInput {
            handle: handle.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn update_applies_all_fields() {
        let f = Fixture::new();
        let user = f.signup("user@example.com", "oldhandle").await;

        let saved = f
            .profiles
            .update_profile(
                user.id,
                UpdateProfileInput {
                    handle: "newhandle".into(),
                    display_name: "Test User".into(),
                    bio: "My bio".into(),
                    country: "US".into(),
                    social_links: SocialLinks {
                        instagram: "https://instagram.com/test".into(),
                        ..Default::default()
                    },
                    avatar_url: Some("https://cdn.example.com/avatars/a.png".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(saved.handle.as_deref(), Some("newhandle"));

        let reloaded = f.profiles.get_by_handle("newhandle").await.unwrap();
        assert_eq!(reloaded.display_name, "Test User");
        assert_eq!(reloaded.social_links.instagram, "https://instagram.com/test");
        assert_eq!(reloaded.avatar_url, "https://cdn.example.com/avatars/a.png");
        assert!(reloaded.updated_at >= user.updated_at);
        assert!(matches!(
            f.profiles.get_by_handle("oldhandle").await,
            Err(ServiceError::NotFound)
        ));
    }

    #[tokio::test]
    async fn missing_avatar_keeps_existing_one() {
        let f = Fixture::new();
        let user = f.signup("user@example.com", "testuser").await;
        let mut first = input("testuser");
        first.avatar_url = Some("https://cdn.example.com/avatars/1.png".into());
        f.profiles.update_profile(user.id, first).await.unwrap();

        let saved = f.profiles.update_profile(user.id, input("testuser")).await.unwrap();
        assert_eq!(saved.avatar_url, "https://cdn.example.com/avatars/1.png");

        let mut empty = input("testuser");
        empty.avatar_url = Some(String::new());
        let saved = f.profiles.update_profile(user.id, empty).await.unwrap();
        assert_eq!(saved.avatar_url, "https://cdn.example.com/avatars/1.png");
    }

    #[tokio::test]
    async fn invalid_handle_is_rejected() {
        let f = Fixture::new();
        let user = f.signup("user@example.com", "testuser").await;
        for bad in ["ab", "AB_valid", ""] {
            let err = f.profiles.update_profile(user.id, input(bad)).await.unwrap_err();
            assert!(matches!(err, ServiceError::InvalidHandle), "{bad:?}");
        }
    }

    #[tokio::test]
    async fn renaming_to_another_users_handle_is_handle_taken() {
        let f = Fixture::new();
        let a = f.signup("user1@example.com", "user1hnd").await;
        f.signup("user2@example.com", "user2hnd").await;

        let mut attempt = input("user2hnd");
        attempt.bio = "should not stick".into();
        let err = f.profiles.update_profile(a.id, attempt).await.unwrap_err();
        assert!(matches!(err, ServiceError::HandleTaken));

        let unchanged = f.store.get_by_id(a.id).await.unwrap().unwrap();
        assert_eq!(unchanged.handle.as_deref(), Some("user1hnd"));
        assert!(unchanged.bio.is_empty());
    }

    #[tokio::test]
    async fn store_constraint_rejects_rename_when_precheck_misses() {
        let f = Fixture::new();
        let a = f.signup("user1@example.com", "user1hnd").await;
        f.signup("user2@example.com", "user2hnd").await;

        let blind = ProfileService::new(blind_precheck_store(f.store.clone()));
        let err = blind.update_profile(a.id, input("user2hnd")).await.unwrap_err();
        assert!(matches!(err, ServiceError::HandleTaken));

        let unchanged = f.store.get_by_id(a.id).await.unwrap().unwrap();
        assert_eq!(unchanged.handle.as_deref(), Some("user1hnd"));
    }

    #[tokio::test]
    async fn keeping_own_handle_is_not_a_conflict() {
        let f = Fixture::new();
        let user = f.signup("user@example.com", "testuser").await;
        let mut same = input("testuser");
        same.bio = "updated".into();
        let saved = f.profiles.update_profile(user.id, same).await.unwrap();
        assert_eq!(saved.handle.as_deref(), Some("testuser"));
        assert_eq!(saved.bio, "updated");
    }

    #[tokio::test]
    async fn first_handle_can_be_assigned_after_signup() {
        let f = Fixture::new();
        let auth = auth_service(f.store.clone(), false);
        let token = auth.signup("user@example.com", "password123", None).await.unwrap();
        let user = auth.resolve_current_user(Some(&token)).await.unwrap();

        let saved = f.profiles.update_profile(user.id, input("late-bloomer")).await.unwrap();
        assert_eq!(saved.handle.as_deref(), Some("late-bloomer"));
    }

    #[tokio::test]
    async fn unknown_user_is_internal_failure() {
        let f = Fixture::new();
        let err = f
            .profiles
            .update_profile(Uuid::new_v4(), input("testuser"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));
    }

    #[tokio::test]
    async fn delete_account_hides_profile_and_frees_handle() {
        let f = Fixture::new();
        let user = f.signup("user@example.com", "testuser").await;
        f.profiles.delete_account(user.id).await.unwrap();

        assert!(matches!(
            f.profiles.get_by_handle("testuser").await,
            Err(ServiceError::NotFound)
        ));
        assert!(matches!(
            f.profiles.delete_account(user.id).await,
            Err(ServiceError::NotFound)
        ));
        f.signup("other@example.com", "testuser").await;
    }
}
