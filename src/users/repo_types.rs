use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Links shown on a profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default)]
    pub instagram: String,
    #[serde(default)]
    pub facebook: String,
    #[serde(default)]
    pub linkedin: String,
    #[serde(default)]
    pub x: String,
}

/// Whether a record still takes part in lookups and uniqueness checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Live,
    Deleted { at: OffsetDateTime },
}

impl Lifecycle {
    pub fn is_live(&self) -> bool {
        matches!(self, Lifecycle::Live)
    }

    #[cfg(test)]
    pub fn deleted_at(&self) -> Option<OffsetDateTime> {
        match self {
            Lifecycle::Live => None,
            Lifecycle::Deleted { at } => Some(*at),
        }
    }
}

impl From<Option<OffsetDateTime>> for Lifecycle {
    fn from(deleted_at: Option<OffsetDateTime>) -> Self {
        match deleted_at {
            Some(at) => Lifecycle::Deleted { at },
            None => Lifecycle::Live,
        }
    }
}

/// User identity record.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,                   // never changes, never reused
    pub email: String,              // unique among live users
    pub password_hash: String,      // PHC string, never leaves the server
    pub handle: Option<String>,     // unique among live users once assigned
    pub display_name: String,
    pub bio: String,
    pub country: String,
    pub avatar_url: String,
    pub social_links: SocialLinks,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub lifecycle: Lifecycle,
}

/// Values needed to insert a fresh user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub handle: Option<String>,
}

impl NewUser {
    pub(crate) fn into_user(self, now: OffsetDateTime) -> User {
        User {
            id: self.id,
            email: self.email,
            password_hash: self.password_hash,
            handle: self.handle,
            display_name: String::new(),
            bio: String::new(),
            country: String::new(),
            avatar_url: String::new(),
            social_links: SocialLinks::default(),
            created_at: now,
            updated_at: now,
            lifecycle: Lifecycle::Live,
        }
    }
}
