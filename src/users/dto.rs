use serde::Serialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

use super::repo_types::{SocialLinks, User};

fn rfc3339(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| at.to_string())
}

/// What anyone may see at `/users/:handle`.
#[derive(Debug, Serialize)]
pub struct PublicProfile {
    pub handle: Option<String>,
    pub display_name: String,
    pub bio: String,
    pub country: String,
    pub avatar_url: String,
    pub social_links: SocialLinks,
    pub created_at: String,
}

impl From<&User> for PublicProfile {
    fn from(u: &User) -> Self {
        Self {
            handle: u.handle.clone(),
            display_name: u.display_name.clone(),
            bio: u.bio.clone(),
            country: u.country.clone(),
            avatar_url: u.avatar_url.clone(),
            social_links: u.social_links.clone(),
            created_at: rfc3339(u.created_at),
        }
    }
}

/// The owner's view; never includes the password hash.
#[derive(Debug, Serialize)]
pub struct PrivateProfile {
    pub id: Uuid,
    pub email: String,
    #[serde(flatten)]
    pub profile: PublicProfile,
    pub updated_at: String,
}

impl From<&User> for PrivateProfile {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            profile: PublicProfile::from(u),
            updated_at: rfc3339(u.updated_at),
        }
    }
}
