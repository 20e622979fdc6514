use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::{
    repo::{StoreError, UniqueField, UserStore},
    repo_types::{Lifecycle, NewUser, SocialLinks, User},
};

const EMAIL_INDEX: &str = "users_email_live_idx";
const HANDLE_INDEX: &str = "users_handle_live_idx";

/// Row shape of the `users` table.
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    handle: Option<String>,
    display_name: String,
    bio: String,
    country: String,
    avatar_url: String,
    social_links: Json<SocialLinks>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    deleted_at: Option<OffsetDateTime>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            email: r.email,
            password_hash: r.password_hash,
            handle: r.handle,
            display_name: r.display_name,
            bio: r.bio,
            country: r.country,
            avatar_url: r.avatar_url,
            social_links: r.social_links.0,
            created_at: r.created_at,
            updated_at: r.updated_at,
            lifecycle: Lifecycle::from(r.deleted_at),
        }
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Maps a unique violation on one of the live-only indexes to the field it guards.
fn unique_violation(err: &sqlx::Error) -> Option<UniqueField> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    if db_err.code().as_deref() != Some("23505") {
        return None;
    }
    match db_err.constraint() {
        Some(EMAIL_INDEX) => Some(UniqueField::Email),
        Some(HANDLE_INDEX) => Some(UniqueField::Handle),
        _ => None,
    }
}

fn write_error(err: sqlx::Error, what: &'static str) -> StoreError {
    match unique_violation(&err) {
        Some(field) => StoreError::Conflict(field),
        None => StoreError::Other(anyhow::Error::new(err).context(what)),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, email, password_hash, handle)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, handle, display_name, bio, country,
                      avatar_url, social_links, created_at, updated_at, deleted_at
            "#,
        )
        .bind(new.id)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.handle)
        .fetch_one(&self.db)
        .await
        .map_err(|e| write_error(e, "insert user"))?;
        Ok(row.into())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, handle, display_name, bio, country,
                   avatar_url, social_links, created_at, updated_at, deleted_at
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get user by id")?;
        Ok(row.map(User::from))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, handle, display_name, bio, country,
                   avatar_url, social_links, created_at, updated_at, deleted_at
            FROM users
            WHERE email = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("get user by email")?;
        Ok(row.map(User::from))
    }

    async fn get_by_handle(&self, handle: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, handle, display_name, bio, country,
                   avatar_url, social_links, created_at, updated_at, deleted_at
            FROM users
            WHERE handle = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(handle)
        .fetch_optional(&self.db)
        .await
        .context("get user by handle")?;
        Ok(row.map(User::from))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            r#"SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND deleted_at IS NULL)"#,
        )
        .bind(email)
        .fetch_one(&self.db)
        .await
        .context("check email existence")?;
        Ok(exists)
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
               SET email = $2,
                   password_hash = $3,
                   handle = $4,
                   display_name = $5,
                   bio = $6,
                   country = $7,
                   avatar_url = $8,
                   social_links = $9,
                   updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, email, password_hash, handle, display_name, bio, country,
                      avatar_url, social_links, created_at, updated_at, deleted_at
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.handle)
        .bind(&user.display_name)
        .bind(&user.bio)
        .bind(&user.country)
        .bind(&user.avatar_url)
        .bind(Json(&user.social_links))
        .fetch_optional(&self.db)
        .await
        .map_err(|e| write_error(e, "update user"))?;
        row.map(User::from).ok_or(StoreError::NotFound)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
               SET deleted_at = now(), updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await
        .context("soft-delete user")?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
