use crate::models::{Profile, ProfileItem, UpdateProfileRequest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, types::Json};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("username is already taken")]
    UsernameTaken,
}

/// ProfileLookup
///
/// The single question the request guard asks of the data layer: does a
/// profile own this username? Exact, case-sensitive match.
#[async_trait]
pub trait ProfileLookup: Send + Sync {
    async fn find_profile_id_by_username(&self, username: &str) -> Result<Option<Uuid>, RepoError>;
}

/// Repository Trait
///
/// Abstract contract for profile persistence, so handlers never know whether
/// they talk to Postgres or a test double.
#[async_trait]
pub trait Repository: ProfileLookup {
    /// Public read. Only profiles with a claimed username are reachable.
    async fn get_profile_by_username(&self, username: &str) -> Result<Option<Profile>, RepoError>;

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, RepoError>;

    /// Creates a blank profile for `user_id`. Idempotent: returns the existing
    /// row if another request created it first.
    async fn create_profile(&self, user_id: Uuid) -> Result<Profile, RepoError>;

    /// Partial update. `None` when the profile does not exist.
    async fn update_profile(
        &self,
        user_id: Uuid,
        req: UpdateProfileRequest,
    ) -> Result<Option<Profile>, RepoError>;
}

/// RepositoryState
///
/// The concrete type used to share persistence access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// LookupState
///
/// The narrow lookup handle given to the guard.
pub type LookupState = Arc<dyn ProfileLookup>;

const PROFILE_COLUMNS: &str = r#"
    user_id, username, display_name, bio, avatar_url, links,
    background_color, text_color, button_color, button_text_color,
    background_image_url, created_at, updated_at
"#;

#[derive(FromRow)]
struct ProfileRow {
    user_id: Uuid,
    username: Option<String>,
    display_name: Option<String>,
    bio: Option<String>,
    avatar_url: Option<String>,
    links: Json<Vec<ProfileItem>>,
    background_color: String,
    text_color: String,
    button_color: String,
    button_text_color: String,
    background_image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            user_id: row.user_id,
            username: row.username,
            display_name: row.display_name,
            bio: row.bio,
            avatar_url: row.avatar_url,
            links: row.links.0,
            background_color: row.background_color,
            text_color: row.text_color,
            button_color: row.button_color,
            button_text_color: row.button_text_color,
            background_image_url: row.background_image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the
/// Supabase-managed PostgreSQL database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileLookup for PostgresRepository {
    async fn find_profile_id_by_username(&self, username: &str) -> Result<Option<Uuid>, RepoError> {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM profiles WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_profile_by_username(&self, username: &str) -> Result<Option<Profile>, RepoError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE username = $1");
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Profile::from))
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, RepoError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1");
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Profile::from))
    }

    /// create_profile
    ///
    /// The no-op `DO UPDATE` makes `RETURNING` yield the row on conflict too,
    /// so concurrent first visits both receive the same profile.
    async fn create_profile(&self, user_id: Uuid) -> Result<Profile, RepoError> {
        let sql = format!(
            r#"
            INSERT INTO profiles (user_id) VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING {PROFILE_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    /// update_profile
    ///
    /// `COALESCE` keeps columns whose field was absent. The nullable text
    /// columns additionally map an empty string to NULL.
    async fn update_profile(
        &self,
        user_id: Uuid,
        req: UpdateProfileRequest,
    ) -> Result<Option<Profile>, RepoError> {
        let sql = format!(
            r#"
            UPDATE profiles SET
                username = COALESCE($2, username),
                display_name = CASE WHEN $3::text IS NULL THEN display_name ELSE NULLIF($3, '') END,
                bio = CASE WHEN $4::text IS NULL THEN bio ELSE NULLIF($4, '') END,
                avatar_url = CASE WHEN $5::text IS NULL THEN avatar_url ELSE NULLIF($5, '') END,
                links = COALESCE($6, links),
                background_color = COALESCE($7, background_color),
                text_color = COALESCE($8, text_color),
                button_color = COALESCE($9, button_color),
                button_text_color = COALESCE($10, button_text_color),
                background_image_url = CASE WHEN $11::text IS NULL THEN background_image_url ELSE NULLIF($11, '') END,
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        );

        let result = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(user_id)
            .bind(req.username)
            .bind(req.display_name)
            .bind(req.bio)
            .bind(req.avatar_url)
            .bind(req.links.map(Json))
            .bind(req.background_color)
            .bind(req.text_color)
            .bind(req.button_color)
            .bind(req.button_text_color)
            .bind(req.background_image_url)
            .fetch_optional(&self.pool)
            .await;

        match result {
            Ok(row) => Ok(row.map(Profile::from)),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(RepoError::UsernameTaken)
            }
            Err(e) => Err(e.into()),
        }
    }
}
