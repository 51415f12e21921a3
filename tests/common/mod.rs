#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, SystemTime},
};
use tap_in::{
    AppConfig, AppState, ProfileEvents,
    auth::Claims,
    models::{Profile, UpdateProfileRequest},
    repository::{ProfileLookup, RepoError, Repository},
    session::{Credentials, Session, SessionError, SessionProvider},
};
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
pub const TEST_USER_ID: Uuid = Uuid::from_u128(1);
pub const OTHER_USER_ID: Uuid = Uuid::from_u128(2);

// --- In-memory Repository ---

/// LookupBehavior
///
/// How `find_profile_id_by_username` should respond, independent of the data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LookupBehavior {
    Normal,
    Fail,
    Hang,
}

pub struct MockRepo {
    pub profiles: Mutex<HashMap<Uuid, Profile>>,
    pub lookup_behavior: LookupBehavior,
    pub lookup_calls: AtomicUsize,
    pub fail_all: bool,
}

impl Default for MockRepo {
    fn default() -> Self {
        Self {
            profiles: Mutex::new(HashMap::new()),
            lookup_behavior: LookupBehavior::Normal,
            lookup_calls: AtomicUsize::new(0),
            fail_all: false,
        }
    }
}

impl MockRepo {
    pub fn with_profile(username: &str, user_id: Uuid) -> Self {
        let repo = Self::default();
        repo.insert(username, user_id);
        repo
    }

    pub fn insert(&self, username: &str, user_id: Uuid) -> Profile {
        let mut profile = Profile::blank(user_id);
        profile.username = Some(username.to_string());
        profile.display_name = Some(format!("{username} display"));
        self.profiles
            .lock()
            .unwrap()
            .insert(user_id, profile.clone());
        profile
    }

    pub fn lookups(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), RepoError> {
        if self.fail_all {
            return Err(RepoError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

fn apply_text(target: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        *target = if value.is_empty() { None } else { Some(value) };
    }
}

#[async_trait]
impl ProfileLookup for MockRepo {
    async fn find_profile_id_by_username(&self, username: &str) -> Result<Option<Uuid>, RepoError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        match self.lookup_behavior {
            LookupBehavior::Fail => return Err(RepoError::Database(sqlx::Error::PoolTimedOut)),
            LookupBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            LookupBehavior::Normal => {}
        }
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .values()
            .find(|p| p.username.as_deref() == Some(username))
            .map(|p| p.user_id))
    }
}

#[async_trait]
impl Repository for MockRepo {
    async fn get_profile_by_username(&self, username: &str) -> Result<Option<Profile>, RepoError> {
        self.check()?;
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .values()
            .find(|p| p.username.as_deref() == Some(username))
            .cloned())
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, RepoError> {
        self.check()?;
        Ok(self.profiles.lock().unwrap().get(&user_id).cloned())
    }

    async fn create_profile(&self, user_id: Uuid) -> Result<Profile, RepoError> {
        self.check()?;
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .entry(user_id)
            .or_insert_with(|| Profile::blank(user_id))
            .clone())
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        req: UpdateProfileRequest,
    ) -> Result<Option<Profile>, RepoError> {
        self.check()?;
        let mut profiles = self.profiles.lock().unwrap();

        if let Some(username) = &req.username {
            let taken = profiles
                .values()
                .any(|p| p.user_id != user_id && p.username.as_deref() == Some(username.as_str()));
            if taken {
                return Err(RepoError::UsernameTaken);
            }
        }

        let Some(profile) = profiles.get_mut(&user_id) else {
            return Ok(None);
        };

        if let Some(username) = req.username {
            profile.username = Some(username);
        }
        apply_text(&mut profile.display_name, req.display_name);
        apply_text(&mut profile.bio, req.bio);
        apply_text(&mut profile.avatar_url, req.avatar_url);
        apply_text(&mut profile.background_image_url, req.background_image_url);
        if let Some(links) = req.links {
            profile.links = links;
        }
        if let Some(color) = req.background_color {
            profile.background_color = color;
        }
        if let Some(color) = req.text_color {
            profile.text_color = color;
        }
        if let Some(color) = req.button_color {
            profile.button_color = color;
        }
        if let Some(color) = req.button_text_color {
            profile.button_text_color = color;
        }
        profile.updated_at = Utc::now();

        Ok(Some(profile.clone()))
    }
}

// --- Session Fakes ---

/// FakeSessions
///
/// Returns a canned answer and counts how often it was asked.
pub struct FakeSessions {
    pub session: Option<Session>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl FakeSessions {
    pub fn signed_in() -> Self {
        Self {
            session: Some(Session {
                user_id: TEST_USER_ID,
                email: Some("jane@example.com".to_string()),
            }),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            session: None,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            session: None,
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for FakeSessions {
    async fn get_session(&self, _credentials: &Credentials) -> Result<Option<Session>, SessionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SessionError::Upstream(axum::http::StatusCode::BAD_GATEWAY));
        }
        Ok(self.session.clone())
    }
}

// --- Helper Functions ---

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Signs a Supabase-shaped access token. `exp_offset` is relative to now and may
/// be negative to produce an expired token.
pub fn create_token(user_id: Uuid, exp_offset: i64, secret: &str) -> String {
    let now = now_secs() as i64;
    let claims = Claims {
        sub: user_id,
        iat: now as usize,
        exp: (now + exp_offset) as usize,
        aud: "authenticated".to_string(),
        email: Some("jane@example.com".to_string()),
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

/// AppState backed by in-memory collaborators. The same repository also
/// serves the guard's lookup, as in production.
pub fn create_test_state(repo: Arc<MockRepo>, sessions: Arc<FakeSessions>) -> AppState {
    AppState {
        repo: repo.clone(),
        lookup: repo,
        sessions,
        events: Arc::new(ProfileEvents::new()),
        config: AppConfig::default(),
    }
}
