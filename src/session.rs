use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode, header};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Claims;

/// Session
///
/// Server-recognized proof of an authenticated user for the current request.
/// Created at login by Supabase Auth; this service only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub email: Option<String>,
}

/// Credentials
///
/// The raw material a `SessionProvider` works from: the Supabase access token,
/// taken from the session cookie or, failing that, a `Bearer` header.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub access_token: Option<String>,
}

impl Credentials {
    pub fn from_headers(headers: &HeaderMap, cookie_name: &str) -> Self {
        let from_cookie = CookieJar::from_headers(headers)
            .get(cookie_name)
            .map(|cookie| cookie.value().trim().to_string())
            .filter(|token| !token.is_empty());

        let access_token = from_cookie.or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().split_once(' '))
                .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
                .map(|(_, token)| token.trim().to_string())
                .filter(|token| !token.is_empty())
        });

        Self { access_token }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("session provider answered {0}")]
    Upstream(StatusCode),
}

/// SessionProvider
///
/// Resolves request credentials to a session. "No session" is `Ok(None)`;
/// `Err` is reserved for infrastructure failures, which callers must handle
/// with an explicit policy.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn get_session(&self, credentials: &Credentials) -> Result<Option<Session>, SessionError>;
}

pub type SessionState = Arc<dyn SessionProvider>;

/// JwtSessionProvider
///
/// Verifies Supabase access tokens locally with the project's JWT secret.
/// Bad signatures, expiry and audience mismatches all mean "no session".
pub struct JwtSessionProvider {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtSessionProvider {
    pub fn new(secret: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_audience(&[audience]);

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl SessionProvider for JwtSessionProvider {
    async fn get_session(&self, credentials: &Credentials) -> Result<Option<Session>, SessionError> {
        let Some(token) = credentials.access_token.as_deref() else {
            return Ok(None);
        };

        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(Some(Session {
                user_id: data.claims.sub,
                email: data.claims.email,
            })),
            Err(e) => {
                tracing::debug!(reason = ?e.kind(), "rejected access token");
                Ok(None)
            }
        }
    }
}

/// SupabaseSessionProvider
///
/// Asks the Supabase Auth API who owns the token. Catches revocations that a
/// purely local check cannot see, at the cost of a network round trip.
pub struct SupabaseSessionProvider {
    client: reqwest::Client,
    user_endpoint: String,
    anon_key: Option<String>,
}

#[derive(Deserialize)]
struct SupabaseUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

impl SupabaseSessionProvider {
    pub fn new(
        supabase_url: &str,
        anon_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            user_endpoint: format!("{}/auth/v1/user", supabase_url.trim_end_matches('/')),
            anon_key,
        })
    }
}

#[async_trait]
impl SessionProvider for SupabaseSessionProvider {
    async fn get_session(&self, credentials: &Credentials) -> Result<Option<Session>, SessionError> {
        let Some(token) = credentials.access_token.as_deref() else {
            return Ok(None);
        };

        let mut request = self.client.get(&self.user_endpoint).bearer_auth(token);
        if let Some(key) = &self.anon_key {
            request = request.header("apikey", key);
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::OK => {
                let user: SupabaseUser = response.json().await?;
                Ok(Some(Session {
                    user_id: user.id,
                    email: user.email,
                }))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            other => Err(SessionError::Upstream(other)),
        }
    }
}
