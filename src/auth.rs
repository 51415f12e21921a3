use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    session::{Credentials, SessionState},
};

/// Claims
///
/// The subset of a Supabase access token payload this service reads.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the auth user id, which is also the profile primary key.
    pub sub: Uuid,
    /// Expiration Time (exp): the token is rejected past this instant.
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
    /// Audience (aud): Supabase sets `authenticated` for signed-in users.
    pub aud: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated API request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

/// AuthUser Extractor Implementation
///
/// Resolves the request credentials through the configured `SessionProvider`.
/// Fails closed: a missing session and an unreachable provider both reject
/// with `401 Unauthorized`.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SessionState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let sessions = SessionState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let credentials = Credentials::from_headers(&parts.headers, &config.session_cookie);
        if credentials.access_token.is_none() {
            return Err(StatusCode::UNAUTHORIZED);
        }

        match sessions.get_session(&credentials).await {
            Ok(Some(session)) => Ok(AuthUser {
                id: session.user_id,
                email: session.email,
            }),
            Ok(None) => Err(StatusCode::UNAUTHORIZED),
            Err(e) => {
                tracing::warn!(error = %e, "session provider failed; rejecting request");
                Err(StatusCode::UNAUTHORIZED)
            }
        }
    }
}
