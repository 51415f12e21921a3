use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::{sync::Arc, time::Duration};

use crate::{
    paths::{RouteClass, RouteConfig},
    repository::LookupState,
    session::{Credentials, SessionState},
};

/// Diagnostic marker set when a username route resolved to an existing profile.
/// Telemetry only: the response body is never affected.
pub const PROFILE_FOUND_HEADER: HeaderName = HeaderName::from_static("x-profile-found");

/// GuardDecision
///
/// The only three outcomes of a guard evaluation. There is no error variant:
/// collaborator failures are folded into one of these by policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Pass,
    /// Pass, and tag the response with [`PROFILE_FOUND_HEADER`].
    PassProfileFound,
    /// Same-origin redirect to a configured path.
    Redirect(String),
}

/// Guard
///
/// Per-request route classification and access control. Holds no per-request
/// state; collaborators are injected once at startup and shared by reference.
#[derive(Clone)]
pub struct Guard {
    routes: Arc<RouteConfig>,
    sessions: SessionState,
    lookup: LookupState,
    lookup_timeout: Duration,
    session_cookie: Arc<str>,
}

enum Lookup {
    Found,
    Missing,
    Failed,
}

impl Guard {
    pub fn new(
        routes: RouteConfig,
        sessions: SessionState,
        lookup: LookupState,
        lookup_timeout: Duration,
        session_cookie: &str,
    ) -> Self {
        Self {
            routes: Arc::new(routes),
            sessions,
            lookup,
            lookup_timeout,
            session_cookie: Arc::from(session_cookie),
        }
    }

    /// decide
    ///
    /// Classifies `path` and applies the rule for its class. At most one session
    /// check or one profile lookup is made, never both.
    ///
    /// - protected: no session → redirect to login (fail closed on provider error)
    /// - login: session → redirect to the protected root
    /// - username: lookup bounded by `lookup_timeout`, always passes (fail open)
    pub async fn decide(&self, path: &str, headers: &HeaderMap) -> GuardDecision {
        let class = self.routes.classify(path);

        let decision = match &class {
            RouteClass::Asset | RouteClass::Api | RouteClass::Fallback => GuardDecision::Pass,
            RouteClass::Protected => {
                if self.has_session(headers).await {
                    GuardDecision::Pass
                } else {
                    GuardDecision::Redirect(self.routes.login_path.clone())
                }
            }
            RouteClass::Login => {
                if self.has_session(headers).await {
                    GuardDecision::Redirect(self.routes.protected_prefix.clone())
                } else {
                    GuardDecision::Pass
                }
            }
            RouteClass::UsernameCandidate(username) => match self.lookup(username).await {
                Lookup::Found => GuardDecision::PassProfileFound,
                Lookup::Missing | Lookup::Failed => GuardDecision::Pass,
            },
        };

        tracing::debug!(path, class = class.label(), ?decision, "route guard");
        decision
    }

    /// Provider errors count as "no session".
    async fn has_session(&self, headers: &HeaderMap) -> bool {
        let credentials = Credentials::from_headers(headers, &self.session_cookie);
        match self.sessions.get_session(&credentials).await {
            Ok(session) => {
                tracing::debug!(signed_in = session.is_some(), "session check");
                session.is_some()
            }
            Err(e) => {
                tracing::warn!(error = %e, "session provider failed; treating as signed out");
                false
            }
        }
    }

    async fn lookup(&self, username: &str) -> Lookup {
        let query = self.lookup.find_profile_id_by_username(username);
        match tokio::time::timeout(self.lookup_timeout, query).await {
            Ok(Ok(found)) => {
                tracing::debug!(username, found = found.is_some(), "profile lookup");
                if found.is_some() {
                    Lookup::Found
                } else {
                    Lookup::Missing
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(username, error = %e, "profile lookup failed");
                Lookup::Failed
            }
            Err(_) => {
                tracing::warn!(username, timeout = ?self.lookup_timeout, "profile lookup timed out");
                Lookup::Failed
            }
        }
    }
}

/// route_guard
///
/// Axum middleware wrapping the whole router. Redirects short-circuit; every
/// other decision forwards the request untouched.
pub async fn route_guard(State(guard): State<Guard>, request: Request, next: Next) -> Response {
    let decision = guard.decide(request.uri().path(), request.headers()).await;

    match decision {
        GuardDecision::Pass => next.run(request).await,
        GuardDecision::PassProfileFound => {
            let mut response = next.run(request).await;
            response
                .headers_mut()
                .insert(PROFILE_FOUND_HEADER, HeaderValue::from_static("true"));
            response
        }
        GuardDecision::Redirect(target) => Redirect::temporary(&target).into_response(),
    }
}
