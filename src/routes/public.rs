use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints that are **unauthenticated** and read-only. Only profiles with a
/// claimed username are reachable from here.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /api/health
        // Liveness probe for the load balancer. Never touches the database.
        .route("/api/health", get(|| async { "ok" }))
        // GET /api/profiles/{username}
        // Public profile data by exact, case-sensitive username.
        .route("/api/profiles/{username}", get(handlers::get_public_profile))
        // GET /{username}
        // Page-layer stand-in. Static routes such as /api/health win over this
        // parameter route, and the guard has already classified the path.
        .route("/{username}", get(handlers::view_profile_page))
}
