use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Every handler here takes an `AuthUser`, so a request without a valid
/// session is rejected with 401 before any handler logic runs. The caller can
/// only ever read or modify their own profile: the id comes from the session,
/// never from the path.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET/PUT /api/me/profile
        // Read-or-create and partial update of the caller's profile.
        .route(
            "/api/me/profile",
            get(handlers::get_my_profile).put(handlers::update_my_profile),
        )
        // GET /api/me/profile/events
        // Server-Sent Events feed of changes to the caller's profile.
        .route("/api/me/profile/events", get(handlers::profile_events))
}
