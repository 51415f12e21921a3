use std::{convert::Infallible, time::Duration};

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::stream::{self, Stream};

use crate::{
    AppState,
    auth::AuthUser,
    error::AppError,
    models::{Profile, ProfileChange, PublicProfile, UpdateProfileRequest},
    validation::validate_update,
};

/// Changes an SSE client may have queued before newer ones are dropped.
const SSE_BUFFER: usize = 16;

/// get_public_profile
///
/// [Public Route] Resolves a username to its public page data. This is also
/// where a guard pass-through for an unknown username turns into a 404.
#[utoipa::path(
    get,
    path = "/api/profiles/{username}",
    params(("username" = String, Path, description = "Profile username")),
    responses(
        (status = 200, description = "Found", body = PublicProfile),
        (status = 404, description = "No profile owns this username")
    )
)]
pub async fn get_public_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<PublicProfile>, AppError> {
    state
        .repo
        .get_profile_by_username(&username)
        .await?
        .map(|profile| Json(profile.into()))
        .ok_or(AppError::NotFound)
}

/// get_my_profile
///
/// [Authenticated Route] Returns the caller's profile, creating a blank one on
/// first access so the dashboard always has something to edit.
#[utoipa::path(
    get,
    path = "/api/me/profile",
    responses((status = 200, description = "Profile", body = Profile))
)]
pub async fn get_my_profile(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Profile>, AppError> {
    if let Some(profile) = state.repo.get_profile(id).await? {
        return Ok(Json(profile));
    }

    let profile = state.repo.create_profile(id).await?;
    tracing::info!(user_id = %id, "created profile on first access");
    state.events.publish(ProfileChange {
        user_id: id,
        profile: profile.clone(),
    });
    Ok(Json(profile))
}

/// update_my_profile
///
/// [Authenticated Route] Applies a partial update to the caller's profile and
/// announces the new state on the change feed.
#[utoipa::path(
    put,
    path = "/api/me/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated", body = Profile),
        (status = 404, description = "Profile does not exist yet"),
        (status = 409, description = "Username taken"),
        (status = 422, description = "Invalid payload")
    )
)]
pub async fn update_my_profile(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, AppError> {
    validate_update(&payload, &state.config.routes)?;

    let profile = state
        .repo
        .update_profile(id, payload)
        .await?
        .ok_or(AppError::NotFound)?;

    state.events.publish(ProfileChange {
        user_id: id,
        profile: profile.clone(),
    });
    Ok(Json(profile))
}

/// profile_events
///
/// [Authenticated Route] Server-Sent Events stream of the caller's profile
/// changes. The subscription lives as long as the connection does.
#[utoipa::path(
    get,
    path = "/api/me/profile/events",
    responses((status = 200, description = "text/event-stream of ProfileChange"))
)]
pub async fn profile_events(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (rx, subscription) = state.events.subscribe_buffered(id, SSE_BUFFER);

    let stream = stream::unfold((rx, subscription), |(mut rx, subscription)| async move {
        let change = rx.recv().await?;
        let event = Event::default()
            .event("profile")
            .json_data(&change)
            .unwrap_or_else(|_| Event::default().event("profile").data("{}"));
        Some((Ok(event), (rx, subscription)))
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

/// view_profile_page
///
/// [Public Route] Stand-in for the page layer at `/{username}`: the JSON the
/// page would render, or 404 when the guard passed an unknown username through.
#[utoipa::path(
    get,
    path = "/{username}",
    params(("username" = String, Path, description = "Profile username")),
    responses(
        (status = 200, description = "Found", body = PublicProfile),
        (status = 404, description = "Not found")
    )
)]
pub async fn view_profile_page(
    state: State<AppState>,
    username: Path<String>,
) -> Result<Json<PublicProfile>, AppError> {
    get_public_profile(state, username).await
}

/// not_found
///
/// Router fallback. Paths the guard passed through with no matching route
/// (including pages served by the frontend) end here.
pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
