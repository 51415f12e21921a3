use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod guard;
pub mod handlers;
pub mod models;
pub mod paths;
pub mod repository;
pub mod session;
pub mod validation;

// Router modules split by access level (public, authenticated).
pub mod routes;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use events::{EventsState, ProfileEvents};
pub use guard::{Guard, GuardDecision};
pub use repository::{LookupState, PostgresRepository, RepositoryState};
pub use session::SessionState;

/// ApiDoc
///
/// OpenAPI document for the JSON API, served at `/api/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_public_profile, handlers::get_my_profile, handlers::update_my_profile,
        handlers::profile_events, handlers::view_profile_page,
    ),
    components(
        schemas(
            models::Profile, models::PublicProfile, models::ProfileItem, models::ItemKind,
            models::UpdateProfileRequest, models::ProfileChange,
        )
    ),
    tags(
        (name = "tap-in", description = "tap-in.io profile API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Single, immutable container for every collaborator a request may need.
/// Built once in `main` and cloned cheaply per request.
#[derive(Clone)]
pub struct AppState {
    /// Profile persistence.
    pub repo: RepositoryState,
    /// Username existence check used by the guard. In production this is the
    /// same object as `repo`.
    pub lookup: LookupState,
    /// Resolves request credentials to a session.
    pub sessions: SessionState,
    /// In-process change feed.
    pub events: EventsState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for SessionState {
    fn from_ref(app_state: &AppState) -> SessionState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for EventsState {
    fn from_ref(app_state: &AppState) -> EventsState {
        app_state.events.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl AppState {
    /// Builds the request guard from the shared collaborators.
    pub fn guard(&self) -> Guard {
        Guard::new(
            self.config.routes.clone(),
            self.sessions.clone(),
            self.lookup.clone(),
            self.config.lookup_timeout,
            &self.config.session_cookie,
        )
    }
}

/// create_router
///
/// Assembles the routing structure, wraps it in the request guard and the
/// observability layers, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");
    let guard = state.guard();

    let base_router = Router::new()
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        .fallback(handlers::not_found)
        .with_state(state)
        // The guard sees every request, including the fallback, before any handler.
        .layer(middleware::from_fn_with_state(guard, guard::route_guard));

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span, correlated by the `x-request-id` header set by
/// `SetRequestIdLayer`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
