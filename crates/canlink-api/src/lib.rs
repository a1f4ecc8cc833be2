//! canlink-api - HTTP API for CAN sessions
//!
//! Exposes a [`SessionRegistry`](canlink_session::SessionRegistry) over HTTP:
//! sessions are opened and closed with JSON requests, frames are sent with
//! JSON requests, and subscriptions are served as Server-Sent Events.
//!
//! # Usage
//!
//! ```ignore
//! use canlink_api::{create_router, AppState};
//! use canlink_session::SessionRegistry;
//!
//! let registry = Arc::new(SessionRegistry::new(Arc::new(factory)));
//! let router = create_router(AppState::new(registry));
//! axum::serve(listener, router).await?;
//! ```

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the canlink API router with the given application state
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Session lifecycle
        .route("/api/can/connect", post(handlers::session::connect))
        .route("/api/can/disconnect", post(handlers::session::disconnect))
        .route("/api/can/sessions", get(handlers::session::list_sessions))
        .route(
            "/api/can/sessions/{session_id}",
            get(handlers::session::get_session),
        )
        // Frames
        .route("/api/can/send", post(handlers::frames::send_frame))
        .route("/api/can/subscribe", get(handlers::subscribe::subscribe))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
