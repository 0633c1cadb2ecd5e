//! Operator command surface: JWT-protected HTTP routes over the purge
//! engine, the configuration wizard and the policy store.

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

pub mod commands;
pub mod error;
pub mod middleware;
pub mod notices;
pub mod permissions;
pub mod routes;
pub mod wizard;

use crate::commands::Commands;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub commands: Commands,
    pub jwt_secret: String,
}

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(routes::health));

    let protected_routes = Router::new()
        .route("/communities/{community_id}/purge", post(routes::trigger_purge))
        .route("/communities/{community_id}/policy", get(routes::get_policy))
        .route("/communities/{community_id}/wizard", post(routes::begin_wizard))
        .route("/communities/{community_id}/wizard/selections", post(routes::submit_selections))
        .route("/communities/{community_id}/wizard/details", post(routes::submit_details))
        .route(
            "/communities/{community_id}/delete-enabled",
            get(routes::get_enabled).put(routes::set_enabled),
        )
        .route("/communities/{community_id}/saved-messages/log", post(routes::log_saved_messages))
        .route("/events", post(routes::ingest_event))
        .layer(from_fn_with_state(state.clone(), middleware::require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
