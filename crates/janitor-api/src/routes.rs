use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use janitor_types::api::{
    Claims, DetailsRequest, EnabledResponse, PurgeResponse, PurgeStatus, SavedMessagesResponse,
    SelectionsRequest, SetEnabledRequest, WizardResponse,
};
use janitor_types::events::PlatformEvent;
use janitor_types::models::CommunityId;

use crate::AppState;
use crate::commands::Toggle;
use crate::error::ApiError;
use crate::notices;

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "running" }))
}

pub async fn trigger_purge(
    State(state): State<AppState>,
    Path(community): Path<CommunityId>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    state.commands.authorize(community, claims.sub).await?;

    let status = state.commands.spawn_purge(community)?;
    let code = match status {
        PurgeStatus::Accepted => StatusCode::ACCEPTED,
        PurgeStatus::Disabled => StatusCode::OK,
    };
    Ok((code, Json(PurgeResponse { status })))
}

pub async fn get_policy(
    State(state): State<AppState>,
    Path(community): Path<CommunityId>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    state.commands.authorize(community, claims.sub).await?;
    Ok(Json(state.commands.get_policy(community)?))
}

pub async fn begin_wizard(
    State(state): State<AppState>,
    Path(community): Path<CommunityId>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    state.commands.authorize(community, claims.sub).await?;
    let next = state.commands.begin_wizard(community, claims.sub);
    Ok(Json(WizardResponse { state: next }))
}

pub async fn submit_selections(
    State(state): State<AppState>,
    Path(community): Path<CommunityId>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SelectionsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.commands.authorize(community, claims.sub).await?;
    let next = state.commands.submit_selections(community, claims.sub, &req)?;
    Ok(Json(WizardResponse { state: next }))
}

pub async fn submit_details(
    State(state): State<AppState>,
    Path(community): Path<CommunityId>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<DetailsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.commands.authorize(community, claims.sub).await?;
    let next = state.commands.submit_details(community, claims.sub, &req)?;
    Ok(Json(WizardResponse { state: next }))
}

pub async fn get_enabled(
    State(state): State<AppState>,
    Path(community): Path<CommunityId>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    state.commands.authorize(community, claims.sub).await?;
    Ok(Json(EnabledResponse {
        enabled: state.commands.is_enabled(community)?,
        changed: false,
    }))
}

pub async fn set_enabled(
    State(state): State<AppState>,
    Path(community): Path<CommunityId>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SetEnabledRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.commands.authorize(community, claims.sub).await?;
    let toggle = state.commands.set_enabled(community, req.enabled)?;
    Ok(Json(EnabledResponse {
        enabled: req.enabled,
        changed: toggle == Toggle::Changed,
    }))
}

pub async fn log_saved_messages(
    State(state): State<AppState>,
    Path(community): Path<CommunityId>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    state.commands.authorize(community, claims.sub).await?;
    let logged = state.commands.log_saved_messages(community).await?;
    Ok(Json(SavedMessagesResponse { logged }))
}

/// Events forwarded by the platform client. Only the service account may post them.
pub async fn ingest_event(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(event): Json<PlatformEvent>,
) -> Result<StatusCode, ApiError> {
    if claims.sub != state.commands.executor().platform().service_user() {
        return Err(ApiError::PermissionDenied);
    }
    notices::handle_event(state.commands.executor(), event).await;
    Ok(StatusCode::NO_CONTENT)
}
