use serde::{Deserialize, Serialize};

use crate::models::{ChannelId, RoleId, UserId};

// -- JWT Claims --

/// Operator identity carried by bearer tokens. `sub` is the operator's
/// user id on the chat platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub username: String,
    pub exp: usize,
}

// -- Purge --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurgeStatus {
    /// Request acknowledged, purge running in the background
    Accepted,
    /// Deletion is switched off for this community
    Disabled,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PurgeResponse {
    pub status: PurgeStatus,
}

// -- Wizard --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardState {
    Select,
    Detail,
    Done,
}

/// First wizard step. Every field is required on submission; they are
/// optional here so a missing one can be reported instead of rejected by
/// the JSON extractor.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SelectionsRequest {
    pub moderator_role_id: Option<RoleId>,
    pub notification_channel_id: Option<ChannelId>,
    pub log_channel_id: Option<ChannelId>,
    pub delete_bot_messages: Option<bool>,
}

/// Second wizard step: raw text inputs.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DetailsRequest {
    pub save_marker_name: String,
    pub age_limit_hours: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WizardResponse {
    pub state: WizardState,
}

// -- Deletion switch --

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SetEnabledRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnabledResponse {
    pub enabled: bool,
    /// False when the switch was already in the requested position.
    pub changed: bool,
}

// -- Saved messages --

#[derive(Debug, Serialize, Deserialize)]
pub struct SavedMessagesResponse {
    pub logged: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
