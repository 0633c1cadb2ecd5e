use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use janitor_purge::PurgeError;
use janitor_store::StoreError;
use janitor_types::api::{ErrorResponse, WizardState};
use janitor_types::models::CommunityId;
use janitor_types::platform::PlatformError;

use crate::wizard::WizardError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("you do not have permission to use this command")]
    PermissionDenied,
    #[error("{0}")]
    InvalidInput(String),
    #[error("no configuration session in progress, start the wizard first")]
    NoSession,
    #[error("configuration session is at the {0:?} step")]
    WrongState(WizardState),
    #[error("community {0} has not been configured, run the setup wizard first")]
    NotConfigured(CommunityId),
    #[error("community {0} has no age limit configured, finish the setup wizard")]
    PolicyIncomplete(CommunityId),
    #[error("community {0} has no log channel configured")]
    NoLogChannel(CommunityId),
    #[error("failed to save configuration")]
    Persistence(#[source] StoreError),
    #[error("chat platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Persistence(e)
    }
}

impl From<WizardError> for ApiError {
    fn from(e: WizardError) -> Self {
        match e {
            WizardError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            WizardError::NoSession => ApiError::NoSession,
            WizardError::WrongState(state) => ApiError::WrongState(state),
            WizardError::Persistence(e) => ApiError::Persistence(e),
        }
    }
}

impl From<PurgeError> for ApiError {
    fn from(e: PurgeError) -> Self {
        match e {
            PurgeError::PolicyAbsent(c) => ApiError::NotConfigured(c),
            PurgeError::PolicyIncomplete(c) => ApiError::PolicyIncomplete(c),
            PurgeError::NoLogChannel(c) => ApiError::NoLogChannel(c),
            PurgeError::Store(e) => ApiError::Persistence(e),
            PurgeError::Platform(e) => ApiError::Platform(e),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::PermissionDenied => StatusCode::FORBIDDEN,
            ApiError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NoSession | ApiError::WrongState(_) => StatusCode::CONFLICT,
            ApiError::NotConfigured(_) | ApiError::PolicyIncomplete(_) | ApiError::NoLogChannel(_) => {
                StatusCode::CONFLICT
            }
            ApiError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Platform(PlatformError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Platform(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Persistence(e) => error!("Policy store failure: {}", e),
            ApiError::Platform(e) => warn!("Chat platform failure: {}", e),
            _ => {}
        }
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}
