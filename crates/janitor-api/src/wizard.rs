use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::info;

use janitor_store::{PolicyStore, StoreError};
use janitor_types::api::{DetailsRequest, SelectionsRequest, WizardState};
use janitor_types::models::{CommunityId, Details, Selections, UserId};

/// How long an operator may leave a session idle between steps.
pub const SESSION_TTL_MINUTES: i64 = 15;

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no configuration session in progress")]
    NoSession,
    #[error("configuration session is at the {0:?} step")]
    WrongState(WizardState),
    #[error("failed to save configuration: {0}")]
    Persistence(#[from] StoreError),
}

#[derive(Debug, Clone, Copy)]
struct Session {
    state: WizardState,
    touched_at: DateTime<Utc>,
}

/// Two-step configuration flow, one session per (community, operator).
///
/// `Select` collects the four structured choices, `Detail` the two free-text
/// values. Each step merges only its own fields into the community's record
/// and persists once.
pub struct ConfigWizard {
    store: Arc<PolicyStore>,
    ttl: Duration,
    sessions: Mutex<HashMap<(CommunityId, UserId), Session>>,
}

impl ConfigWizard {
    pub fn new(store: Arc<PolicyStore>) -> Self {
        Self::with_ttl(store, Duration::minutes(SESSION_TTL_MINUTES))
    }

    pub fn with_ttl(store: Arc<PolicyStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Start (or restart) a session in the `Select` state.
    pub fn begin(&self, community: CommunityId, operator: UserId) -> WizardState {
        self.lock().insert(
            (community, operator),
            Session {
                state: WizardState::Select,
                touched_at: Utc::now(),
            },
        );
        WizardState::Select
    }

    pub fn state(&self, community: CommunityId, operator: UserId) -> Option<WizardState> {
        let mut sessions = self.lock();
        self.live_session(&mut sessions, community, operator).map(|s| s.state)
    }

    pub fn submit_selections(
        &self,
        community: CommunityId,
        operator: UserId,
        req: &SelectionsRequest,
    ) -> Result<WizardState, WizardError> {
        let mut sessions = self.lock();
        let session = self
            .live_session(&mut sessions, community, operator)
            .ok_or(WizardError::NoSession)?;
        if session.state != WizardState::Select {
            return Err(WizardError::WrongState(session.state));
        }

        let selections = validate_selections(req)?;
        self.store
            .update(community, |record| record.apply_selections(&selections))?;
        info!(%community, %operator, "Saved configuration selections");

        session.state = WizardState::Detail;
        session.touched_at = Utc::now();
        Ok(WizardState::Detail)
    }

    pub fn submit_details(
        &self,
        community: CommunityId,
        operator: UserId,
        req: &DetailsRequest,
    ) -> Result<WizardState, WizardError> {
        let mut sessions = self.lock();
        let session = self
            .live_session(&mut sessions, community, operator)
            .ok_or(WizardError::NoSession)?;
        if session.state != WizardState::Detail {
            return Err(WizardError::WrongState(session.state));
        }

        let details = validate_details(req)?;
        self.store
            .update(community, |record| record.apply_details(&details))?;
        info!(%community, %operator, "Saved configuration details");

        sessions.remove(&(community, operator));
        Ok(WizardState::Done)
    }

    /// The caller's session, dropping it first if it has gone stale.
    fn live_session<'a>(
        &self,
        sessions: &'a mut HashMap<(CommunityId, UserId), Session>,
        community: CommunityId,
        operator: UserId,
    ) -> Option<&'a mut Session> {
        let key = (community, operator);
        let expired = sessions
            .get(&key)
            .is_some_and(|s| Utc::now() - s.touched_at >= self.ttl);
        if expired {
            sessions.remove(&key);
        }
        sessions.get_mut(&key)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(CommunityId, UserId), Session>> {
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub fn validate_selections(req: &SelectionsRequest) -> Result<Selections, WizardError> {
    let mut missing = Vec::new();
    if req.moderator_role_id.is_none() {
        missing.push("moderator role");
    }
    if req.notification_channel_id.is_none() {
        missing.push("notifications channel");
    }
    if req.log_channel_id.is_none() {
        missing.push("bot logs channel");
    }
    if req.delete_bot_messages.is_none() {
        missing.push("delete bot messages");
    }

    match (
        req.moderator_role_id,
        req.notification_channel_id,
        req.log_channel_id,
        req.delete_bot_messages,
    ) {
        (Some(moderator_role_id), Some(notification_channel_id), Some(log_channel_id), Some(delete_bot_messages)) => {
            Ok(Selections {
                moderator_role_id,
                notification_channel_id,
                log_channel_id,
                delete_bot_messages,
            })
        }
        _ => Err(WizardError::InvalidInput(format!(
            "a selection is required for each of: {}",
            missing.join(", ")
        ))),
    }
}

pub fn validate_details(req: &DetailsRequest) -> Result<Details, WizardError> {
    let save_marker_name = req.save_marker_name.trim();
    if save_marker_name.is_empty() {
        return Err(WizardError::InvalidInput("save emoji name must not be empty".into()));
    }

    let hours: i64 = req.age_limit_hours.trim().parse().map_err(|_| {
        WizardError::InvalidInput("message age limit must be a whole number of hours".into())
    })?;
    let age_limit_hours = u32::try_from(hours)
        .ok()
        .filter(|h| *h > 0)
        .ok_or_else(|| WizardError::InvalidInput("message age limit must be a positive number of hours".into()))?;

    Ok(Details {
        save_marker_name: save_marker_name.to_string(),
        age_limit_hours,
    })
}
