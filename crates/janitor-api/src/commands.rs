use std::sync::Arc;

use tracing::{error, info};

use janitor_purge::{PurgeExecutor, notify, saved};
use janitor_types::api::{DetailsRequest, PurgeStatus, SelectionsRequest, WizardState};
use janitor_types::models::{CommunityId, PolicyRecord, UserId};

use crate::error::ApiError;
use crate::permissions;
use crate::wizard::ConfigWizard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeOutcome {
    Deleted(usize),
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Changed,
    /// The switch was already in the requested position.
    Unchanged,
}

/// Operator-facing operations. Route handlers call [`Commands::authorize`]
/// before anything else.
#[derive(Clone)]
pub struct Commands {
    executor: PurgeExecutor,
    wizard: Arc<ConfigWizard>,
}

impl Commands {
    pub fn new(executor: PurgeExecutor) -> Self {
        let wizard = Arc::new(ConfigWizard::new(executor.store().clone()));
        Self { executor, wizard }
    }

    pub fn with_wizard(executor: PurgeExecutor, wizard: ConfigWizard) -> Self {
        Self {
            executor,
            wizard: Arc::new(wizard),
        }
    }

    pub fn executor(&self) -> &PurgeExecutor {
        &self.executor
    }

    pub async fn authorize(&self, community: CommunityId, operator: UserId) -> Result<(), ApiError> {
        permissions::authorize(
            self.executor.store(),
            self.executor.platform().as_ref(),
            community,
            operator,
        )
        .await
    }

    /// Run a purge now and wait for it.
    pub async fn trigger_purge(&self, community: CommunityId) -> Result<PurgeOutcome, ApiError> {
        if !self.is_enabled(community)? {
            return Ok(PurgeOutcome::Disabled);
        }
        let report = self.executor.purge(community).await?;
        Ok(PurgeOutcome::Deleted(report.deleted))
    }

    /// Acknowledge a purge request and run it in the background. The result
    /// is posted to the community's log channel.
    pub fn spawn_purge(&self, community: CommunityId) -> Result<PurgeStatus, ApiError> {
        if !self.is_enabled(community)? {
            return Ok(PurgeStatus::Disabled);
        }

        let commands = self.clone();
        tokio::spawn(async move {
            let message = match commands.trigger_purge(community).await {
                Ok(PurgeOutcome::Deleted(n)) => format!("Deleted {} messages", n),
                Ok(PurgeOutcome::Disabled) => "Message deletion is disabled.".to_string(),
                Err(e) => {
                    error!(%community, "Command purge failed: {}", e);
                    format!("Clean-up failed: {}", e)
                }
            };
            commands.post_log(community, &message).await;
        });

        info!(%community, "Purge accepted");
        Ok(PurgeStatus::Accepted)
    }

    pub fn get_policy(&self, community: CommunityId) -> Result<Option<PolicyRecord>, ApiError> {
        Ok(self.executor.store().get(community)?)
    }

    pub fn is_enabled(&self, community: CommunityId) -> Result<bool, ApiError> {
        Ok(self
            .executor
            .store()
            .get(community)?
            .is_some_and(|r| r.is_enabled()))
    }

    pub fn set_enabled(&self, community: CommunityId, enabled: bool) -> Result<Toggle, ApiError> {
        let toggle = if self.executor.store().set_enabled(community, enabled)? {
            Toggle::Changed
        } else {
            Toggle::Unchanged
        };
        info!(%community, enabled, ?toggle, "Set message deletion");
        Ok(toggle)
    }

    pub fn begin_wizard(&self, community: CommunityId, operator: UserId) -> WizardState {
        self.wizard.begin(community, operator)
    }

    pub fn submit_selections(
        &self,
        community: CommunityId,
        operator: UserId,
        req: &SelectionsRequest,
    ) -> Result<WizardState, ApiError> {
        Ok(self.wizard.submit_selections(community, operator, req)?)
    }

    pub fn submit_details(
        &self,
        community: CommunityId,
        operator: UserId,
        req: &DetailsRequest,
    ) -> Result<WizardState, ApiError> {
        Ok(self.wizard.submit_details(community, operator, req)?)
    }

    pub async fn log_saved_messages(&self, community: CommunityId) -> Result<usize, ApiError> {
        Ok(saved::log_saved_messages(&self.executor, community).await?)
    }

    async fn post_log(&self, community: CommunityId, message: &str) {
        match self.executor.store().get(community) {
            Ok(Some(record)) => {
                notify::post_log(self.executor.platform().as_ref(), community, &record, message).await
            }
            Ok(None) => {}
            Err(e) => error!(%community, "Failed to read policy: {}", e),
        }
    }
}
