use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use janitor_store::PolicyStore;
use janitor_types::models::{ChannelId, CommunityId, Container, MessageId, RetentionPolicy};
use janitor_types::platform::{ChatPlatform, HistoryCursor, PlatformError};

use crate::error::PurgeError;
use crate::filter;

/// Messages requested per history page.
pub const PAGE_SIZE: usize = 100;

/// Outcome of purging one community.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub age_limit_hours: u32,
    /// Messages deleted across every container that completed.
    pub deleted: usize,
    /// Messages older than the cutoff that were inspected.
    pub scanned: usize,
    /// Containers that failed and contributed nothing to `deleted`.
    pub failed_containers: Vec<ChannelId>,
}

#[derive(Debug, Default)]
struct ContainerStats {
    deleted: usize,
    scanned: usize,
}

struct ContainerFailure {
    /// Deleted before the failure; not counted in the report.
    deleted: usize,
    error: PlatformError,
}

/// Drives deletion across a community's containers.
///
/// Cheap to clone; clones share the per-community locks so two purges of the
/// same community never overlap.
#[derive(Clone)]
pub struct PurgeExecutor {
    platform: Arc<dyn ChatPlatform>,
    store: Arc<PolicyStore>,
    locks: Arc<Mutex<HashMap<CommunityId, Arc<tokio::sync::Mutex<()>>>>>,
}

impl PurgeExecutor {
    pub fn new(platform: Arc<dyn ChatPlatform>, store: Arc<PolicyStore>) -> Self {
        Self {
            platform,
            store,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn platform(&self) -> &Arc<dyn ChatPlatform> {
        &self.platform
    }

    pub fn store(&self) -> &Arc<PolicyStore> {
        &self.store
    }

    /// Purge one community using its stored policy. Callers check
    /// `enabled` first; this only requires the policy to be complete.
    pub async fn purge(&self, community: CommunityId) -> Result<PurgeReport, PurgeError> {
        self.purge_at(community, Utc::now()).await
    }

    pub async fn purge_at(&self, community: CommunityId, now: DateTime<Utc>) -> Result<PurgeReport, PurgeError> {
        let record = self
            .store
            .get(community)?
            .ok_or(PurgeError::PolicyAbsent(community))?;
        let policy = record
            .retention()
            .ok_or(PurgeError::PolicyIncomplete(community))?;
        let cutoff = policy.cutoff(now);

        let lock = self.community_lock(community);
        let _guard = lock.lock().await;

        let containers = self.platform.containers(community).await?;
        debug!(%community, containers = containers.len(), %cutoff, "Starting purge");

        let mut report = PurgeReport {
            age_limit_hours: policy.age_limit_hours,
            ..Default::default()
        };

        for container in &containers {
            match self.purge_container(container, &policy, cutoff).await {
                Ok(stats) => {
                    report.deleted += stats.deleted;
                    report.scanned += stats.scanned;
                }
                Err(failure) => {
                    warn!(
                        %community,
                        container = %container.id,
                        name = %container.name,
                        deleted_before_failure = failure.deleted,
                        "Error deleting messages in container: {}",
                        failure.error
                    );
                    report.failed_containers.push(container.id);
                }
            }
        }

        info!(
            %community,
            deleted = report.deleted,
            scanned = report.scanned,
            failed = report.failed_containers.len(),
            "Purge complete"
        );
        Ok(report)
    }

    async fn purge_container(
        &self,
        container: &Container,
        policy: &RetentionPolicy,
        cutoff: DateTime<Utc>,
    ) -> Result<ContainerStats, ContainerFailure> {
        let mut stats = ContainerStats::default();
        let mut cursor = HistoryCursor::before(cutoff);

        loop {
            let page = self
                .platform
                .history_before(container.id, cursor, PAGE_SIZE)
                .await
                .map_err(|error| ContainerFailure { deleted: stats.deleted, error })?;

            let Some(oldest) = page.last().map(HistoryCursor::after) else {
                break;
            };
            stats.scanned += page.len();

            let doomed: Vec<MessageId> = page
                .iter()
                .filter(|m| filter::is_expired(m, cutoff) && filter::should_delete(m, policy))
                .map(|m| m.id)
                .collect();

            if !doomed.is_empty() {
                stats.deleted += self
                    .platform
                    .delete_messages(container.id, &doomed)
                    .await
                    .map_err(|error| ContainerFailure { deleted: stats.deleted, error })?;
            }

            if page.len() < PAGE_SIZE {
                break;
            }
            cursor = oldest;
        }

        Ok(stats)
    }

    fn community_lock(&self, community: CommunityId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(community).or_default().clone()
    }
}
