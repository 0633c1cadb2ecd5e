use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{ChannelId, CommunityId, Container, MessageDescriptor, MessageId, RoleId, UserId};

/// Errors surfaced by the chat platform client.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("missing permission: {0}")]
    Forbidden(String),
    #[error("platform error: {0}")]
    Backend(String),
}

/// Position in a container's history, exclusive.
///
/// History is ordered by `(timestamp, id)`. A cursor without an id covers
/// everything strictly older than `timestamp`; with an id it also covers the
/// messages sharing `timestamp` whose id is lower, so paging never skips ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryCursor {
    pub timestamp: DateTime<Utc>,
    pub before_id: Option<MessageId>,
}

impl HistoryCursor {
    pub fn before(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            before_id: None,
        }
    }

    /// The cursor just past `msg`, for fetching the next older page.
    pub fn after(msg: &MessageDescriptor) -> Self {
        Self {
            timestamp: msg.timestamp,
            before_id: Some(msg.id),
        }
    }

    /// Whether a message at `(timestamp, id)` lies beyond this cursor.
    pub fn covers(&self, timestamp: DateTime<Utc>, id: MessageId) -> bool {
        match self.before_id {
            Some(before_id) => (timestamp, id) < (self.timestamp, before_id),
            None => timestamp < self.timestamp,
        }
    }
}

/// The slice of the chat platform the retention service talks to.
///
/// Implementations decide how messages are fetched and deleted; the purge
/// engine only relies on `history_before` returning the messages covered by
/// the cursor, newest first by `(timestamp, id)`.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// The account this service runs as.
    fn service_user(&self) -> UserId;

    /// Every container of a community: text channels, broadcast channels and threads.
    async fn containers(&self, community: CommunityId) -> Result<Vec<Container>, PlatformError>;

    async fn history_before(
        &self,
        container: ChannelId,
        cursor: HistoryCursor,
        limit: usize,
    ) -> Result<Vec<MessageDescriptor>, PlatformError>;

    /// Delete messages from one container. Returns how many were removed.
    async fn delete_messages(
        &self,
        container: ChannelId,
        ids: &[MessageId],
    ) -> Result<usize, PlatformError>;

    async fn fetch_message(
        &self,
        container: ChannelId,
        id: MessageId,
    ) -> Result<Option<MessageDescriptor>, PlatformError>;

    async fn send_message(&self, channel: ChannelId, content: &str) -> Result<MessageId, PlatformError>;

    async fn member_roles(
        &self,
        community: CommunityId,
        user: UserId,
    ) -> Result<Vec<RoleId>, PlatformError>;

    async fn display_name(&self, user: UserId) -> Result<Option<String>, PlatformError>;

    /// Stable link to a message, used in audit entries.
    fn message_link(&self, community: CommunityId, container: ChannelId, message: MessageId) -> String;
}
