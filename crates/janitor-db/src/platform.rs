use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{error, warn};

use janitor_types::models::{
    ChannelId, CommunityId, Container, ContainerKind, MessageDescriptor, MessageId, RoleId, UserId,
};
use janitor_types::platform::{ChatPlatform, HistoryCursor, PlatformError};

use crate::Database;
use crate::models::{ChannelRow, MessageKind, MessageRow, NewMessage, ReactionRow};

/// [`ChatPlatform`] over the local chat database.
///
/// Every query runs on the blocking pool so a long purge never stalls the
/// async runtime.
#[derive(Clone)]
pub struct DbPlatform {
    db: Arc<Database>,
    service_user: UserId,
    link_base: String,
}

impl DbPlatform {
    pub fn new(db: Arc<Database>, service_user: UserId, link_base: impl Into<String>) -> Self {
        Self {
            db,
            service_user,
            link_base: link_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    async fn blocking<F, T>(&self, f: F) -> Result<T, PlatformError>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                PlatformError::Backend(e.to_string())
            })?
            .map_err(|e| PlatformError::Backend(e.to_string()))
    }

    fn describe(&self, row: MessageRow, reactions: &HashMap<i64, BTreeSet<String>>) -> MessageDescriptor {
        MessageDescriptor {
            id: MessageId(row.id as u64),
            container_id: ChannelId(row.channel_id as u64),
            author_id: UserId(row.author_id as u64),
            author_is_service: row.author_id as u64 == self.service_user.get(),
            author_name: row.author_name,
            content: row.content,
            timestamp: DateTime::from_timestamp_millis(row.created_at).unwrap_or_else(|| {
                warn!("Corrupt created_at {} on message {}", row.created_at, row.id);
                DateTime::default()
            }),
            pinned: row.pinned,
            is_system_message: row.kind == MessageKind::System.as_str(),
            is_thread_starter: row.kind == MessageKind::ThreadStarter.as_str(),
            marker_names: reactions.get(&row.id).cloned().unwrap_or_default(),
        }
    }
}

/// Only custom reactions act as markers; unicode emoji never exempt a message.
fn group_markers(rows: Vec<ReactionRow>) -> HashMap<i64, BTreeSet<String>> {
    let mut map: HashMap<i64, BTreeSet<String>> = HashMap::new();
    for r in rows.into_iter().filter(|r| r.custom) {
        map.entry(r.message_id).or_default().insert(r.name);
    }
    map
}

/// Cursor as stored columns. Timestamps are kept in whole milliseconds, so an
/// open cursor rounds up to include rows within its final millisecond; the
/// purge path filters those against the exact cutoff.
fn cursor_bounds(cursor: &HistoryCursor) -> (i64, Option<i64>) {
    let ms = cursor.timestamp.timestamp_millis();
    match cursor.before_id {
        Some(id) => (ms, Some(id.get() as i64)),
        None if cursor.timestamp.timestamp_subsec_nanos() % 1_000_000 != 0 => (ms + 1, None),
        None => (ms, None),
    }
}

fn to_container(row: ChannelRow) -> Option<Container> {
    let kind = match row.kind.as_str() {
        "text" => ContainerKind::Text,
        "broadcast" => ContainerKind::Broadcast,
        "thread" => ContainerKind::Thread,
        other => {
            warn!("Unknown channel kind '{}' on channel {}", other, row.id);
            return None;
        }
    };
    Some(Container {
        id: ChannelId(row.id as u64),
        community_id: CommunityId(row.community_id as u64),
        name: row.name,
        kind,
        parent_id: row.parent_id.map(|p| ChannelId(p as u64)),
    })
}

#[async_trait]
impl ChatPlatform for DbPlatform {
    fn service_user(&self) -> UserId {
        self.service_user
    }

    async fn containers(&self, community: CommunityId) -> Result<Vec<Container>, PlatformError> {
        let cid = community.get() as i64;
        let rows = self.blocking(move |db| db.get_channels(cid)).await?;
        Ok(rows.into_iter().filter_map(to_container).collect())
    }

    async fn history_before(
        &self,
        container: ChannelId,
        cursor: HistoryCursor,
        limit: usize,
    ) -> Result<Vec<MessageDescriptor>, PlatformError> {
        let channel_id = container.get() as i64;
        let (before_ms, before_id) = cursor_bounds(&cursor);
        let limit = u32::try_from(limit).unwrap_or(u32::MAX);

        let (rows, reactions) = self
            .blocking(move |db| {
                if !db.channel_exists(channel_id)? {
                    return Ok(None);
                }
                let rows = db.get_messages_before(channel_id, before_ms, before_id, limit)?;
                let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
                let reactions = db.get_reactions_for_messages(&ids)?;
                Ok(Some((rows, reactions)))
            })
            .await?
            .ok_or_else(|| PlatformError::NotFound(format!("channel {}", container)))?;

        let markers = group_markers(reactions);
        Ok(rows.into_iter().map(|row| self.describe(row, &markers)).collect())
    }

    async fn delete_messages(
        &self,
        container: ChannelId,
        ids: &[MessageId],
    ) -> Result<usize, PlatformError> {
        let channel_id = container.get() as i64;
        let ids: Vec<i64> = ids.iter().map(|id| id.get() as i64).collect();
        self.blocking(move |db| db.delete_messages(channel_id, &ids)).await
    }

    async fn fetch_message(
        &self,
        container: ChannelId,
        id: MessageId,
    ) -> Result<Option<MessageDescriptor>, PlatformError> {
        let channel_id = container.get() as i64;
        let message_id = id.get() as i64;
        let found = self
            .blocking(move |db| {
                let Some(row) = db.get_message(channel_id, message_id)? else {
                    return Ok(None);
                };
                let reactions = db.get_reactions_for_messages(&[row.id])?;
                Ok(Some((row, reactions)))
            })
            .await?;

        Ok(found.map(|(row, reactions)| self.describe(row, &group_markers(reactions))))
    }

    async fn send_message(&self, channel: ChannelId, content: &str) -> Result<MessageId, PlatformError> {
        let channel_id = channel.get() as i64;
        let author_id = self.service_user.get() as i64;
        let content = content.to_string();
        let id = self
            .blocking(move |db| {
                if !db.channel_exists(channel_id)? {
                    return Ok(None);
                }
                db.insert_message(&NewMessage {
                    channel_id,
                    author_id,
                    content: &content,
                    kind: MessageKind::Default,
                    pinned: false,
                    created_at: Utc::now().timestamp_millis(),
                })
                .map(Some)
            })
            .await?
            .ok_or_else(|| PlatformError::NotFound(format!("channel {}", channel)))?;
        Ok(MessageId(id as u64))
    }

    async fn member_roles(
        &self,
        community: CommunityId,
        user: UserId,
    ) -> Result<Vec<RoleId>, PlatformError> {
        let cid = community.get() as i64;
        let uid = user.get() as i64;
        let roles = self.blocking(move |db| db.get_member_roles(cid, uid)).await?;
        Ok(roles.into_iter().map(|r| RoleId(r as u64)).collect())
    }

    async fn display_name(&self, user: UserId) -> Result<Option<String>, PlatformError> {
        let uid = user.get() as i64;
        self.blocking(move |db| db.get_display_name(uid)).await
    }

    fn message_link(&self, community: CommunityId, container: ChannelId, message: MessageId) -> String {
        format!("{}/channels/{}/{}/{}", self.link_base, community, container, message)
    }
}
