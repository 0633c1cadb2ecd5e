//! In-memory chat platform shared by the purge integration tests.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use janitor_purge::PurgeExecutor;
use janitor_store::PolicyStore;
use janitor_types::models::{
    ChannelId, CommunityId, Container, ContainerKind, MessageDescriptor, MessageId, PolicyRecord, RoleId, UserId,
};
use janitor_types::platform::{ChatPlatform, HistoryCursor, PlatformError};

pub const COMMUNITY: CommunityId = CommunityId(1);
pub const SERVICE: UserId = UserId(900);
pub const LOG_CHANNEL: ChannelId = ChannelId(999);

#[derive(Default)]
struct State {
    containers: Vec<Container>,
    messages: HashMap<ChannelId, Vec<MessageDescriptor>>,
    failing: HashSet<ChannelId>,
    sent: Vec<(ChannelId, String)>,
    next_id: u64,
}

#[derive(Default)]
pub struct MemoryPlatform {
    state: Mutex<State>,
    /// Calls currently inside `containers`, and the most seen at once.
    listing: AtomicUsize,
    max_listing: AtomicUsize,
}

impl MemoryPlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_container(&self, id: u64, kind: ContainerKind) -> ChannelId {
        let mut state = self.state.lock().unwrap();
        let id = ChannelId(id);
        state.containers.push(Container {
            id,
            community_id: COMMUNITY,
            name: format!("channel-{}", id),
            kind,
            parent_id: None,
        });
        state.messages.entry(id).or_default();
        id
    }

    /// Insert a message and return its id; `edit` tweaks the defaults.
    pub fn add_message(
        &self,
        container: ChannelId,
        hours_ago: i64,
        edit: impl FnOnce(&mut MessageDescriptor),
    ) -> MessageId {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = MessageId(state.next_id);
        let mut msg = MessageDescriptor {
            id,
            container_id: container,
            author_id: UserId(10),
            author_name: "alice".into(),
            content: format!("message {}", id),
            timestamp: Utc::now() - Duration::hours(hours_ago),
            pinned: false,
            is_system_message: false,
            is_thread_starter: false,
            author_is_service: false,
            marker_names: BTreeSet::new(),
        };
        edit(&mut msg);
        state.messages.entry(container).or_default().push(msg);
        id
    }

    pub fn fail(&self, container: ChannelId) {
        self.state.lock().unwrap().failing.insert(container);
    }

    pub fn remaining(&self, container: ChannelId) -> Vec<MessageId> {
        let state = self.state.lock().unwrap();
        state.messages.get(&container).map(|m| m.iter().map(|m| m.id).collect()).unwrap_or_default()
    }

    pub fn sent(&self) -> Vec<(ChannelId, String)> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn max_concurrent_listings(&self) -> usize {
        self.max_listing.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatPlatform for MemoryPlatform {
    fn service_user(&self) -> UserId {
        SERVICE
    }

    async fn containers(&self, community: CommunityId) -> Result<Vec<Container>, PlatformError> {
        let now = self.listing.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_listing.fetch_max(now, Ordering::SeqCst);
        // Give any other caller a chance to run.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        self.listing.fetch_sub(1, Ordering::SeqCst);

        let state = self.state.lock().unwrap();
        Ok(state.containers.iter().filter(|c| c.community_id == community).cloned().collect())
    }

    async fn history_before(
        &self,
        container: ChannelId,
        cursor: HistoryCursor,
        limit: usize,
    ) -> Result<Vec<MessageDescriptor>, PlatformError> {
        let state = self.state.lock().unwrap();
        if state.failing.contains(&container) {
            return Err(PlatformError::Forbidden(format!("read history of {}", container)));
        }
        let mut page: Vec<MessageDescriptor> = state
            .messages
            .get(&container)
            .ok_or_else(|| PlatformError::NotFound(container.to_string()))?
            .iter()
            .filter(|m| cursor.covers(m.timestamp, m.id))
            .cloned()
            .collect();
        page.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
        page.truncate(limit);
        Ok(page)
    }

    async fn delete_messages(&self, container: ChannelId, ids: &[MessageId]) -> Result<usize, PlatformError> {
        let mut state = self.state.lock().unwrap();
        let messages = state
            .messages
            .get_mut(&container)
            .ok_or_else(|| PlatformError::NotFound(container.to_string()))?;
        let before = messages.len();
        messages.retain(|m| !ids.contains(&m.id));
        Ok(before - messages.len())
    }

    async fn fetch_message(
        &self,
        container: ChannelId,
        id: MessageId,
    ) -> Result<Option<MessageDescriptor>, PlatformError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .messages
            .get(&container)
            .and_then(|m| m.iter().find(|m| m.id == id).cloned()))
    }

    async fn send_message(&self, channel: ChannelId, content: &str) -> Result<MessageId, PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        state.sent.push((channel, content.to_string()));
        Ok(MessageId(state.next_id))
    }

    async fn member_roles(&self, _community: CommunityId, _user: UserId) -> Result<Vec<RoleId>, PlatformError> {
        Ok(Vec::new())
    }

    async fn display_name(&self, user: UserId) -> Result<Option<String>, PlatformError> {
        Ok(Some(format!("user-{}", user)))
    }

    fn message_link(&self, community: CommunityId, container: ChannelId, message: MessageId) -> String {
        format!("memory://{}/{}/{}", community, container, message)
    }
}

/// Executor over `platform` with a fresh policy file holding `record` for [`COMMUNITY`].
pub fn executor(platform: Arc<MemoryPlatform>, record: PolicyRecord) -> (tempfile::TempDir, PurgeExecutor) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(PolicyStore::open(dir.path().join("config.json")).unwrap());
    store.update(COMMUNITY, |r| *r = record).unwrap();
    (dir, PurgeExecutor::new(platform, store))
}

pub fn policy(age_limit_hours: u32, marker: &str, delete_bot_messages: bool) -> PolicyRecord {
    PolicyRecord {
        enabled: Some(true),
        age_limit_hours: Some(age_limit_hours),
        save_marker_name: Some(marker.to_string()),
        delete_bot_messages: Some(delete_bot_messages),
        log_channel_id: Some(LOG_CHANNEL),
        ..Default::default()
    }
}
