use tracing::{debug, warn};

use janitor_types::models::{ChannelId, CommunityId, PolicyRecord};
use janitor_types::platform::ChatPlatform;

/// Post to a community's log channel. Best effort: a missing channel or a
/// send failure is only traced.
pub async fn post_log(platform: &dyn ChatPlatform, community: CommunityId, record: &PolicyRecord, message: &str) {
    post(platform, community, record.log_channel_id, "log", message).await;
}

/// Post to a community's notification channel. Best effort, like [`post_log`].
pub async fn post_notification(
    platform: &dyn ChatPlatform,
    community: CommunityId,
    record: &PolicyRecord,
    message: &str,
) {
    post(platform, community, record.notification_channel_id, "notification", message).await;
}

async fn post(
    platform: &dyn ChatPlatform,
    community: CommunityId,
    channel: Option<ChannelId>,
    purpose: &str,
    message: &str,
) {
    let Some(channel) = channel else {
        debug!(%community, "No {} channel configured, dropping: {}", purpose, message);
        return;
    };
    if let Err(e) = platform.send_message(channel, message).await {
        warn!(%community, %channel, "Failed to post to {} channel: {}", purpose, e);
    }
}
