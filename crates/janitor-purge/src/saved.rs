use chrono::Utc;
use tracing::{info, warn};

use janitor_types::models::{ChannelId, CommunityId, Container, ContainerKind, MessageDescriptor};
use janitor_types::platform::{ChatPlatform, HistoryCursor, PlatformError};

use crate::error::PurgeError;
use crate::executor::{PAGE_SIZE, PurgeExecutor};

const PREVIEW_CHARS: usize = 100;

/// Post a summary of every message carrying the save marker to the log
/// channel. Covers text channels and threads. Returns how many were logged;
/// a community with no stored policy has nothing to log.
pub async fn log_saved_messages(executor: &PurgeExecutor, community: CommunityId) -> Result<usize, PurgeError> {
    let Some(record) = executor.store().get(community)? else {
        return Ok(0);
    };
    let log_channel = record.log_channel_id.ok_or(PurgeError::NoLogChannel(community))?;
    let marker = record.save_marker_name.unwrap_or_default();
    if marker.is_empty() {
        return Ok(0);
    }

    let platform = executor.platform().as_ref();
    let containers = platform.containers(community).await?;

    let mut logged = 0;
    for container in containers.iter().filter(|c| c.kind != ContainerKind::Broadcast) {
        match scan_container(platform, community, container, &marker, log_channel).await {
            Ok(n) => logged += n,
            Err(e) => warn!(%community, container = %container.id, "Error scanning for saved messages: {}", e),
        }
    }

    info!(%community, logged, "Logged saved messages");
    Ok(logged)
}

async fn scan_container(
    platform: &dyn ChatPlatform,
    community: CommunityId,
    container: &Container,
    marker: &str,
    log_channel: ChannelId,
) -> Result<usize, PlatformError> {
    let mut logged = 0;
    let mut cursor = HistoryCursor::before(Utc::now());

    loop {
        let page = platform.history_before(container.id, cursor, PAGE_SIZE).await?;
        let Some(oldest) = page.last().map(HistoryCursor::after) else {
            break;
        };

        for msg in page.iter().filter(|m| m.has_marker(marker)) {
            let summary = saved_summary(platform, community, container, msg);
            platform.send_message(log_channel, &summary).await?;
            logged += 1;
        }

        if page.len() < PAGE_SIZE {
            break;
        }
        cursor = oldest;
    }

    Ok(logged)
}

fn saved_summary(
    platform: &dyn ChatPlatform,
    community: CommunityId,
    container: &Container,
    msg: &MessageDescriptor,
) -> String {
    format!(
        "**Saved post**\nLink: {}\nAuthor: {}\nChannel: {}\nContent Preview: {}",
        platform.message_link(community, container.id, msg.id),
        msg.author_name,
        container.name,
        msg.preview(PREVIEW_CHARS),
    )
}
