use chrono::Utc;
use tracing::{debug, error, warn};

use janitor_purge::{PurgeExecutor, notify};
use janitor_types::events::PlatformEvent;
use janitor_types::models::{ChannelId, CommunityId, MessageId, UserId};
use janitor_types::platform::PlatformError;

/// React to an event from the chat platform client. Every outcome is
/// logged; nothing here fails the caller.
pub async fn handle_event(executor: &PurgeExecutor, event: PlatformEvent) {
    if let Some(message) = event.lifecycle_message() {
        broadcast(executor, message).await;
        return;
    }

    match event {
        PlatformEvent::MemberRemoved {
            community_id,
            user_id,
            display_name,
        } => member_removed(executor, community_id, user_id, &display_name).await,
        PlatformEvent::ReactionAdded {
            community_id,
            container_id,
            message_id,
            user_id,
            emoji_name,
        } => {
            if let Err(e) =
                reaction_added(executor, community_id, container_id, message_id, user_id, &emoji_name).await
            {
                warn!(community = %community_id, message = %message_id, "Failed to audit saved post: {}", e);
            }
        }
        PlatformEvent::Ready | PlatformEvent::Resumed | PlatformEvent::Disconnected => {}
    }
}

/// Post to the log channel of every configured community.
async fn broadcast(executor: &PurgeExecutor, message: &str) {
    let communities = match executor.store().communities() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to read policies for lifecycle notice: {}", e);
            return;
        }
    };
    for (community, record) in &communities {
        notify::post_log(executor.platform().as_ref(), *community, record, message).await;
    }
}

async fn member_removed(executor: &PurgeExecutor, community: CommunityId, user: UserId, display_name: &str) {
    let record = match executor.store().get(community) {
        Ok(Some(record)) => record,
        Ok(None) => {
            debug!(%community, %user, "Member left unconfigured community");
            return;
        }
        Err(e) => {
            error!(%community, "Failed to read policy: {}", e);
            return;
        }
    };
    debug!(%community, %user, display_name, "Member left");
    let message = format!("<@{}> has left the server.", user);
    notify::post_notification(executor.platform().as_ref(), community, &record, &message).await;
}

async fn reaction_added(
    executor: &PurgeExecutor,
    community: CommunityId,
    container: ChannelId,
    message: MessageId,
    saver: UserId,
    emoji_name: &str,
) -> Result<(), PlatformError> {
    let Ok(Some(record)) = executor.store().get(community) else {
        return Ok(());
    };
    let marker = record.save_marker_name.as_deref().unwrap_or_default();
    if marker.is_empty() || marker != emoji_name {
        return Ok(());
    }

    let platform = executor.platform().as_ref();
    let Some(saved) = platform.fetch_message(container, message).await? else {
        debug!(%community, %message, "Saved message no longer exists");
        return Ok(());
    };
    let saver_name = platform
        .display_name(saver)
        .await?
        .unwrap_or_else(|| saver.to_string());
    let link = platform.message_link(community, container, message);

    let entry = format!(
        "**User {saver} saved post**\nOriginal Author: {author}\nSaved By: {saver}\nLink: {link}\nTime Saved: {time}",
        saver = saver_name,
        author = saved.author_name,
        link = link,
        time = Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
    );
    notify::post_log(platform, community, &record, &entry).await;
    Ok(())
}
