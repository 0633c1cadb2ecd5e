use serde::{Deserialize, Serialize};

use crate::models::{ChannelId, CommunityId, MessageId, UserId};

/// Events delivered by the chat platform client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PlatformEvent {
    /// Client finished connecting
    Ready,

    /// Client reconnected after a drop
    Resumed,

    /// Client lost its connection
    Disconnected,

    /// A member left a community
    MemberRemoved {
        community_id: CommunityId,
        user_id: UserId,
        display_name: String,
    },

    /// A reaction was added to a message
    ReactionAdded {
        community_id: CommunityId,
        container_id: ChannelId,
        message_id: MessageId,
        user_id: UserId,
        emoji_name: String,
    },
}

impl PlatformEvent {
    /// Lifecycle events are broadcast to every configured community's log channel.
    pub fn lifecycle_message(&self) -> Option<&'static str> {
        match self {
            Self::Ready => Some("Retention service is ready and running."),
            Self::Resumed => Some("Retention service has reconnected."),
            Self::Disconnected => Some("Retention service has disconnected."),
            _ => None,
        }
    }
}
