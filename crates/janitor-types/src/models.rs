use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

snowflake_id!(
    /// A served chat community (guild).
    CommunityId
);
snowflake_id!(
    /// Any addressable message stream: text channel, broadcast channel or thread.
    ChannelId
);
snowflake_id!(MessageId);
snowflake_id!(UserId);
snowflake_id!(RoleId);

/// Per-community policy as persisted.
///
/// Every field is optional: the configuration wizard writes the record in two
/// halves and an abandoned run leaves a partial record behind. Use the
/// accessors to get the permissive defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub enabled: Option<bool>,
    pub age_limit_hours: Option<u32>,
    pub save_marker_name: Option<String>,
    pub delete_bot_messages: Option<bool>,
    pub moderator_role_id: Option<RoleId>,
    pub notification_channel_id: Option<ChannelId>,
    pub log_channel_id: Option<ChannelId>,
}

impl PolicyRecord {
    /// Purge is off unless explicitly switched on.
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    /// Resolve the fields the purge path needs.
    /// Returns `None` while the age limit has never been configured.
    pub fn retention(&self) -> Option<RetentionPolicy> {
        let age_limit_hours = self.age_limit_hours.filter(|h| *h > 0)?;
        Some(RetentionPolicy {
            age_limit_hours,
            save_marker_name: self.save_marker_name.clone().unwrap_or_default(),
            delete_bot_messages: self.delete_bot_messages.unwrap_or(false),
        })
    }

    /// Merge the selection step of the wizard, leaving every other field alone.
    pub fn apply_selections(&mut self, selections: &Selections) {
        self.moderator_role_id = Some(selections.moderator_role_id);
        self.notification_channel_id = Some(selections.notification_channel_id);
        self.log_channel_id = Some(selections.log_channel_id);
        self.delete_bot_messages = Some(selections.delete_bot_messages);
    }

    /// Merge the free-text step of the wizard, leaving every other field alone.
    pub fn apply_details(&mut self, details: &Details) {
        self.save_marker_name = Some(details.save_marker_name.clone());
        self.age_limit_hours = Some(details.age_limit_hours);
    }
}

/// Validated output of the wizard's selection step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selections {
    pub moderator_role_id: RoleId,
    pub notification_channel_id: ChannelId,
    pub log_channel_id: ChannelId,
    pub delete_bot_messages: bool,
}

/// Validated output of the wizard's free-text step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Details {
    pub save_marker_name: String,
    pub age_limit_hours: u32,
}

/// The subset of a policy that decides what a purge may delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Stored in hours, whatever older documentation says about days.
    pub age_limit_hours: u32,
    pub save_marker_name: String,
    pub delete_bot_messages: bool,
}

impl RetentionPolicy {
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::hours(i64::from(self.age_limit_hours))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    Text,
    /// Voice/stage style channels that also carry a message stream.
    Broadcast,
    Thread,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub id: ChannelId,
    pub community_id: CommunityId,
    pub name: String,
    pub kind: ContainerKind,
    /// Set for threads only.
    pub parent_id: Option<ChannelId>,
}

/// What the retention engine knows about a single message.
/// Never persisted by this service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDescriptor {
    pub id: MessageId,
    pub container_id: ChannelId,
    pub author_id: UserId,
    pub author_name: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub pinned: bool,
    pub is_system_message: bool,
    pub is_thread_starter: bool,
    /// Authored by the running service's own account.
    pub author_is_service: bool,
    /// Names of custom reaction markers currently attached.
    pub marker_names: BTreeSet<String>,
}

impl MessageDescriptor {
    pub fn has_marker(&self, name: &str) -> bool {
        !name.is_empty() && self.marker_names.contains(name)
    }

    /// First `max_chars` characters of the content, split on a char boundary.
    pub fn preview(&self, max_chars: usize) -> &str {
        match self.content.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.content[..idx],
            None => &self.content,
        }
    }
}
