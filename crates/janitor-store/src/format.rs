//! On-disk layout of the policy file.
//!
//! ```json
//! { "GUILDS": { "<community id>": { "DELETE_ENABLED": true, "MESSAGE_AGE_LIMIT": 48, ... } } }
//! ```
//!
//! Older writers stored flags as the strings `"True"`/`"False"` and ids as
//! either numbers or strings. Both are accepted on load; everything is written
//! back as native JSON booleans and numbers.

use std::collections::BTreeMap;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use janitor_types::models::{ChannelId, PolicyRecord, RoleId};

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct PolicyFile {
    #[serde(rename = "GUILDS", default)]
    pub guilds: BTreeMap<String, StoredPolicy>,

    /// Top-level keys this service does not own (tokens, comments) survive rewrites.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct StoredPolicy {
    #[serde(rename = "DELETE_ENABLED", default, deserialize_with = "lenient_bool", skip_serializing_if = "Option::is_none")]
    enabled: Option<bool>,
    #[serde(rename = "MOD_ROLE", default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    moderator_role_id: Option<u64>,
    #[serde(rename = "NOTIFICATIONS_CHANNEL", default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    notification_channel_id: Option<u64>,
    #[serde(rename = "BOT_LOGS_CHANNEL", default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    log_channel_id: Option<u64>,
    #[serde(rename = "SAVE_EMOJI_NAME", default, skip_serializing_if = "Option::is_none")]
    save_marker_name: Option<String>,
    #[serde(rename = "MESSAGE_AGE_LIMIT", default, deserialize_with = "lenient_u64", skip_serializing_if = "Option::is_none")]
    age_limit_hours: Option<u64>,
    #[serde(rename = "DELETE_BOT_MESSAGES", default, deserialize_with = "lenient_bool", skip_serializing_if = "Option::is_none")]
    delete_bot_messages: Option<bool>,
}

impl StoredPolicy {
    pub fn into_record(self) -> PolicyRecord {
        PolicyRecord {
            enabled: self.enabled,
            age_limit_hours: self.age_limit_hours.and_then(|h| u32::try_from(h).ok()),
            save_marker_name: self.save_marker_name,
            delete_bot_messages: self.delete_bot_messages,
            moderator_role_id: self.moderator_role_id.map(RoleId),
            notification_channel_id: self.notification_channel_id.map(ChannelId),
            log_channel_id: self.log_channel_id.map(ChannelId),
        }
    }
}

impl From<&PolicyRecord> for StoredPolicy {
    fn from(record: &PolicyRecord) -> Self {
        Self {
            enabled: record.enabled,
            moderator_role_id: record.moderator_role_id.map(RoleId::get),
            notification_channel_id: record.notification_channel_id.map(ChannelId::get),
            log_channel_id: record.log_channel_id.map(ChannelId::get),
            save_marker_name: record.save_marker_name.clone(),
            age_limit_hours: record.age_limit_hours.map(u64::from),
            delete_bot_messages: record.delete_bot_messages,
        }
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(other) => Err(de::Error::custom(format!("expected a boolean, got {}", other))),
    }
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected an unsigned integer, got {}", n))),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected an unsigned integer, got {:?}", s))),
        Some(other) => Err(de::Error::custom(format!("expected an unsigned integer, got {}", other))),
    }
}
