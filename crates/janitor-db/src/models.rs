/// Database row types — these map directly to SQLite rows.
/// Distinct from janitor-types models to keep the DB layer independent.

pub struct ChannelRow {
    pub id: i64,
    pub community_id: i64,
    pub name: String,
    pub kind: String,
    pub parent_id: Option<i64>,
}

pub struct MessageRow {
    pub id: i64,
    pub channel_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub content: String,
    pub kind: String,
    pub pinned: bool,
    pub created_at: i64,
}

pub struct ReactionRow {
    pub message_id: i64,
    pub user_id: i64,
    pub name: String,
    pub custom: bool,
}

/// Kinds accepted by the `messages.kind` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Default,
    System,
    ThreadStarter,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::System => "system",
            Self::ThreadStarter => "thread_starter",
        }
    }
}

/// Input for inserting a message row.
#[derive(Debug, Clone)]
pub struct NewMessage<'a> {
    pub channel_id: i64,
    pub author_id: i64,
    pub content: &'a str,
    pub kind: MessageKind,
    pub pinned: bool,
    pub created_at: i64,
}
