use crate::Database;
use crate::models::{ChannelRow, MessageRow, NewMessage, ReactionRow};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

impl Database {
    // -- Communities, users, roles --

    pub fn create_community(&self, id: i64, name: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO communities (id, name) VALUES (?1, ?2)",
                rusqlite::params![id, name],
            )?;
            Ok(())
        })
    }

    pub fn create_user(&self, id: i64, username: &str, display_name: Option<&str>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, display_name) VALUES (?1, ?2, ?3)",
                rusqlite::params![id, username, display_name],
            )?;
            Ok(())
        })
    }

    pub fn get_display_name(&self, user_id: i64) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let name = conn
                .query_row(
                    "SELECT COALESCE(display_name, username) FROM users WHERE id = ?1",
                    [user_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(name)
        })
    }

    pub fn assign_role(&self, community_id: i64, user_id: i64, role_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO member_roles (community_id, user_id, role_id) VALUES (?1, ?2, ?3)",
                rusqlite::params![community_id, user_id, role_id],
            )?;
            Ok(())
        })
    }

    pub fn get_member_roles(&self, community_id: i64, user_id: i64) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT role_id FROM member_roles WHERE community_id = ?1 AND user_id = ?2",
            )?;
            let roles = stmt
                .query_map(rusqlite::params![community_id, user_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<i64>, _>>()?;
            Ok(roles)
        })
    }

    // -- Channels --

    pub fn create_channel(
        &self,
        id: i64,
        community_id: i64,
        name: &str,
        kind: &str,
        parent_id: Option<i64>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO channels (id, community_id, name, kind, parent_id) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, community_id, name, kind, parent_id],
            )?;
            Ok(())
        })
    }

    /// Channels first, then threads, each in id order.
    pub fn get_channels(&self, community_id: i64) -> Result<Vec<ChannelRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, community_id, name, kind, parent_id FROM channels
                 WHERE community_id = ?1
                 ORDER BY parent_id IS NOT NULL, id",
            )?;
            let rows = stmt
                .query_map([community_id], |row| {
                    Ok(ChannelRow {
                        id: row.get(0)?,
                        community_id: row.get(1)?,
                        name: row.get(2)?,
                        kind: row.get(3)?,
                        parent_id: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn channel_exists(&self, channel_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row("SELECT 1 FROM channels WHERE id = ?1", [channel_id], |_| Ok(()))
                .optional()?;
            Ok(found.is_some())
        })
    }

    // -- Messages --

    pub fn insert_message(&self, msg: &NewMessage<'_>) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (channel_id, author_id, content, kind, pinned, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    msg.channel_id,
                    msg.author_id,
                    msg.content,
                    msg.kind.as_str(),
                    msg.pinned,
                    msg.created_at
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Messages before the `(before_ms, before_id)` position, newest first.
    /// Without an id only rows strictly older than `before_ms` qualify.
    pub fn get_messages_before(
        &self,
        channel_id: i64,
        before_ms: i64,
        before_id: Option<i64>,
        limit: u32,
    ) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_messages_before(conn, channel_id, before_ms, before_id, limit))
    }

    pub fn get_message(&self, channel_id: i64, message_id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{} WHERE m.channel_id = ?1 AND m.id = ?2", MESSAGE_SELECT))?;
            let row = stmt
                .query_row(rusqlite::params![channel_id, message_id], map_message)
                .optional()?;
            Ok(row)
        })
    }

    /// Delete the given messages from one channel. Ids that belong to another
    /// channel are left alone. Returns the number of rows removed.
    pub fn delete_messages(&self, channel_id: i64, message_ids: &[i64]) -> Result<usize> {
        if message_ids.is_empty() {
            return Ok(0);
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut deleted = 0;
            {
                let mut stmt = tx.prepare("DELETE FROM messages WHERE channel_id = ?1 AND id = ?2")?;
                for id in message_ids {
                    deleted += stmt.execute(rusqlite::params![channel_id, id])?;
                }
            }
            tx.commit()?;
            Ok(deleted)
        })
    }

    pub fn count_messages(&self, channel_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE channel_id = ?1",
                [channel_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }

    /// Newest message content in a channel, if any.
    pub fn get_latest_content(&self, channel_id: i64) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let content = conn
                .query_row(
                    "SELECT content FROM messages WHERE channel_id = ?1 ORDER BY id DESC LIMIT 1",
                    [channel_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(content)
        })
    }

    pub fn set_pinned(&self, message_id: i64, pinned: bool) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE messages SET pinned = ?2 WHERE id = ?1",
                rusqlite::params![message_id, pinned],
            )?;
            Ok(())
        })
    }

    // -- Reactions --

    pub fn add_reaction(&self, message_id: i64, user_id: i64, name: &str, custom: bool) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO reactions (message_id, user_id, name, custom) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![message_id, user_id, name, custom],
            )?;
            Ok(())
        })
    }

    /// Batch-fetch reactions for a set of message ids.
    pub fn get_reactions_for_messages(&self, message_ids: &[i64]) -> Result<Vec<ReactionRow>> {
        if message_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> = (1..=message_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT message_id, user_id, name, custom FROM reactions WHERE message_id IN ({})",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(message_ids.iter()), |row| {
                    Ok(ReactionRow {
                        message_id: row.get(0)?,
                        user_id: row.get(1)?,
                        name: row.get(2)?,
                        custom: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

const MESSAGE_SELECT: &str = "SELECT m.id, m.channel_id, m.author_id,
        COALESCE(u.display_name, u.username), m.content, m.kind, m.pinned, m.created_at
     FROM messages m
     LEFT JOIN users u ON m.author_id = u.id";

fn map_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        channel_id: row.get(1)?,
        author_id: row.get(2)?,
        author_name: row.get::<_, Option<String>>(3)?.unwrap_or_else(|| "unknown".to_string()),
        content: row.get(4)?,
        kind: row.get(5)?,
        pinned: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn query_messages_before(
    conn: &Connection,
    channel_id: i64,
    before_ms: i64,
    before_id: Option<i64>,
    limit: u32,
) -> Result<Vec<MessageRow>> {
    // JOIN users to fetch the author name in a single query
    let mut stmt = conn.prepare(&format!(
        "{} WHERE m.channel_id = ?1
           AND (m.created_at < ?2 OR (m.created_at = ?2 AND m.id < ?3))
         ORDER BY m.created_at DESC, m.id DESC
         LIMIT ?4",
        MESSAGE_SELECT
    ))?;

    // No id means no ties qualify.
    let before_id = before_id.unwrap_or(i64::MIN);
    let rows = stmt
        .query_map(rusqlite::params![channel_id, before_ms, before_id, limit], map_message)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}
