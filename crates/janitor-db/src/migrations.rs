use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS communities (
            id          INTEGER PRIMARY KEY,
            name        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS users (
            id              INTEGER PRIMARY KEY,
            username        TEXT NOT NULL,
            display_name    TEXT
        );

        CREATE TABLE IF NOT EXISTS channels (
            id              INTEGER PRIMARY KEY,
            community_id    INTEGER NOT NULL REFERENCES communities(id),
            name            TEXT NOT NULL,
            kind            TEXT NOT NULL CHECK (kind IN ('text', 'broadcast', 'thread')),
            parent_id       INTEGER REFERENCES channels(id)
        );

        CREATE INDEX IF NOT EXISTS idx_channels_community
            ON channels(community_id);

        CREATE TABLE IF NOT EXISTS messages (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            channel_id      INTEGER NOT NULL REFERENCES channels(id),
            author_id       INTEGER NOT NULL REFERENCES users(id),
            content         TEXT NOT NULL DEFAULT '',
            kind            TEXT NOT NULL DEFAULT 'default'
                            CHECK (kind IN ('default', 'system', 'thread_starter')),
            pinned          INTEGER NOT NULL DEFAULT 0,
            -- unix epoch milliseconds
            created_at      INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_channel
            ON messages(channel_id, created_at);

        CREATE TABLE IF NOT EXISTS reactions (
            message_id  INTEGER NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
            user_id     INTEGER NOT NULL REFERENCES users(id),
            name        TEXT NOT NULL,
            custom      INTEGER NOT NULL DEFAULT 0,
            UNIQUE(message_id, user_id, name)
        );

        CREATE INDEX IF NOT EXISTS idx_reactions_message
            ON reactions(message_id);

        CREATE TABLE IF NOT EXISTS member_roles (
            community_id    INTEGER NOT NULL REFERENCES communities(id),
            user_id         INTEGER NOT NULL REFERENCES users(id),
            role_id         INTEGER NOT NULL,
            PRIMARY KEY (community_id, user_id, role_id)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
