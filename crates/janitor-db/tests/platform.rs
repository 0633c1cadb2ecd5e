//! DbPlatform against an in-memory chat database.

use std::sync::Arc;

use chrono::{Duration, Utc};

use janitor_db::models::{MessageKind, NewMessage};
use janitor_db::{Database, DbPlatform};
use janitor_types::models::{ChannelId, CommunityId, ContainerKind, MessageId, RoleId, UserId};
use janitor_types::platform::{ChatPlatform, HistoryCursor, PlatformError};

const SERVICE: i64 = 900;

fn platform() -> DbPlatform {
    let db = Database::open_in_memory().unwrap();
    db.create_community(1, "guild").unwrap();
    db.create_user(SERVICE, "janitor", None).unwrap();
    db.create_user(10, "alice", Some("Alice")).unwrap();
    db.create_channel(100, 1, "general", "text", None).unwrap();
    db.create_channel(200, 1, "lounge", "broadcast", None).unwrap();
    db.create_channel(300, 1, "topic", "thread", Some(100)).unwrap();
    DbPlatform::new(Arc::new(db), UserId(SERVICE as u64), "https://chat.example/")
}

fn insert(p: &DbPlatform, author: i64, kind: MessageKind, hours_ago: i64) -> i64 {
    p.db()
        .insert_message(&NewMessage {
            channel_id: 100,
            author_id: author,
            content: "hello",
            kind,
            pinned: false,
            created_at: (Utc::now() - Duration::hours(hours_ago)).timestamp_millis(),
        })
        .unwrap()
}

#[tokio::test]
async fn lists_every_container_kind() {
    let p = platform();
    let containers = p.containers(CommunityId(1)).await.unwrap();
    let kinds: Vec<ContainerKind> = containers.iter().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![ContainerKind::Text, ContainerKind::Broadcast, ContainerKind::Thread]);
    assert_eq!(containers[2].parent_id, Some(ChannelId(100)));
}

#[tokio::test]
async fn descriptors_carry_flags_and_custom_markers_only() {
    let p = platform();
    let own = insert(&p, SERVICE, MessageKind::Default, 5);
    let system = insert(&p, 10, MessageKind::System, 4);
    let marked = insert(&p, 10, MessageKind::Default, 3);
    p.db().add_reaction(marked, 10, "keep", true).unwrap();
    p.db().add_reaction(marked, 10, "👍", false).unwrap();

    let history = p.history_before(ChannelId(100), HistoryCursor::before(Utc::now()), 50).await.unwrap();
    assert_eq!(history.len(), 3);

    let by_id = |id: i64| history.iter().find(|m| m.id == MessageId(id as u64)).unwrap();
    assert!(by_id(own).author_is_service);
    assert!(by_id(system).is_system_message);
    let m = by_id(marked);
    assert!(m.has_marker("keep"));
    assert!(!m.has_marker("👍"));
    assert_eq!(m.author_name, "Alice");
}

#[tokio::test]
async fn unknown_channel_is_not_found() {
    let p = platform();
    let err = p.history_before(ChannelId(999), HistoryCursor::before(Utc::now()), 10).await.unwrap_err();
    assert!(matches!(err, PlatformError::NotFound(_)));
}

#[tokio::test]
async fn sent_messages_are_authored_by_the_service() {
    let p = platform();
    let id = p.send_message(ChannelId(100), "Deleted 3 messages").await.unwrap();
    let msg = p.fetch_message(ChannelId(100), id).await.unwrap().unwrap();
    assert!(msg.author_is_service);
    assert_eq!(msg.content, "Deleted 3 messages");
}

#[tokio::test]
async fn roles_and_links() {
    let p = platform();
    p.db().assign_role(1, 10, 77).unwrap();
    assert_eq!(p.member_roles(CommunityId(1), UserId(10)).await.unwrap(), vec![RoleId(77)]);
    assert_eq!(
        p.message_link(CommunityId(1), ChannelId(100), MessageId(5)),
        "https://chat.example/channels/1/100/5"
    );
}
