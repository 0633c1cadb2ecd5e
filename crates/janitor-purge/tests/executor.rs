mod common;

use chrono::{Duration, Utc};

use janitor_purge::PurgeError;
use janitor_types::models::{ContainerKind, PolicyRecord};

use common::{COMMUNITY, MemoryPlatform, executor, policy};

#[tokio::test]
async fn deletes_only_old_unprotected_messages() {
    let platform = MemoryPlatform::new();
    let channel = platform.add_container(100, ContainerKind::Text);

    let old = platform.add_message(channel, 72, |_| {});
    let saved = platform.add_message(channel, 72, |m| {
        m.marker_names.insert("keep".into());
    });
    let recent = platform.add_message(channel, 10, |_| {});
    let own = platform.add_message(channel, 72, |m| m.author_is_service = true);

    let (_dir, exec) = executor(platform.clone(), policy(48, "keep", false));
    let report = exec.purge(COMMUNITY).await.unwrap();

    assert_eq!(report.deleted, 1);
    assert_eq!(report.age_limit_hours, 48);
    let left = platform.remaining(channel);
    assert!(!left.contains(&old));
    assert!(left.contains(&saved) && left.contains(&recent) && left.contains(&own));
}

#[tokio::test]
async fn second_run_deletes_nothing() {
    let platform = MemoryPlatform::new();
    let channel = platform.add_container(100, ContainerKind::Text);
    for _ in 0..5 {
        platform.add_message(channel, 100, |_| {});
    }
    platform.add_message(channel, 100, |m| m.pinned = true);

    let (_dir, exec) = executor(platform.clone(), policy(24, "keep", false));
    assert_eq!(exec.purge(COMMUNITY).await.unwrap().deleted, 5);
    assert_eq!(exec.purge(COMMUNITY).await.unwrap().deleted, 0);
}

#[tokio::test]
async fn failing_container_is_isolated() {
    let platform = MemoryPlatform::new();
    let a = platform.add_container(1, ContainerKind::Text);
    let b = platform.add_container(2, ContainerKind::Broadcast);
    let c = platform.add_container(3, ContainerKind::Thread);
    for container in [a, b, c] {
        platform.add_message(container, 50, |_| {});
        platform.add_message(container, 50, |_| {});
    }
    platform.fail(b);

    let (_dir, exec) = executor(platform.clone(), policy(24, "keep", false));
    let report = exec.purge(COMMUNITY).await.unwrap();

    assert_eq!(report.deleted, 4);
    assert_eq!(report.failed_containers, vec![b]);
    assert!(platform.remaining(a).is_empty());
    assert_eq!(platform.remaining(b).len(), 2);
    assert!(platform.remaining(c).is_empty());
}

#[tokio::test]
async fn pages_through_long_histories() {
    let platform = MemoryPlatform::new();
    let channel = platform.add_container(100, ContainerKind::Text);
    // Distinct timestamps so page boundaries never tie.
    for i in 0..250 {
        platform.add_message(channel, 48 + i, |_| {});
    }

    let (_dir, exec) = executor(platform.clone(), policy(24, "", false));
    let report = exec.purge(COMMUNITY).await.unwrap();

    assert_eq!(report.deleted, 250);
    assert!(platform.remaining(channel).is_empty());
}

#[tokio::test]
async fn pages_through_messages_sharing_a_timestamp() {
    let platform = MemoryPlatform::new();
    let channel = platform.add_container(100, ContainerKind::Text);
    let at = Utc::now() - Duration::hours(72);
    for _ in 0..150 {
        platform.add_message(channel, 72, |m| m.timestamp = at);
    }

    let (_dir, exec) = executor(platform.clone(), policy(48, "keep", false));
    assert_eq!(exec.purge(COMMUNITY).await.unwrap().deleted, 150);
    assert_eq!(exec.purge(COMMUNITY).await.unwrap().deleted, 0);
    assert!(platform.remaining(channel).is_empty());
}

#[tokio::test]
async fn overlapping_purges_of_one_community_run_one_at_a_time() {
    let platform = MemoryPlatform::new();
    let channel = platform.add_container(100, ContainerKind::Text);
    for _ in 0..3 {
        platform.add_message(channel, 72, |_| {});
    }

    let (_dir, exec) = executor(platform.clone(), policy(48, "keep", false));
    let other = exec.clone();
    let (first, second) = tokio::join!(exec.purge(COMMUNITY), other.purge(COMMUNITY));

    assert_eq!(platform.max_concurrent_listings(), 1);
    assert_eq!(first.unwrap().deleted + second.unwrap().deleted, 3);
    assert!(platform.remaining(channel).is_empty());
}

#[tokio::test]
async fn service_messages_go_when_allowed() {
    let platform = MemoryPlatform::new();
    let channel = platform.add_container(100, ContainerKind::Text);
    platform.add_message(channel, 72, |m| m.author_is_service = true);

    let (_dir, exec) = executor(platform.clone(), policy(48, "keep", true));
    assert_eq!(exec.purge(COMMUNITY).await.unwrap().deleted, 1);
}

#[tokio::test]
async fn unconfigured_and_partial_policies_are_errors() {
    let platform = MemoryPlatform::new();
    let (_dir, exec) = executor(
        platform.clone(),
        PolicyRecord {
            enabled: Some(true),
            ..Default::default()
        },
    );

    assert!(matches!(exec.purge(COMMUNITY).await, Err(PurgeError::PolicyIncomplete(_))));
    assert!(matches!(
        exec.purge(janitor_types::models::CommunityId(404)).await,
        Err(PurgeError::PolicyAbsent(_))
    ));
}
