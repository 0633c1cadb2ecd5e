use chrono::{DateTime, Utc};

use janitor_types::models::{MessageDescriptor, RetentionPolicy};

/// Whether a message may be deleted under `policy`.
///
/// A message is kept when it is pinned, carries the save marker, was written
/// by this service while bot deletion is off, is a system message, or starts
/// a thread. Age is checked separately by [`is_expired`].
pub fn should_delete(msg: &MessageDescriptor, policy: &RetentionPolicy) -> bool {
    !msg.pinned
        && !msg.has_marker(&policy.save_marker_name)
        && (!msg.author_is_service || policy.delete_bot_messages)
        && !msg.is_system_message
        && !msg.is_thread_starter
}

/// Strictly older than the cutoff.
pub fn is_expired(msg: &MessageDescriptor, cutoff: DateTime<Utc>) -> bool {
    msg.timestamp < cutoff
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Duration;
    use janitor_types::models::{ChannelId, MessageId, UserId};

    use super::*;

    fn policy(delete_bot_messages: bool) -> RetentionPolicy {
        RetentionPolicy {
            age_limit_hours: 48,
            save_marker_name: "keep".into(),
            delete_bot_messages,
        }
    }

    fn message() -> MessageDescriptor {
        MessageDescriptor {
            id: MessageId(1),
            container_id: ChannelId(1),
            author_id: UserId(2),
            author_name: "someone".into(),
            content: String::new(),
            timestamp: Utc::now() - Duration::hours(72),
            pinned: false,
            is_system_message: false,
            is_thread_starter: false,
            author_is_service: false,
            marker_names: BTreeSet::new(),
        }
    }

    /// Every combination of the boolean message flags.
    fn all_variants() -> Vec<MessageDescriptor> {
        let mut out = Vec::new();
        for bits in 0u8..32 {
            let mut m = message();
            m.pinned = bits & 1 != 0;
            m.is_system_message = bits & 2 != 0;
            m.is_thread_starter = bits & 4 != 0;
            m.author_is_service = bits & 8 != 0;
            if bits & 16 != 0 {
                m.marker_names.insert("keep".into());
            }
            out.push(m);
        }
        out
    }

    #[test]
    fn plain_message_is_eligible() {
        assert!(should_delete(&message(), &policy(false)));
    }

    #[test]
    fn saved_messages_are_never_deleted() {
        for delete_bots in [false, true] {
            for m in all_variants().into_iter().filter(|m| m.marker_names.contains("keep")) {
                assert!(!should_delete(&m, &policy(delete_bots)), "{:?}", m);
            }
        }
    }

    #[test]
    fn pinned_system_and_thread_starters_are_kept() {
        for delete_bots in [false, true] {
            for m in all_variants() {
                if m.pinned || m.is_system_message || m.is_thread_starter {
                    assert!(!should_delete(&m, &policy(delete_bots)), "{:?}", m);
                }
            }
        }
    }

    #[test]
    fn service_messages_follow_the_bot_flag() {
        let mut m = message();
        m.author_is_service = true;
        assert!(!should_delete(&m, &policy(false)));
        assert!(should_delete(&m, &policy(true)));
    }

    #[test]
    fn marker_match_is_exact_and_case_sensitive() {
        let mut m = message();
        m.marker_names.insert("Keep".into());
        m.marker_names.insert("keeper".into());
        assert!(should_delete(&m, &policy(false)));
    }

    #[test]
    fn empty_marker_name_exempts_nothing() {
        let mut m = message();
        m.marker_names.insert(String::new());
        let p = RetentionPolicy {
            save_marker_name: String::new(),
            ..policy(false)
        };
        assert!(should_delete(&m, &p));
    }

    #[test]
    fn expiry_is_strict() {
        let m = message();
        assert!(is_expired(&m, m.timestamp + Duration::seconds(1)));
        assert!(!is_expired(&m, m.timestamp));
    }
}
