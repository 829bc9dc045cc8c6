//! Conversation-thread domain logic shared by the repos and the resolution
//! service: typed views over thread rows, recency ordering, and preview
//! computation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{MessageThreadRow, ThreadMessageRow};

/// Who may see a match thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// One shared row visible to all participants of the match.
    Shared,
    /// A per-user private copy.
    PrivateTo(Uuid),
}

/// Typed view over a thread row, so callers pattern-match instead of
/// null-checking the id columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadKind {
    Direct { creator: Uuid, participant: Uuid },
    Match { match_id: Uuid, visibility: Visibility },
}

impl MessageThreadRow {
    /// `None` for rows that satisfy neither shape (malformed data).
    pub fn kind(&self) -> Option<ThreadKind> {
        match (self.match_id, self.user_id, self.participant_id) {
            (Some(match_id), Some(user), _) => Some(ThreadKind::Match {
                match_id,
                visibility: Visibility::PrivateTo(user),
            }),
            (Some(match_id), None, _) => Some(ThreadKind::Match {
                match_id,
                visibility: Visibility::Shared,
            }),
            (None, Some(creator), Some(participant)) => Some(ThreadKind::Direct {
                creator,
                participant,
            }),
            (None, _, _) => None,
        }
    }
}

/// Normalized (low, high) ordering of a direct-thread pair, so that
/// (A, B) and (B, A) address the same thread.
pub fn direct_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Newest last-message first; threads without a last message sort as if
/// their timestamp were the epoch.
pub fn sort_by_recency(threads: &mut [MessageThreadRow]) {
    threads.sort_by_key(|t| {
        std::cmp::Reverse(t.last_message_time.unwrap_or(DateTime::<Utc>::UNIX_EPOCH))
    });
}

/// Merges the outcome of the match-thread fetch into the direct threads and
/// sorts the result. A failed fetch degrades to direct-only: the user keeps
/// their direct conversations instead of the whole call failing.
pub fn merge_visible_threads(
    mut threads: Vec<MessageThreadRow>,
    match_fetch: sqlx::Result<Vec<MessageThreadRow>>,
) -> Vec<MessageThreadRow> {
    match match_fetch {
        Ok(match_threads) => threads.extend(match_threads),
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Match-thread fetch failed, returning direct threads only"
            );
        }
    }
    sort_by_recency(&mut threads);
    threads
}

/// The preview a thread should carry given its newest remaining message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadPreview {
    pub last_message: Option<String>,
    pub last_message_sender_id: Option<Uuid>,
    pub last_message_time: Option<DateTime<Utc>>,
}

impl ThreadPreview {
    /// Computed from the newest remaining message, or cleared when none
    /// remain. The preview must never reference a deleted message.
    pub fn from_newest(newest: Option<&ThreadMessageRow>) -> ThreadPreview {
        match newest {
            Some(message) => ThreadPreview {
                last_message: Some(message.content.clone()),
                last_message_sender_id: Some(message.sender_id),
                last_message_time: Some(message.created_at),
            },
            None => ThreadPreview::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn thread(last_message_time: Option<DateTime<Utc>>) -> MessageThreadRow {
        MessageThreadRow {
            id: Uuid::new_v4(),
            user_id: Some(Uuid::new_v4()),
            participant_id: Some(Uuid::new_v4()),
            match_id: None,
            participant_name: None,
            participant_avatar: None,
            last_message: None,
            last_message_sender_id: None,
            last_message_time,
            unread_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn sorts_newest_first_with_missing_time_as_epoch() {
        let mut threads = vec![thread(Some(at(100))), thread(None), thread(Some(at(500)))];
        sort_by_recency(&mut threads);

        assert_eq!(threads[0].last_message_time, Some(at(500)));
        assert_eq!(threads[1].last_message_time, Some(at(100)));
        assert_eq!(threads[2].last_message_time, None);
    }

    #[test]
    fn failed_match_fetch_degrades_to_direct_threads_only() {
        let direct = vec![thread(Some(at(100))), thread(Some(at(500)))];
        let direct_ids: Vec<Uuid> = direct.iter().map(|t| t.id).collect();

        let merged = merge_visible_threads(direct, Err(sqlx::Error::PoolTimedOut));

        // Direct threads survive, sorted; nothing else sneaks in.
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].last_message_time, Some(at(500)));
        assert!(merged.iter().all(|t| direct_ids.contains(&t.id)));
    }

    #[test]
    fn successful_match_fetch_merges_and_sorts() {
        let direct = vec![thread(Some(at(100)))];
        let mut match_thread = thread(Some(at(900)));
        match_thread.match_id = Some(Uuid::new_v4());
        let match_id = match_thread.id;

        let merged = merge_visible_threads(direct, Ok(vec![match_thread]));

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, match_id);
    }

    #[test]
    fn direct_pair_is_direction_agnostic() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(direct_pair(a, b), direct_pair(b, a));
    }

    #[test]
    fn kind_distinguishes_shared_and_private_match_threads() {
        let match_id = Uuid::new_v4();
        let user = Uuid::new_v4();

        let mut row = thread(None);
        row.match_id = Some(match_id);
        row.user_id = None;
        row.participant_id = None;
        assert_eq!(
            row.kind(),
            Some(ThreadKind::Match {
                match_id,
                visibility: Visibility::Shared
            })
        );

        row.user_id = Some(user);
        assert_eq!(
            row.kind(),
            Some(ThreadKind::Match {
                match_id,
                visibility: Visibility::PrivateTo(user)
            })
        );
    }

    #[test]
    fn kind_is_none_for_malformed_rows() {
        let mut row = thread(None);
        row.user_id = None;
        row.participant_id = None;
        assert_eq!(row.kind(), None);
    }

    #[test]
    fn preview_clears_when_no_messages_remain() {
        let preview = ThreadPreview::from_newest(None);
        assert_eq!(preview, ThreadPreview::default());
        assert!(preview.last_message.is_none());
        assert!(preview.last_message_sender_id.is_none());
    }

    #[test]
    fn preview_falls_back_to_remaining_message() {
        let sender = Uuid::new_v4();
        let older = ThreadMessageRow {
            id: Uuid::new_v4(),
            thread_id: Uuid::new_v4(),
            sender_id: sender,
            content: "see you at the match".to_string(),
            image_url: None,
            tournament_ref: None,
            created_at: at(10),
            updated_at: at(10),
        };

        let preview = ThreadPreview::from_newest(Some(&older));
        assert_eq!(preview.last_message.as_deref(), Some("see you at the match"));
        assert_eq!(preview.last_message_sender_id, Some(sender));
        assert_eq!(preview.last_message_time, Some(at(10)));
    }
}
