//! Daily "on this day" check.
//!
//! Looks for a note the user wrote on today's date in an earlier year and
//! hands it to a [`MemoryNotifier`]. Formatting the message is the notifier's
//! job; this module only decides whether there is something to send.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::clock::Clock;
use crate::models::{NoteId, UserId};
use crate::query::on_this_day;
use crate::store::NoteStore;

/// What a notifier receives about the resurfaced note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryNotice {
    pub note_id: NoteId,
    pub city: String,
    pub title: String,
}

/// Delivers a memory to the user.
pub trait MemoryNotifier {
    fn notify(&self, notice: &MemoryNotice) -> Result<()>;
}

/// Notifier that writes the memory to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl MemoryNotifier for LogNotifier {
    fn notify(&self, notice: &MemoryNotice) -> Result<()> {
        tracing::info!(
            note_id = %notice.note_id,
            city = %notice.city,
            title = %notice.title,
            "memory from this day"
        );
        Ok(())
    }
}

/// Runs one memory check for `user_id`.
///
/// Calls `notifier` at most once, and only when a note from this date in a
/// prior year exists. Returns the notice that was sent, if any.
pub fn run_memory_check(
    store: &NoteStore,
    user_id: &UserId,
    clock: &dyn Clock,
    notifier: &dyn MemoryNotifier,
) -> Result<Option<MemoryNotice>> {
    let notes = store
        .notes_for_user(user_id)
        .with_context(|| format!("Failed to load notes for {user_id}"))?;
    let now = clock.now();

    let Some(memory) = on_this_day(&notes, now) else {
        tracing::debug!(user_id = %user_id, "no memory for today");
        return Ok(None);
    };

    let notice = MemoryNotice {
        note_id: memory.note.id(),
        city: memory.note.city().to_string(),
        title: memory.note.title().to_string(),
    };

    if let Err(err) = notifier.notify(&notice) {
        tracing::warn!(note_id = %notice.note_id, "memory notification failed: {err:#}");
        return Err(err.context("Failed to dispatch memory notification"));
    }

    tracing::debug!(note_id = %notice.note_id, years_ago = memory.years_ago, "memory dispatched");
    Ok(Some(notice))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::clock::FixedClock;
    use crate::models::Location;
    use crate::store::NewNote;
    use std::cell::RefCell;
    use time::OffsetDateTime;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-06-15 10:00 UTC);

    #[derive(Default)]
    struct Recorder {
        sent: RefCell<Vec<MemoryNotice>>,
    }

    impl MemoryNotifier for Recorder {
        fn notify(&self, notice: &MemoryNotice) -> Result<()> {
            self.sent.borrow_mut().push(notice.clone());
            Ok(())
        }
    }

    struct Failing;

    impl MemoryNotifier for Failing {
        fn notify(&self, _notice: &MemoryNotice) -> Result<()> {
            anyhow::bail!("channel closed")
        }
    }

    fn store_with(notes: &[(&str, &str, &str, OffsetDateTime)]) -> NoteStore {
        let store = NoteStore::new(Database::in_memory().unwrap()).unwrap();
        for &(user, title, city, when) in notes {
            store
                .insert_note(NewNote {
                    timestamp: Some(when),
                    ..NewNote::new(user, title, Location::at(0.0, 0.0).in_city(city, "X"))
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn notifies_once_with_oldest_anniversary() {
        let store = store_with(&[
            ("alice", "Last year", "Paris", datetime!(2023-06-15 09:00 UTC)),
            ("alice", "Long ago", "Rome", datetime!(2020-06-15 09:00 UTC)),
            ("alice", "Other day", "Oslo", datetime!(2019-06-14 09:00 UTC)),
        ]);
        let recorder = Recorder::default();

        let notice = run_memory_check(&store, &UserId::from("alice"), &FixedClock(NOW), &recorder)
            .unwrap()
            .expect("a memory should be found");

        assert_eq!(notice.title, "Long ago");
        assert_eq!(notice.city, "Rome");
        assert_eq!(recorder.sent.borrow().as_slice(), [notice]);
    }

    #[test]
    fn no_memory_means_no_notification() {
        let store = store_with(&[
            ("alice", "Today", "Paris", datetime!(2024-06-15 08:00 UTC)),
            ("bob", "Not mine", "Rome", datetime!(2020-06-15 09:00 UTC)),
        ]);
        let recorder = Recorder::default();

        let notice =
            run_memory_check(&store, &UserId::from("alice"), &FixedClock(NOW), &recorder).unwrap();

        assert_eq!(notice, None);
        assert!(recorder.sent.borrow().is_empty());
    }

    #[test]
    fn notifier_failure_is_reported() {
        let store = store_with(&[("alice", "Old", "Paris", datetime!(2022-06-15 09:00 UTC))]);

        let err = run_memory_check(&store, &UserId::from("alice"), &FixedClock(NOW), &Failing)
            .unwrap_err();

        assert!(format!("{err:#}").contains("channel closed"));
    }

    #[test]
    fn log_notifier_always_succeeds() {
        let notice = MemoryNotice {
            note_id: NoteId::new(1),
            city: "Paris".to_string(),
            title: "Coffee".to_string(),
        };
        assert!(LogNotifier.notify(&notice).is_ok());
    }
}
