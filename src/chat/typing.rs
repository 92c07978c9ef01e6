use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::common::TypingEvent;

/// How long a "typing" flag stays live without a follow-up event. The stop
/// event can be lost (blur never fires, peer disconnects mid-keystroke), so
/// an entry older than this is treated as expired.
pub const TYPING_TIMEOUT_MS: i64 = 5_000;

/// Per-peer typing membership: a peer is "typing" iff the most recent event
/// from them said so and it has not expired.
#[derive(Debug, Default)]
pub struct TypingTracker {
    started: HashMap<String, DateTime<Utc>>,
}

impl TypingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &TypingEvent, now: DateTime<Utc>) {
        if event.is_typing {
            self.started.insert(event.from.clone(), now);
        } else {
            self.started.remove(&event.from);
        }
    }

    pub fn is_typing(&self, peer: &str, now: DateTime<Utc>) -> bool {
        self.started.get(peer).is_some_and(|since| is_live(*since, now))
    }

    /// Drop expired entries so the map does not grow with every one-off peer.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        self.started.retain(|_, since| is_live(*since, now));
    }
}

fn is_live(since: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(since).num_milliseconds() < TYPING_TIMEOUT_MS
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event(from: &str, is_typing: bool) -> TypingEvent {
        TypingEvent {
            to: "alice".into(),
            from: from.into(),
            is_typing,
            ts: None,
        }
    }

    #[test]
    fn typing_starts_and_stops() {
        let now = Utc::now();
        let mut tracker = TypingTracker::new();

        tracker.apply(&event("bob", true), now);
        assert!(tracker.is_typing("bob", now));

        tracker.apply(&event("bob", false), now);
        assert!(!tracker.is_typing("bob", now));
    }

    #[test]
    fn stale_flag_expires_without_stop_event() {
        let now = Utc::now();
        let mut tracker = TypingTracker::new();
        tracker.apply(&event("bob", true), now);

        let later = now + Duration::milliseconds(TYPING_TIMEOUT_MS + 1);
        assert!(!tracker.is_typing("bob", later));
    }

    #[test]
    fn peers_are_tracked_independently() {
        let now = Utc::now();
        let mut tracker = TypingTracker::new();
        tracker.apply(&event("bob", true), now);
        tracker.apply(&event("carol", true), now);
        tracker.apply(&event("bob", false), now);

        assert!(!tracker.is_typing("bob", now));
        assert!(tracker.is_typing("carol", now));
    }

    #[test]
    fn prune_drops_expired_entries() {
        let now = Utc::now();
        let mut tracker = TypingTracker::new();
        tracker.apply(&event("bob", true), now);

        tracker.prune(now + Duration::milliseconds(TYPING_TIMEOUT_MS + 1));
        assert!(tracker.started.is_empty());
    }
}
