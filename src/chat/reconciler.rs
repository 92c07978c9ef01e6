use std::collections::BTreeSet;

use chrono::Utc;

use crate::common::{ChatMessage, TypingEvent};
use crate::storage::ChatStore;

use super::typing::TypingTracker;

/// The client-side view of every conversation for the local user.
///
/// Owns the append-only message log, derives the contact list and per-peer
/// conversation views from it, mirrors every log change into the store and
/// folds typing events into a per-peer membership set. Purely event-driven:
/// it never touches the network, so tests feed it directly.
pub struct Reconciler {
    local_name: String,
    log: Vec<ChatMessage>,
    typing: TypingTracker,
    store: ChatStore,
}

impl Reconciler {
    /// Restore persisted history. Absent or malformed state yields an empty
    /// log; storage trouble is logged, never raised.
    pub fn restore(local_name: String, store: ChatStore) -> Self {
        let log = match store.load_chats() {
            Ok(log) => log,
            Err(err) => {
                log::warn!("Could not restore chat log: {err}");
                Vec::new()
            }
        };

        Self {
            local_name,
            log,
            typing: TypingTracker::new(),
            store,
        }
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Identity becomes known after the login screen on first run.
    pub fn set_local_name(&mut self, name: String) {
        self.local_name = name;
    }

    pub fn log(&self) -> &[ChatMessage] {
        &self.log
    }

    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    /// Append an inbound message, stamping the arrival time when the wire
    /// carried none, and persist the updated log. Append-only: duplicates
    /// delivered by the transport are recorded as-is.
    pub fn record_incoming(&mut self, mut msg: ChatMessage) {
        if msg.ts.is_none() {
            msg.ts = Some(Utc::now().timestamp_millis());
        }
        self.log.push(msg);
        self.persist();
    }

    /// Build an outbound message stamped with the current time. The local
    /// copy is not appended here; it comes back through the inbound path
    /// once the network task has put it on the wire.
    pub fn outgoing(&self, to: &str, text: &str) -> ChatMessage {
        ChatMessage {
            to: to.to_string(),
            from: self.local_name.clone(),
            message: text.to_string(),
            ts: Some(Utc::now().timestamp_millis()),
        }
    }

    /// Every peer that appears in the log, excluding the local user,
    /// sorted ascending for a stable display order.
    pub fn contacts(&self) -> Vec<String> {
        let mut peers = BTreeSet::new();
        for msg in &self.log {
            if !msg.from.is_empty() && msg.from != self.local_name {
                peers.insert(msg.from.clone());
            }
            if !msg.to.is_empty() && msg.to != self.local_name {
                peers.insert(msg.to.clone());
            }
        }
        peers.into_iter().collect()
    }

    /// Messages exchanged with `peer`, ascending by timestamp. Entries
    /// restored from older state may lack a timestamp and sort as 0.
    pub fn conversation(&self, peer: &str) -> Vec<ChatMessage> {
        let mut messages: Vec<ChatMessage> = self
            .log
            .iter()
            .filter(|msg| msg.is_between(&self.local_name, peer))
            .cloned()
            .collect();
        messages.sort_by_key(|msg| msg.ts.unwrap_or(0));
        messages
    }

    /// Drop the in-memory log, for logout. The caller is expected to wipe
    /// the store alongside.
    pub fn clear(&mut self) {
        self.log.clear();
    }

    pub fn is_mine(&self, msg: &ChatMessage) -> bool {
        msg.from == self.local_name
    }

    pub fn apply_typing(&mut self, event: &TypingEvent) {
        self.typing.apply(event, Utc::now());
    }

    pub fn peer_is_typing(&self, peer: &str) -> bool {
        self.typing.is_typing(peer, Utc::now())
    }

    pub fn prune_typing(&mut self) {
        self.typing.prune(Utc::now());
    }

    fn persist(&self) {
        if let Err(err) = self.store.save_chats(&self.log) {
            log::warn!("Could not persist chats: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(from: &str, to: &str, text: &str, ts: i64) -> ChatMessage {
        ChatMessage {
            to: to.into(),
            from: from.into(),
            message: text.into(),
            ts: Some(ts),
        }
    }

    fn reconciler(local: &str) -> Reconciler {
        Reconciler::restore(local.into(), ChatStore::in_memory().unwrap())
    }

    #[test]
    fn contacts_exclude_local_user_and_sort() {
        let mut chat = reconciler("alice");
        chat.record_incoming(message("carol", "alice", "hey", 3));
        chat.record_incoming(message("bob", "alice", "hi", 1));
        chat.record_incoming(message("alice", "bob", "yo", 2));

        assert_eq!(chat.contacts(), vec!["bob".to_string(), "carol".to_string()]);
    }

    #[test]
    fn contacts_are_independent_of_arrival_order() {
        let msgs = vec![
            message("bob", "alice", "hi", 1),
            message("alice", "carol", "yo", 2),
            message("dave", "alice", "sup", 3),
        ];

        let mut forward = reconciler("alice");
        for msg in msgs.clone() {
            forward.record_incoming(msg);
        }

        let mut reversed = reconciler("alice");
        for msg in msgs.into_iter().rev() {
            reversed.record_incoming(msg);
        }

        assert_eq!(forward.contacts(), reversed.contacts());
    }

    #[test]
    fn conversation_filters_to_the_unordered_pair() {
        let mut chat = reconciler("alice");
        chat.record_incoming(message("bob", "alice", "hi", 100));
        chat.record_incoming(message("carol", "alice", "other", 150));
        chat.record_incoming(message("alice", "bob", "yo", 200));
        chat.record_incoming(message("bob", "carol", "not ours", 250));

        let convo = chat.conversation("bob");
        assert_eq!(convo.len(), 2);
        assert!(convo.iter().all(|msg| msg.is_between("alice", "bob")));
    }

    #[test]
    fn conversation_sorts_ascending_by_timestamp() {
        let mut chat = reconciler("alice");
        chat.record_incoming(message("alice", "bob", "second", 200));
        chat.record_incoming(message("bob", "alice", "first", 100));

        let convo = chat.conversation("bob");
        assert_eq!(convo[0].message, "first");
        assert_eq!(convo[1].message, "second");
    }

    #[test]
    fn mine_versus_theirs_classification() {
        let mut chat = reconciler("alice");
        chat.record_incoming(message("bob", "alice", "hi", 100));
        chat.record_incoming(message("alice", "bob", "yo", 200));

        let convo = chat.conversation("bob");
        assert!(!chat.is_mine(&convo[0]));
        assert!(chat.is_mine(&convo[1]));
    }

    #[test]
    fn incoming_message_without_timestamp_gets_stamped() {
        let mut chat = reconciler("alice");
        chat.record_incoming(ChatMessage {
            to: "alice".into(),
            from: "bob".into(),
            message: "hi".into(),
            ts: None,
        });

        assert!(chat.log()[0].ts.is_some());
    }

    #[test]
    fn restore_round_trips_a_persisted_log() {
        let store = ChatStore::in_memory().unwrap();
        let log = vec![
            message("bob", "alice", "hi", 100),
            message("alice", "bob", "yo", 200),
        ];
        store.save_chats(&log).unwrap();

        let chat = Reconciler::restore("alice".into(), store);
        assert_eq!(chat.log(), log.as_slice());
    }

    #[test]
    fn restore_from_corrupted_state_yields_empty_log() {
        let store = ChatStore::in_memory().unwrap();
        store.put("chats", "not json at all").unwrap();

        let chat = Reconciler::restore("alice".into(), store);
        assert!(chat.log().is_empty());
    }

    #[test]
    fn outgoing_is_not_appended_locally() {
        let chat = reconciler("alice");
        let msg = chat.outgoing("bob", "hello");

        assert_eq!(msg.from, "alice");
        assert_eq!(msg.to, "bob");
        assert!(msg.ts.is_some());
        assert!(chat.log().is_empty());
    }

    #[test]
    fn self_echo_lands_in_the_conversation() {
        let mut chat = reconciler("alice");
        let msg = chat.outgoing("bob", "hello");
        // The network task echoes the sent copy back through the inbound path.
        chat.record_incoming(msg);

        let convo = chat.conversation("bob");
        assert_eq!(convo.len(), 1);
        assert!(chat.is_mine(&convo[0]));
    }
}
