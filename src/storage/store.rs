use rusqlite::{OptionalExtension, Result as SqlResult, params};
use std::path::Path;

use crate::common::ChatMessage;

use super::database::Database;

// Flat keys, camelCased like the web-client storage they stay compatible
// with; structured values are JSON-encoded strings.
const KEY_USER_NAME: &str = "userName";
const KEY_USER_ID: &str = "userId";
const KEY_USERS: &str = "users";
const KEY_CHATS: &str = "chats";

/// Flat key-value store: local identity, last session id, roster snapshot
/// and the full chat log, JSON-encoded where structured.
pub struct ChatStore {
    db: Database,
}

impl ChatStore {
    /// Open the store at the default location.
    pub fn new() -> SqlResult<Self> {
        Self::with_path("data/client.db")
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> SqlResult<Self> {
        let db = Database::new(path)?;
        let store = Self { db };
        store.init_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> SqlResult<Self> {
        let db = Database::in_memory()?;
        let store = Self { db };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> SqlResult<()> {
        self.db.connection().execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> SqlResult<Option<String>> {
        self.db
            .connection()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
    }

    pub fn put(&self, key: &str, value: &str) -> SqlResult<()> {
        self.db.connection().execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn user_name(&self) -> SqlResult<Option<String>> {
        self.get(KEY_USER_NAME)
    }

    pub fn save_user_name(&self, name: &str) -> SqlResult<()> {
        self.put(KEY_USER_NAME, name)
    }

    /// Last-known transport session id.
    pub fn session_id(&self) -> SqlResult<Option<String>> {
        self.get(KEY_USER_ID)
    }

    pub fn save_session_id(&self, id: &str) -> SqlResult<()> {
        self.put(KEY_USER_ID, id)
    }

    /// Last-known roster snapshot. Malformed state reads as empty.
    pub fn load_users(&self) -> SqlResult<Vec<String>> {
        Ok(self.parse_json_array(KEY_USERS)?.unwrap_or_default())
    }

    pub fn save_users(&self, users: &[String]) -> SqlResult<()> {
        self.put(KEY_USERS, &to_json(users)?)
    }

    /// The full conversation log. Absent or malformed state reads as an
    /// empty log, never an error.
    pub fn load_chats(&self) -> SqlResult<Vec<ChatMessage>> {
        Ok(self.parse_json_array(KEY_CHATS)?.unwrap_or_default())
    }

    pub fn save_chats(&self, chats: &[ChatMessage]) -> SqlResult<()> {
        self.put(KEY_CHATS, &to_json(chats)?)
    }

    /// Wipe every key (logout).
    pub fn clear_all(&self) -> SqlResult<()> {
        self.db.connection().execute("DELETE FROM kv", [])?;
        Ok(())
    }

    fn parse_json_array<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> SqlResult<Option<Vec<T>>> {
        let Some(raw) = self.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(parsed) => Ok(Some(parsed)),
            Err(err) => {
                log::warn!("Stored value for `{key}` is malformed ({err}); treating as empty");
                Ok(None)
            }
        }
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> SqlResult<String> {
    serde_json::to_string(value)
        .map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err)))
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

    #[test]
    fn chats_round_trip() {
        let store = ChatStore::in_memory().unwrap();
        let log = vec![
            message("bob", "alice", "hi", 100),
            message("alice", "bob", "yo", 200),
        ];

        store.save_chats(&log).unwrap();
        assert_eq!(store.load_chats().unwrap(), log);
    }

    #[test]
    fn missing_chats_read_as_empty() {
        let store = ChatStore::in_memory().unwrap();
        assert!(store.load_chats().unwrap().is_empty());
    }

    #[test]
    fn malformed_chats_read_as_empty() {
        let store = ChatStore::in_memory().unwrap();
        store.put(KEY_CHATS, "{definitely not an array").unwrap();
        assert!(store.load_chats().unwrap().is_empty());
    }

    #[test]
    fn identity_keys_round_trip() {
        let store = ChatStore::in_memory().unwrap();
        store.save_user_name("alice").unwrap();
        store.save_session_id("s-42").unwrap();

        assert_eq!(store.user_name().unwrap().as_deref(), Some("alice"));
        assert_eq!(store.session_id().unwrap().as_deref(), Some("s-42"));
    }

    #[test]
    fn clear_all_wipes_every_key() {
        let store = ChatStore::in_memory().unwrap();
        store.save_user_name("alice").unwrap();
        store.save_users(&["bob".into()]).unwrap();
        store.clear_all().unwrap();

        assert_eq!(store.user_name().unwrap(), None);
        assert!(store.load_users().unwrap().is_empty());
    }
}
