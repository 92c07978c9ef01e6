use crate::chat::Reconciler;
use crate::common::ChatMessage;

/// Which screen the app is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Chat,
}

/// Connection status as seen from the UI, derived from network events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
    Error(String),
}

impl ConnectionStatus {
    pub fn label(&self) -> String {
        match self {
            Self::Connecting => "connecting...".to_string(),
            Self::Connected => "connected".to_string(),
            Self::Disconnected => "disconnected".to_string(),
            Self::Error(err) => format!("error: {err}"),
        }
    }
}

/// Local UI state. All mutation happens here, on the UI thread, in response
/// to either user input or drained network events.
pub struct AppState {
    pub screen: Screen,
    pub chat: Reconciler,
    /// Currently online users, from registration plus connect/disconnect
    /// events. Distinct from contacts, which come from message history.
    pub roster: Vec<String>,
    pub selected_peer: Option<String>,
    pub connection: ConnectionStatus,
    // Inputs.
    pub name_input: String,
    pub recipient_input: String,
    pub compose_input: String,
    pub chat_input: String,
}

impl AppState {
    pub fn new(chat: Reconciler, logged_in: bool) -> Self {
        let roster = match chat.store().load_users() {
            Ok(users) => users,
            Err(err) => {
                log::warn!("Could not restore roster snapshot: {err}");
                Vec::new()
            }
        };

        Self {
            screen: if logged_in { Screen::Chat } else { Screen::Login },
            chat,
            roster,
            selected_peer: None,
            connection: ConnectionStatus::Connecting,
            name_input: String::new(),
            recipient_input: String::new(),
            compose_input: String::new(),
            chat_input: String::new(),
        }
    }

    /// First-run login: persist the chosen name and switch to the chat screen.
    pub fn login(&mut self, name: String) {
        if let Err(err) = self.chat.store().save_user_name(&name) {
            log::warn!("Could not persist user name: {err}");
        }
        self.chat.set_local_name(name);
        self.screen = Screen::Chat;
    }

    pub fn record_message(&mut self, msg: ChatMessage) {
        self.chat.record_incoming(msg);
    }

    pub fn set_roster(&mut self, mut users: Vec<String>) {
        users.sort();
        self.roster = users;
        self.persist_roster();
    }

    pub fn add_user(&mut self, name: String) {
        if !self.roster.iter().any(|user| user == &name) {
            self.roster.push(name);
            self.roster.sort();
            self.persist_roster();
        }
    }

    pub fn remove_user(&mut self, name: &str) {
        if self.roster.iter().any(|user| user == name) {
            self.roster.retain(|user| user != name);
            self.persist_roster();
        }
    }

    pub fn save_session_id(&self, id: &str) {
        if let Err(err) = self.chat.store().save_session_id(id) {
            log::warn!("Could not persist session id: {err}");
        }
    }

    /// Logout: wipe the store and every derived view, back to the login
    /// screen. The network connection is left alone; registration under a
    /// new name needs a restart.
    pub fn logout(&mut self) {
        if let Err(err) = self.chat.store().clear_all() {
            log::warn!("Could not clear stored state: {err}");
        }
        self.chat.clear();
        self.chat.set_local_name(String::new());
        self.roster.clear();
        self.selected_peer = None;
        self.name_input.clear();
        self.screen = Screen::Login;
    }

    pub fn open_chat(&mut self, peer: String) {
        self.selected_peer = Some(peer);
    }

    fn persist_roster(&self) {
        if let Err(err) = self.chat.store().save_users(&self.roster) {
            log::warn!("Could not persist roster snapshot: {err}");
        }
    }
}
