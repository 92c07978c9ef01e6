use eframe::egui;
use tokio::sync::mpsc;

use crate::common::{NetworkCommand, NetworkEvent, TypingEvent};

use super::components::{chat_area, input_bar, sidebar};
use super::state::{AppState, ConnectionStatus, Screen};

pub struct ChatApp {
    state: AppState,
    command_sender: mpsc::Sender<NetworkCommand>,
    event_receiver: mpsc::Receiver<NetworkEvent>,
}

impl ChatApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        state: AppState,
        command_sender: mpsc::Sender<NetworkCommand>,
        event_receiver: mpsc::Receiver<NetworkEvent>,
    ) -> Self {
        Self {
            state,
            command_sender,
            event_receiver,
        }
    }

    fn handle_network_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            match event {
                NetworkEvent::Connected { session_id } => {
                    self.state.save_session_id(&session_id);
                    self.state.connection = ConnectionStatus::Connected;
                }
                NetworkEvent::Registered { users } => self.state.set_roster(users),
                NetworkEvent::MessageReceived(msg) => self.state.record_message(msg),
                NetworkEvent::TypingReceived(event) => self.state.chat.apply_typing(&event),
                NetworkEvent::UserConnected(name) => self.state.add_user(name),
                NetworkEvent::UserDisconnected(name) => self.state.remove_user(&name),
                NetworkEvent::ConnectionError(err) => {
                    self.state.connection = ConnectionStatus::Error(err);
                }
                NetworkEvent::Disconnected => {
                    self.state.connection = ConnectionStatus::Disconnected;
                }
            }
        }
    }

    fn send_command(&self, command: NetworkCommand) {
        if let Err(err) = self.command_sender.try_send(command) {
            log::warn!("Failed to send command to network: {err}");
        }
    }

    fn send_message(&mut self, to: &str, text: &str) {
        let msg = self.state.chat.outgoing(to, text);
        self.send_command(NetworkCommand::SendMessage(msg));
    }

    fn send_typing(&mut self, to: &str, is_typing: bool) {
        let event = TypingEvent {
            to: to.to_string(),
            from: self.state.chat.local_name().to_string(),
            is_typing,
            ts: Some(chrono::Utc::now().timestamp_millis()),
        };
        self.send_command(NetworkCommand::SetTyping(event));
    }

    fn login_screen(&mut self, ctx: &egui::Context) {
        let mut submitted = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(80.0);
                ui.heading("Pick a display name");
                ui.add_space(8.0);

                let response = ui.text_edit_singleline(&mut self.state.name_input);
                if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    submitted = true;
                }
                if ui.button("Start chatting").clicked() {
                    submitted = true;
                }
            });
        });

        let name = self.state.name_input.trim().to_string();
        if submitted && !name.is_empty() {
            self.state.login(name.clone());
            self.send_command(NetworkCommand::Register { name });
        }
    }

    fn chat_screen(&mut self, ctx: &egui::Context) {
        let mut open_peer = None;
        let mut send_main: Option<(String, String)> = None;
        let mut send_chat: Option<(String, String)> = None;
        let mut typing: Option<(String, bool)> = None;

        let mut logout = false;

        egui::TopBottomPanel::top("compose_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(format!("Username: {}", self.state.chat.local_name()));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Logout").clicked() {
                        logout = true;
                    }
                });
            });
            ui.horizontal(|ui| {
                ui.label("To:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.state.recipient_input)
                        .hint_text("recipient"),
                );
                ui.add(
                    egui::TextEdit::singleline(&mut self.state.compose_input)
                        .hint_text("type a message")
                        .desired_width(f32::INFINITY),
                );
                if ui.button("Send").clicked() {
                    let to = self.state.recipient_input.trim().to_string();
                    if !to.is_empty() && !self.state.compose_input.is_empty() {
                        send_main = Some((to, self.state.compose_input.clone()));
                        self.state.compose_input.clear();
                    }
                }
            });
            ui.add_space(4.0);
        });

        egui::SidePanel::left("contact_sidebar")
            .resizable(true)
            .default_width(200.0)
            .show(ctx, |ui| {
                let actions = sidebar::render(ui, &self.state);
                if let Some(peer) = actions.open_peer {
                    open_peer = Some(peer);
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            chat_area::render(ui, &self.state);

            if let Some(peer) = self.state.selected_peer.clone() {
                ui.separator();
                let actions = input_bar::render(ui, &mut self.state.chat_input);
                if let Some(text) = actions.send {
                    send_chat = Some((peer.clone(), text));
                }
                if let Some(is_typing) = actions.typing_changed {
                    typing = Some((peer, is_typing));
                }
            }
        });

        if logout {
            self.state.logout();
            return;
        }
        if let Some(peer) = open_peer {
            self.state.open_chat(peer);
        }
        if let Some((to, text)) = send_main {
            self.send_message(&to, &text);
            self.state.open_chat(to);
        }
        if let Some((to, text)) = send_chat {
            self.send_message(&to, &text);
        }
        if let Some((to, is_typing)) = typing {
            self.send_typing(&to, is_typing);
        }
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_network_events();
        self.state.chat.prune_typing();

        match self.state.screen {
            Screen::Login => self.login_screen(ctx),
            Screen::Chat => self.chat_screen(ctx),
        }

        ctx.request_repaint();
    }
}
