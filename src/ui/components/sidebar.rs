use eframe::egui;

use crate::ui::state::AppState;

/// Actions the user took inside the sidebar this frame.
#[derive(Default)]
pub struct SidebarActions {
    pub open_peer: Option<String>,
}

pub fn render(ui: &mut egui::Ui, state: &AppState) -> SidebarActions {
    let mut actions = SidebarActions::default();

    ui.heading("Chats");
    ui.separator();

    let contacts = state.chat.contacts();
    if contacts.is_empty() {
        ui.label("No chats yet. Send a message to start.");
    }

    for peer in contacts {
        let selected = state.selected_peer.as_deref() == Some(peer.as_str());
        let online = state.roster.iter().any(|user| user == &peer);

        ui.horizontal(|ui| {
            let dot = if online {
                egui::Color32::GREEN
            } else {
                egui::Color32::GRAY
            };
            ui.colored_label(dot, "●");

            if ui.selectable_label(selected, &peer).clicked() {
                actions.open_peer = Some(peer.clone());
            }

            if state.chat.peer_is_typing(&peer) {
                ui.label(egui::RichText::new("typing...").weak().italics());
            }
        });
    }

    ui.separator();
    ui.weak(format!("{} messages stored", state.chat.log().len()));
    ui.weak(state.connection.label());

    actions
}
