use eframe::egui;

use crate::ui::state::AppState;

pub fn render(ui: &mut egui::Ui, state: &AppState) {
    let Some(peer) = state.selected_peer.as_deref() else {
        ui.centered_and_justified(|ui| {
            ui.weak("Select a chat on the left to view the conversation");
        });
        return;
    };

    let conversation = state.chat.conversation(peer);

    ui.horizontal(|ui| {
        ui.heading(format!("Chat with {peer}"));
        if state.chat.peer_is_typing(peer) {
            ui.label(egui::RichText::new("typing...").weak().italics());
        }
    });
    ui.weak(format!("{} messages", conversation.len()));
    ui.separator();

    egui::ScrollArea::vertical()
        .stick_to_bottom(true)
        .auto_shrink([false, false])
        .show(ui, |ui| {
            if conversation.is_empty() {
                ui.weak("No messages in this chat yet.");
                return;
            }

            for msg in &conversation {
                let mine = state.chat.is_mine(msg);
                let layout = if mine {
                    egui::Layout::right_to_left(egui::Align::TOP)
                } else {
                    egui::Layout::left_to_right(egui::Align::TOP)
                };

                ui.with_layout(layout, |ui| {
                    let author = if mine { "You" } else { msg.from.as_str() };
                    ui.label(format!("{author}: {}", msg.message));
                    if let Some(ts) = msg.ts {
                        ui.label(egui::RichText::new(format_ts(ts)).weak().small());
                    }
                });
            }
        });
}

fn format_ts(ts: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ts)
        .map(|time| time.format("%H:%M:%S").to_string())
        .unwrap_or_default()
}
