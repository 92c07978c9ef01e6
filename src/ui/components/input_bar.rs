use eframe::egui;

/// What the message input did this frame.
#[derive(Default)]
pub struct InputActions {
    pub send: Option<String>,
    /// Some(true) when the field gained focus, Some(false) when it lost it.
    /// Mirrors the focus/blur pair a typing indicator is driven by.
    pub typing_changed: Option<bool>,
}

pub fn render(ui: &mut egui::Ui, input_text: &mut String) -> InputActions {
    let mut actions = InputActions::default();
    let mut send = false;

    ui.horizontal(|ui| {
        let response = ui.text_edit_singleline(input_text);
        if ui.button("Send").clicked() {
            send = true;
        }

        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            send = true;
        }

        if response.gained_focus() {
            actions.typing_changed = Some(true);
        } else if response.lost_focus() {
            actions.typing_changed = Some(false);
        }
    });

    if send && !input_text.is_empty() {
        actions.send = Some(input_text.clone());
        input_text.clear();
    }

    actions
}
