use eframe::egui;

use crate::common::ChatMessage;

/// Display line for one message.
pub fn format_line(message: &ChatMessage) -> String {
    format!(
        "[from: {}, to : {}, on {}]: “ {} ”",
        message.author.nickname, message.recipient.nickname, message.date, message.content
    )
}

pub fn render(ui: &mut egui::Ui, messages: &[ChatMessage]) {
    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .max_height((ui.available_height() - 120.0).max(100.0))
        .show(ui, |ui| {
            if messages.is_empty() {
                ui.label(egui::RichText::new("No messages yet").weak());
            }
            for message in messages {
                ui.label(format_line(message));
            }
        });
}
