use eframe::egui;

use crate::ui::state::{AppState, ConnectionState, StatusKind};

pub fn render(ui: &mut egui::Ui, state: &AppState) {
    ui.heading("Status");
    ui.separator();

    ui.horizontal(|ui| {
        let (color, label) = match state.connection {
            ConnectionState::Connecting => (egui::Color32::YELLOW, "connecting"),
            ConnectionState::Connected => (egui::Color32::GREEN, "connected"),
            ConnectionState::Disconnected => (egui::Color32::RED, "disconnected"),
        };
        ui.colored_label(color, "●");
        ui.label(format!("{} ({label})", state.identity));
    });

    ui.horizontal(|ui| {
        ui.label("Messages:");
        ui.label(format!("{}", state.messages.len()));
    });

    if state.pending_submissions > 0 {
        ui.label(
            egui::RichText::new(format!("Sending {}…", state.pending_submissions)).weak(),
        );
    }

    ui.separator();

    ui.label("Recent Events:");
    egui::ScrollArea::vertical()
        .max_height(300.0)
        .show(ui, |ui| {
            for event in state.status_events.iter().rev().take(20) {
                let time_str = event.timestamp.format("%H:%M:%S");
                let color = match event.kind {
                    StatusKind::Success => egui::Color32::GREEN,
                    StatusKind::Warning => egui::Color32::YELLOW,
                    StatusKind::Error => egui::Color32::RED,
                    StatusKind::Info => egui::Color32::WHITE,
                };

                ui.horizontal(|ui| {
                    ui.colored_label(color, format!("[{}]", time_str));
                    ui.label(&event.message);
                });
            }
        });
}
