use eframe::egui;
use tokio::sync::mpsc;

use crate::common::{NetworkCommand, NetworkEvent};

use super::components::{chat_area, send_form, status_panel};
use super::state::{AppState, StatusKind};

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
            self.state.apply(event);
        }
    }

    fn submit_form(&mut self) {
        let submission = self.state.build_submission();
        if let Err(err) = self
            .command_sender
            .try_send(NetworkCommand::SubmitForm(submission))
        {
            self.state.pending_submissions = self.state.pending_submissions.saturating_sub(1);
            log::warn!("Failed to send command to network: {err}");
            self.state
                .add_status(StatusKind::Error, format!("Could not queue message: {err}"));
        }
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_network_events();

        egui::SidePanel::right("status_panel")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                status_panel::render(ui, &self.state);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(format!("Inbox of {}", self.state.identity));
            ui.separator();
            chat_area::render(ui, &self.state.messages);

            ui.separator();
            if send_form::render(ui, &mut self.state.form_fields) {
                self.submit_form();
            }
        });

        ctx.request_repaint();
    }
}
