use chrono::{DateTime, Utc};

use crate::common::{ChatMessage, FormSubmission, NetworkEvent, SubmitStatus};
use crate::config::{FormFieldConfig, SendFormConfig};

const MAX_STATUS_EVENTS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

/// One line of the status log.
#[derive(Debug, Clone)]
pub struct StatusEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: StatusKind,
    pub message: String,
}

/// A field of the send form and its current value.
#[derive(Debug, Clone)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub value: String,
    pub hidden: bool,
}

impl From<&FormFieldConfig> for FormField {
    fn from(config: &FormFieldConfig) -> Self {
        Self {
            name: config.name.clone(),
            label: config.label.clone().unwrap_or_else(|| config.name.clone()),
            value: config.value.clone(),
            hidden: config.hidden,
        }
    }
}

/// Local UI state.
pub struct AppState {
    pub identity: String,
    pub connection: ConnectionState,
    /// Append-only, in arrival order.
    pub messages: Vec<ChatMessage>,
    pub form_action: String,
    pub form_fields: Vec<FormField>,
    pub pending_submissions: usize,
    pub status_events: Vec<StatusEvent>,
}

impl AppState {
    pub fn new(identity: &str, form: &SendFormConfig) -> Self {
        Self {
            identity: identity.to_string(),
            connection: ConnectionState::Connecting,
            messages: Vec::new(),
            form_action: form.action.clone(),
            form_fields: form.fields.iter().map(FormField::from).collect(),
            pending_submissions: 0,
            status_events: Vec::new(),
        }
    }

    pub fn apply(&mut self, event: NetworkEvent) {
        match event {
            NetworkEvent::Connected => {
                self.connection = ConnectionState::Connected;
                let message = format!("Connected as {}", self.identity);
                self.add_status(StatusKind::Success, message);
            }
            NetworkEvent::ConnectionFailed(reason) => {
                self.connection = ConnectionState::Disconnected;
                self.add_status(StatusKind::Error, format!("Connection failed: {reason}"));
            }
            NetworkEvent::Disconnected(reason) => {
                self.connection = ConnectionState::Disconnected;
                self.add_status(StatusKind::Warning, format!("Disconnected: {reason}"));
            }
            NetworkEvent::HistorySynced(history) => self.push_history(history),
            NetworkEvent::HistoryFailed(reason) => {
                self.add_status(StatusKind::Warning, format!("History unavailable: {reason}"));
            }
            NetworkEvent::MessageReceived(message) => self.push_message(message),
            NetworkEvent::DecodeFailed { raw, error } => {
                self.add_status(
                    StatusKind::Error,
                    format!("Unreadable message ({error}): {}", preview(&raw)),
                );
            }
            NetworkEvent::SubmitFinished { id, status } => {
                self.pending_submissions = self.pending_submissions.saturating_sub(1);
                let short_id: String = id.to_string().chars().take(8).collect();
                match status {
                    SubmitStatus::Delivered { status } => self.add_status(
                        StatusKind::Success,
                        format!("Message {short_id} sent (HTTP {status})"),
                    ),
                    SubmitStatus::Rejected { status } => self.add_status(
                        StatusKind::Error,
                        format!("Message {short_id} rejected (HTTP {status})"),
                    ),
                    SubmitStatus::Failed { reason } => self.add_status(
                        StatusKind::Error,
                        format!("Message {short_id} failed: {reason}"),
                    ),
                }
            }
        }
    }

    pub fn push_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Earlier messages go before anything received live.
    pub fn push_history(&mut self, history: Vec<ChatMessage>) {
        let count = history.len();
        self.messages.splice(0..0, history);
        self.add_status(StatusKind::Info, format!("Loaded {count} earlier messages"));
    }

    /// Snapshot of the form as it would be submitted. Field values are
    /// left in place.
    pub fn build_submission(&mut self) -> FormSubmission {
        let fields = self
            .form_fields
            .iter()
            .map(|field| (field.name.clone(), field.value.clone()))
            .collect();
        self.pending_submissions += 1;
        FormSubmission::new(self.form_action.clone(), fields)
    }

    pub fn add_status(&mut self, kind: StatusKind, message: String) {
        self.status_events.push(StatusEvent {
            timestamp: Utc::now(),
            kind,
            message,
        });

        if self.status_events.len() > MAX_STATUS_EVENTS {
            self.status_events.remove(0);
        }
    }
}

fn preview(raw: &str) -> String {
    const MAX: usize = 60;
    if raw.chars().count() <= MAX {
        raw.to_string()
    } else {
        let cut: String = raw.chars().take(MAX).collect();
        format!("{cut}…")
    }
}
