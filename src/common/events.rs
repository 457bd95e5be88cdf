use uuid::Uuid;

use super::types::{ChatMessage, SubmitStatus};

/// Events sent from the network task up to the UI.
#[derive(Debug, Clone)]
pub enum NetworkEvent {
    Connected,
    ConnectionFailed(String),
    Disconnected(String),
    /// Messages that existed before this session, oldest first.
    HistorySynced(Vec<ChatMessage>),
    HistoryFailed(String),
    MessageReceived(ChatMessage),
    /// A payload on the identity's channel could not be decoded.
    DecodeFailed { raw: String, error: String },
    SubmitFinished { id: Uuid, status: SubmitStatus },
}
