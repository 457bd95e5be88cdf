use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

use crate::common::{
    ChatMessage, FormSubmission, NetworkCommand, NetworkEvent, PresenceAck, SubmitStatus,
};
use crate::common::types::PRESENCE_EVENT;
use crate::error::ClientError;

use super::history::fetch_history;
use super::session::Session;
use super::submitter::FormSubmitter;
use super::transport::{MessageSource, SourceEvent};

/// Network side of the client: drives a realtime source, turns pushed
/// payloads into UI events and runs form submissions.
pub struct ChatClient {
    session: Session,
    http: reqwest::Client,
    submitter: FormSubmitter,
    history_target: Option<Url>,
    event_sender: mpsc::Sender<NetworkEvent>,
    command_receiver: mpsc::Receiver<NetworkCommand>,
}

impl ChatClient {
    pub fn new(
        session: Session,
        event_sender: mpsc::Sender<NetworkEvent>,
        command_receiver: mpsc::Receiver<NetworkCommand>,
    ) -> Self {
        let http = reqwest::Client::new();
        Self {
            session,
            submitter: FormSubmitter::new(http.clone()),
            http,
            history_target: None,
            event_sender,
            command_receiver,
        }
    }

    pub fn with_history(mut self, target: Url) -> Self {
        self.history_target = Some(target);
        self
    }

    /// Runs until the UI drops its command sender. A lost or refused
    /// realtime connection does not stop form submissions.
    pub async fn run<S>(mut self, mut source: S) -> Result<(), ClientError>
    where
        S: MessageSource + 'static,
    {
        log::info!("Starting chat client as `{}`", self.session.identity());

        if let Some(target) = self.history_target.clone() {
            self.spawn_history(target);
        }

        source.subscribe(self.session.channel());
        let (mut source_events, reader) = match source.connect().await {
            Ok(()) => {
                self.announce_presence(&mut source).await;
                self.notify(NetworkEvent::Connected).await;
                let (events, reader) = spawn_reader(source);
                (Some(events), Some(reader))
            }
            Err(err) => {
                log::warn!("Realtime connection failed: {err}");
                self.notify(NetworkEvent::ConnectionFailed(err.to_string()))
                    .await;
                (None, None)
            }
        };

        loop {
            tokio::select! {
                command = self.command_receiver.recv() => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => break,
                    }
                }
                event = recv_source(&mut source_events), if source_events.is_some() => {
                    match event {
                        Some(Ok(event)) => self.handle_source_event(event).await,
                        Some(Err(err)) => {
                            source_events = None;
                            log::warn!("Realtime connection lost: {err}");
                            self.notify(NetworkEvent::Disconnected(err.to_string())).await;
                        }
                        None => {
                            source_events = None;
                            log::info!("Realtime connection closed");
                            self.notify(NetworkEvent::Disconnected("connection closed".into()))
                                .await;
                        }
                    }
                }
            }
        }

        if let Some(reader) = reader {
            reader.abort();
        }
        log::info!("Chat client stopped");
        Ok(())
    }

    async fn announce_presence<S: MessageSource>(&self, source: &mut S) {
        let ack = PresenceAck {
            messages: self.session.presence_message(),
        };
        let payload = match serde_json::to_value(&ack) {
            Ok(payload) => payload,
            Err(err) => {
                log::warn!("Failed to serialize presence ack: {err}");
                return;
            }
        };
        if let Err(err) = source.emit(PRESENCE_EVENT, payload).await {
            log::warn!("Failed to announce presence: {err}");
        }
    }

    /// History is optional; it loads on its own task so a slow endpoint
    /// never holds up the connection or the form.
    fn spawn_history(&self, target: Url) {
        let http = self.http.clone();
        let sender = self.event_sender.clone();
        tokio::spawn(async move {
            let event = match fetch_history(&http, target).await {
                Ok(history) => {
                    log::info!("Loaded {} earlier messages", history.len());
                    NetworkEvent::HistorySynced(history)
                }
                Err(err) => {
                    log::warn!("Failed to load message history: {err}");
                    NetworkEvent::HistoryFailed(err.to_string())
                }
            };
            if let Err(err) = sender.send(event).await {
                log::warn!("Failed to report message history: {err}");
            }
        });
    }

    fn handle_command(&self, command: NetworkCommand) {
        match command {
            NetworkCommand::SubmitForm(submission) => self.spawn_submission(submission),
        }
    }

    /// The request runs on its own task so incoming messages keep flowing
    /// while it is outstanding.
    fn spawn_submission(&self, submission: FormSubmission) {
        let id = submission.id;
        let target = match self.session.resolve(&submission.action) {
            Ok(target) => target,
            Err(err) => {
                let sender = self.event_sender.clone();
                tokio::spawn(async move {
                    let status = SubmitStatus::Failed {
                        reason: err.to_string(),
                    };
                    let _ = sender.send(NetworkEvent::SubmitFinished { id, status }).await;
                });
                return;
            }
        };

        let submitter = self.submitter.clone();
        let sender = self.event_sender.clone();
        tokio::spawn(async move {
            let status = submitter.submit_status(target, &submission).await;
            if !status.is_delivered() {
                log::warn!("Form submission {id} did not go through: {status:?}");
            }
            if let Err(err) = sender.send(NetworkEvent::SubmitFinished { id, status }).await {
                log::warn!("Failed to report submission result: {err}");
            }
        });
    }

    async fn handle_source_event(&self, event: SourceEvent) {
        let SourceEvent::Event { channel, payload } = event;
        if channel != self.session.channel() {
            log::debug!("Ignoring event on channel `{channel}`");
            return;
        }

        match ChatMessage::from_payload(&payload) {
            Ok(message) => self.notify(NetworkEvent::MessageReceived(message)).await,
            Err(err) => {
                log::warn!("Dropping undecodable message on `{channel}`: {err}");
                let raw = match payload {
                    Value::String(raw) => raw,
                    other => other.to_string(),
                };
                self.notify(NetworkEvent::DecodeFailed {
                    raw,
                    error: err.to_string(),
                })
                .await;
            }
        }
    }

    async fn notify(&self, event: NetworkEvent) {
        if let Err(err) = self.event_sender.send(event).await {
            log::warn!("Failed to forward network event: {err}");
        }
    }
}

type SourceItem = Result<SourceEvent, ClientError>;

/// Reads the source on its own task so a read is never cancelled halfway,
/// e.g. while a pong is being written. The channel closes when the
/// connection ends.
fn spawn_reader<S>(mut source: S) -> (mpsc::Receiver<SourceItem>, JoinHandle<()>)
where
    S: MessageSource + 'static,
{
    let (tx, rx) = mpsc::channel(100);
    let reader = tokio::spawn(async move {
        loop {
            match source.next_event().await {
                Ok(Some(event)) => {
                    if tx.send(Ok(event)).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    let _ = tx.send(Err(err)).await;
                    break;
                }
            }
        }
    });
    (rx, reader)
}

async fn recv_source(events: &mut Option<mpsc::Receiver<SourceItem>>) -> Option<SourceItem> {
    match events {
        Some(events) => events.recv().await,
        None => None,
    }
}
