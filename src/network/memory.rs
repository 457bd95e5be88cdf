//! In-memory `MessageSource` for driving the client without a backend.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::ClientError;

use super::transport::{MessageSource, SourceEvent};

#[derive(Default)]
struct Shared {
    connects: usize,
    emitted: Vec<(String, Value)>,
}

pub struct MemorySource {
    incoming: mpsc::UnboundedReceiver<SourceEvent>,
    subscriptions: HashSet<String>,
    refuse_connect: bool,
    shared: Arc<Mutex<Shared>>,
}

/// Test-side handle: pushes events and inspects what the client emitted.
#[derive(Clone)]
pub struct MemoryHandle {
    outgoing: mpsc::UnboundedSender<SourceEvent>,
    shared: Arc<Mutex<Shared>>,
}

impl MemorySource {
    pub fn new() -> (Self, MemoryHandle) {
        let (outgoing, incoming) = mpsc::unbounded_channel();
        let shared = Arc::new(Mutex::new(Shared::default()));
        let source = Self {
            incoming,
            subscriptions: HashSet::new(),
            refuse_connect: false,
            shared: Arc::clone(&shared),
        };
        (source, MemoryHandle { outgoing, shared })
    }

    pub fn refusing() -> (Self, MemoryHandle) {
        let (mut source, handle) = Self::new();
        source.refuse_connect = true;
        (source, handle)
    }
}

impl MemoryHandle {
    pub fn push(&self, channel: &str, payload: Value) {
        let _ = self.outgoing.send(SourceEvent::Event {
            channel: channel.to_string(),
            payload,
        });
    }

    pub fn emitted(&self) -> Vec<(String, Value)> {
        self.shared.lock().unwrap().emitted.clone()
    }

    pub fn connects(&self) -> usize {
        self.shared.lock().unwrap().connects
    }
}

#[async_trait]
impl MessageSource for MemorySource {
    fn subscribe(&mut self, channel: &str) {
        self.subscriptions.insert(channel.to_string());
    }

    async fn connect(&mut self) -> Result<(), ClientError> {
        if self.refuse_connect {
            return Err(ClientError::Connect {
                url: "memory://".into(),
                reason: "refused".into(),
            });
        }
        self.shared.lock().unwrap().connects += 1;
        Ok(())
    }

    async fn emit(&mut self, event: &str, payload: Value) -> Result<(), ClientError> {
        self.shared
            .lock()
            .unwrap()
            .emitted
            .push((event.to_string(), payload));
        Ok(())
    }

    async fn next_event(&mut self) -> Result<Option<SourceEvent>, ClientError> {
        while let Some(event) = self.incoming.recv().await {
            let SourceEvent::Event { channel, .. } = &event;
            if self.subscriptions.contains(channel) {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }
}
