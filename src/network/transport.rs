use std::collections::HashSet;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use crate::error::ClientError;

use super::packet::{DEFAULT_NAMESPACE, EnginePacket, SocketPacket};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Something pushed by the realtime backend on a subscribed channel.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    Event { channel: String, payload: Value },
}

/// A realtime message source: connect once, subscribe to named channels,
/// emit events and pull pushed events.
#[async_trait]
pub trait MessageSource: Send {
    /// Only events on subscribed channels are returned by `next_event`.
    fn subscribe(&mut self, channel: &str);

    async fn connect(&mut self) -> Result<(), ClientError>;

    async fn emit(&mut self, event: &str, payload: Value) -> Result<(), ClientError>;

    /// `Ok(None)` once the connection has ended.
    async fn next_event(&mut self) -> Result<Option<SourceEvent>, ClientError>;
}

/// Builds the Engine.IO WebSocket endpoint for a backend base url.
pub fn socketio_endpoint(server_url: &Url, socketio_path: &str) -> Result<Url, ClientError> {
    let mut endpoint = server_url.clone();
    let scheme = match server_url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(ClientError::InvalidUrl {
                url: server_url.to_string(),
                reason: format!("unsupported scheme `{other}`"),
            });
        }
    };
    endpoint
        .set_scheme(scheme)
        .map_err(|()| ClientError::InvalidUrl {
            url: server_url.to_string(),
            reason: format!("cannot switch scheme to {scheme}"),
        })?;
    endpoint.set_path(&format!("/{}/", socketio_path.trim_matches('/')));
    endpoint.set_query(Some("EIO=4&transport=websocket"));
    endpoint.set_fragment(None);
    Ok(endpoint)
}

/// Socket.IO client speaking the WebSocket transport directly.
pub struct WebSocketSource {
    endpoint: Url,
    stream: Option<WsStream>,
    subscriptions: HashSet<String>,
}

impl WebSocketSource {
    pub fn new(server_url: &Url, socketio_path: &str) -> Result<Self, ClientError> {
        Ok(Self {
            endpoint: socketio_endpoint(server_url, socketio_path)?,
            stream: None,
            subscriptions: HashSet::new(),
        })
    }

    async fn send_packet(&mut self, packet: EnginePacket) -> Result<(), ClientError> {
        let frame = packet.encode()?;
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| ClientError::Transport("not connected".into()))?;
        stream
            .send(Message::Text(frame.into()))
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))
    }

    /// Next Engine.IO packet, answering pings on the way.
    async fn next_packet(&mut self) -> Result<Option<EnginePacket>, ClientError> {
        loop {
            let Some(stream) = self.stream.as_mut() else {
                return Ok(None);
            };
            let frame = match stream.next().await {
                Some(Ok(Message::Text(text))) => text,
                Some(Ok(Message::Close(_))) | None => {
                    self.stream = None;
                    return Ok(None);
                }
                Some(Ok(_)) => continue,
                Some(Err(err)) => {
                    self.stream = None;
                    return Err(ClientError::Transport(err.to_string()));
                }
            };

            let packet = match EnginePacket::decode(frame.as_str()) {
                Ok(packet) => packet,
                Err(err) => {
                    log::warn!("Dropping undecodable engine.io frame: {err}");
                    continue;
                }
            };

            match packet {
                EnginePacket::Ping(data) => {
                    log::trace!("engine.io ping");
                    self.send_packet(EnginePacket::Pong(data)).await?;
                }
                EnginePacket::Close => {
                    self.stream = None;
                    return Ok(None);
                }
                EnginePacket::Noop | EnginePacket::Pong(_) | EnginePacket::Upgrade => {}
                packet => return Ok(Some(packet)),
            }
        }
    }

    fn connect_error(&self, reason: impl Into<String>) -> ClientError {
        ClientError::Connect {
            url: self.endpoint.to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl MessageSource for WebSocketSource {
    fn subscribe(&mut self, channel: &str) {
        self.subscriptions.insert(channel.to_string());
    }

    async fn connect(&mut self) -> Result<(), ClientError> {
        log::info!("Connecting to {}", self.endpoint);
        let (stream, _) = connect_async(self.endpoint.as_str())
            .await
            .map_err(|err| self.connect_error(err.to_string()))?;
        self.stream = Some(stream);

        match self.next_packet().await? {
            Some(EnginePacket::Open(open)) => {
                log::debug!(
                    "engine.io session {} (ping interval {}ms, timeout {}ms)",
                    open.sid,
                    open.ping_interval,
                    open.ping_timeout
                );
            }
            other => {
                return Err(self.connect_error(format!("expected open packet, got {other:?}")));
            }
        }

        self.send_packet(EnginePacket::Message(SocketPacket::connect().encode()))
            .await?;

        loop {
            let packet = match self.next_packet().await? {
                Some(EnginePacket::Message(data)) => SocketPacket::decode(&data)?,
                Some(other) => {
                    log::debug!("Ignoring {other:?} during socket.io connect");
                    continue;
                }
                None => return Err(self.connect_error("connection closed during handshake")),
            };
            match packet {
                SocketPacket::Connect { namespace, .. } if namespace == DEFAULT_NAMESPACE => {
                    log::info!("Connected to {}", self.endpoint);
                    return Ok(());
                }
                SocketPacket::ConnectError { data, .. } => {
                    let reason = data.map(|d| d.to_string()).unwrap_or_default();
                    return Err(self.connect_error(format!("connect refused: {reason}")));
                }
                other => log::debug!("Ignoring {other:?} during socket.io connect"),
            }
        }
    }

    async fn emit(&mut self, event: &str, payload: Value) -> Result<(), ClientError> {
        let packet = SocketPacket::event(event, payload);
        self.send_packet(EnginePacket::Message(packet.encode())).await
    }

    async fn next_event(&mut self) -> Result<Option<SourceEvent>, ClientError> {
        loop {
            let data = match self.next_packet().await? {
                Some(EnginePacket::Message(data)) => data,
                Some(other) => {
                    log::debug!("Ignoring engine.io packet {other:?}");
                    continue;
                }
                None => return Ok(None),
            };

            let packet = match SocketPacket::decode(&data) {
                Ok(packet) => packet,
                Err(err) => {
                    log::warn!("Dropping undecodable socket.io packet: {err}");
                    continue;
                }
            };

            match packet {
                SocketPacket::Event { name, mut args, .. } => {
                    if !self.subscriptions.contains(&name) {
                        log::debug!("Ignoring event on unsubscribed channel `{name}`");
                        continue;
                    }
                    let payload = if args.is_empty() {
                        Value::Null
                    } else {
                        args.remove(0)
                    };
                    return Ok(Some(SourceEvent::Event {
                        channel: name,
                        payload,
                    }));
                }
                SocketPacket::Disconnect { .. } => {
                    log::info!("Server closed the socket.io session");
                    self.stream = None;
                    return Ok(None);
                }
                other => log::debug!("Ignoring socket.io packet {other:?}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    #[test]
    fn endpoint_switches_scheme_and_path() {
        let base = Url::parse("http://127.0.0.1:5000/front/users/1").unwrap();
        assert_eq!(
            socketio_endpoint(&base, "socket.io").unwrap().as_str(),
            "ws://127.0.0.1:5000/socket.io/?EIO=4&transport=websocket"
        );
        let secure = Url::parse("https://chat.example.com").unwrap();
        assert_eq!(
            socketio_endpoint(&secure, "/rt/").unwrap().as_str(),
            "wss://chat.example.com/rt/?EIO=4&transport=websocket"
        );
        let ftp = Url::parse("ftp://chat.example.com").unwrap();
        assert!(socketio_endpoint(&ftp, "socket.io").is_err());
    }

    /// Plays the server side of one session: handshake, a ping, a garbled
    /// frame, one event on a foreign channel, one on "alice", then close.
    async fn fake_server(listener: TcpListener) -> Vec<String> {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(tcp).await.unwrap();
        let mut received = Vec::new();

        ws.send(Message::Text(
            r#"0{"sid":"s1","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#.into(),
        ))
        .await
        .unwrap();

        let connect = ws.next().await.unwrap().unwrap();
        received.push(connect.to_text().unwrap().to_string());
        ws.send(Message::Text(r#"40{"sid":"n1"}"#.into())).await.unwrap();

        let ack = ws.next().await.unwrap().unwrap();
        received.push(ack.to_text().unwrap().to_string());

        ws.send(Message::Text("2".into())).await.unwrap();
        let pong = ws.next().await.unwrap().unwrap();
        received.push(pong.to_text().unwrap().to_string());

        ws.send(Message::Text("9x".into())).await.unwrap();
        ws.send(Message::Text(r#"42["bob","{}"]"#.into())).await.unwrap();
        ws.send(Message::Text(r#"42["alice","{\"content\":\"hi\"}"]"#.into()))
            .await
            .unwrap();
        ws.send(Message::Text("1".into())).await.unwrap();
        received
    }

    #[tokio::test]
    async fn websocket_session_skips_garbled_frames() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(fake_server(listener));

        let base = Url::parse(&format!("http://{addr}")).unwrap();
        let mut source = WebSocketSource::new(&base, "socket.io").unwrap();
        source.subscribe("alice");
        source.connect().await.unwrap();
        source
            .emit("connect-ack", json!({"messages": "alice is connected"}))
            .await
            .unwrap();

        let event = source.next_event().await.unwrap();
        assert_eq!(
            event,
            Some(SourceEvent::Event {
                channel: "alice".into(),
                payload: json!("{\"content\":\"hi\"}"),
            })
        );
        assert_eq!(source.next_event().await.unwrap(), None);

        let received = server.await.unwrap();
        assert_eq!(
            received,
            vec![
                "40".to_string(),
                r#"42["connect-ack",{"messages":"alice is connected"}]"#.to_string(),
                "3".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn connect_fails_without_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let base = Url::parse(&format!("http://{addr}")).unwrap();
        let mut source = WebSocketSource::new(&base, "socket.io").unwrap();
        let err = source.connect().await.unwrap_err();
        assert!(matches!(err, ClientError::Connect { .. }));
    }
}
