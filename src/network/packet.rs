//! Text framing for Engine.IO v4 and Socket.IO v5.
//!
//! Every WebSocket text frame carries one Engine.IO packet: a one-digit
//! type followed by its data. Socket.IO packets ride inside Engine.IO
//! `message` packets as `<type>[<namespace>,][<ack id>][<json>]`.
//! Binary attachments are not supported.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ClientError;

pub const DEFAULT_NAMESPACE: &str = "/";

/// Handshake data of the Engine.IO `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenHandshake {
    pub sid: String,
    pub ping_interval: u64,
    pub ping_timeout: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(OpenHandshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(frame: &str) -> Result<Self, ClientError> {
        let mut chars = frame.chars();
        let kind = chars
            .next()
            .ok_or_else(|| ClientError::Protocol("empty engine.io packet".into()))?;
        let data = chars.as_str();
        match kind {
            '0' => serde_json::from_str(data)
                .map(EnginePacket::Open)
                .map_err(|err| ClientError::Protocol(format!("bad open packet: {err}"))),
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping(data.to_string())),
            '3' => Ok(EnginePacket::Pong(data.to_string())),
            '4' => Ok(EnginePacket::Message(data.to_string())),
            '5' => Ok(EnginePacket::Upgrade),
            '6' => Ok(EnginePacket::Noop),
            other => Err(ClientError::Protocol(format!(
                "unknown engine.io packet type `{other}`"
            ))),
        }
    }

    /// Only the packets a client sends are encodable.
    pub fn encode(&self) -> Result<String, ClientError> {
        match self {
            EnginePacket::Close => Ok("1".to_string()),
            EnginePacket::Ping(data) => Ok(format!("2{data}")),
            EnginePacket::Pong(data) => Ok(format!("3{data}")),
            EnginePacket::Message(data) => Ok(format!("4{data}")),
            EnginePacket::Upgrade => Ok("5".to_string()),
            EnginePacket::Noop => Ok("6".to_string()),
            EnginePacket::Open(_) => Err(ClientError::Protocol(
                "open packets are only sent by the server".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        ack_id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack {
        namespace: String,
        ack_id: u64,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        data: Option<Value>,
    },
}

impl SocketPacket {
    pub fn event(name: &str, payload: Value) -> Self {
        SocketPacket::Event {
            namespace: DEFAULT_NAMESPACE.to_string(),
            ack_id: None,
            name: name.to_string(),
            args: vec![payload],
        }
    }

    pub fn connect() -> Self {
        SocketPacket::Connect {
            namespace: DEFAULT_NAMESPACE.to_string(),
            data: None,
        }
    }

    pub fn decode(data: &str) -> Result<Self, ClientError> {
        let mut chars = data.chars();
        let kind = chars
            .next()
            .ok_or_else(|| ClientError::Protocol("empty socket.io packet".into()))?;
        let rest = chars.as_str();

        if kind == '5' || kind == '6' {
            return Err(ClientError::Protocol(
                "binary socket.io packets are not supported".into(),
            ));
        }

        let (namespace, rest) = split_namespace(rest);
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (ack_digits, body) = rest.split_at(digits);
        let ack_id = if ack_digits.is_empty() {
            None
        } else {
            Some(ack_digits.parse::<u64>().map_err(|err| {
                ClientError::Protocol(format!("bad ack id `{ack_digits}`: {err}"))
            })?)
        };
        let body = if body.is_empty() {
            None
        } else {
            Some(serde_json::from_str::<Value>(body).map_err(|err| {
                ClientError::Protocol(format!("bad socket.io payload: {err}"))
            })?)
        };

        match kind {
            '0' => Ok(SocketPacket::Connect { namespace, data: body }),
            '1' => Ok(SocketPacket::Disconnect { namespace }),
            '2' => {
                let mut args = match body {
                    Some(Value::Array(args)) => args,
                    _ => {
                        return Err(ClientError::Protocol(
                            "event payload must be a non-empty array".into(),
                        ));
                    }
                };
                if args.is_empty() {
                    return Err(ClientError::Protocol("event without a name".into()));
                }
                let name = match args.remove(0) {
                    Value::String(name) => name,
                    other => {
                        return Err(ClientError::Protocol(format!(
                            "event name must be a string, got {other}"
                        )));
                    }
                };
                Ok(SocketPacket::Event {
                    namespace,
                    ack_id,
                    name,
                    args,
                })
            }
            '3' => {
                let ack_id = ack_id
                    .ok_or_else(|| ClientError::Protocol("ack without an id".into()))?;
                let args = match body {
                    Some(Value::Array(args)) => args,
                    _ => Vec::new(),
                };
                Ok(SocketPacket::Ack {
                    namespace,
                    ack_id,
                    args,
                })
            }
            '4' => Ok(SocketPacket::ConnectError { namespace, data: body }),
            other => Err(ClientError::Protocol(format!(
                "unknown socket.io packet type `{other}`"
            ))),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            SocketPacket::Connect { namespace, data } => {
                let mut out = format!("0{}", namespace_prefix(namespace));
                if let Some(data) = data {
                    out.push_str(&data.to_string());
                }
                out
            }
            SocketPacket::Disconnect { namespace } => {
                format!("1{}", namespace_prefix(namespace))
            }
            SocketPacket::Event {
                namespace,
                ack_id,
                name,
                args,
            } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().cloned());
                format!(
                    "2{}{}{}",
                    namespace_prefix(namespace),
                    ack_id.map(|id| id.to_string()).unwrap_or_default(),
                    Value::Array(items)
                )
            }
            SocketPacket::Ack {
                namespace,
                ack_id,
                args,
            } => format!(
                "3{}{}{}",
                namespace_prefix(namespace),
                ack_id,
                Value::Array(args.clone())
            ),
            SocketPacket::ConnectError { namespace, data } => {
                let mut out = format!("4{}", namespace_prefix(namespace));
                if let Some(data) = data {
                    out.push_str(&data.to_string());
                }
                out
            }
        }
    }
}

fn split_namespace(rest: &str) -> (String, &str) {
    if !rest.starts_with('/') {
        return (DEFAULT_NAMESPACE.to_string(), rest);
    }
    match rest.find(',') {
        Some(comma) => (rest[..comma].to_string(), &rest[comma + 1..]),
        None => (rest.to_string(), ""),
    }
}

fn namespace_prefix(namespace: &str) -> String {
    if namespace == DEFAULT_NAMESPACE {
        String::new()
    } else {
        format!("{namespace},")
    }
}
