use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ClientError;

/// Event name of the presence announcement sent once after connecting.
pub const PRESENCE_EVENT: &str = "connect-ack";

/// A user as embedded in a pushed message. Extra fields sent by the
/// backend (id, name, email) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(default = "undefined", deserialize_with = "display_text")]
    pub nickname: String,
}

/// Chat message pushed on the identity's channel. `author` and
/// `recipient` must be objects; the text leaves take any JSON value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub author: UserRef,
    pub recipient: UserRef,
    #[serde(default = "undefined", deserialize_with = "display_text")]
    pub date: String,
    #[serde(default = "undefined", deserialize_with = "display_text")]
    pub content: String,
}

fn undefined() -> String {
    "undefined".to_string()
}

/// Reads any JSON value as the text it shows up as in a rendered line:
/// `null` stays "null", numbers print without a trailing `.0`, arrays are
/// comma joined and objects collapse to "[object Object]".
fn display_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(render_value(&Value::deserialize(deserializer)?))
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) => f.to_string(),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => render_value(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

impl ChatMessage {
    /// Decodes an event payload. The backend sends the message as a
    /// JSON-encoded string; an already structured object is accepted too.
    pub fn from_payload(payload: &Value) -> Result<Self, ClientError> {
        match payload {
            Value::String(raw) => {
                serde_json::from_str(raw).map_err(|err| ClientError::Decode(err.to_string()))
            }
            Value::Object(_) => serde_json::from_value(payload.clone())
                .map_err(|err| ClientError::Decode(err.to_string())),
            other => Err(ClientError::Decode(format!(
                "unexpected payload type: {other}"
            ))),
        }
    }
}

/// Payload of the presence announcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceAck {
    pub messages: String,
}

/// One submit of the send form: where it goes and the field values at
/// submit time, in form order.
#[derive(Debug, Clone)]
pub struct FormSubmission {
    pub id: Uuid,
    pub action: String,
    pub fields: Vec<(String, String)>,
}

impl FormSubmission {
    pub fn new(action: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        Self {
            id: Uuid::new_v4(),
            action: action.into(),
            fields,
        }
    }

    /// Flattens the fields into a JSON object. A repeated name keeps its
    /// first position and takes the last value.
    pub fn to_json(&self) -> Map<String, Value> {
        let mut body = Map::new();
        for (name, value) in &self.fields {
            body.insert(name.clone(), Value::String(value.clone()));
        }
        body
    }
}

/// Outcome of a form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitStatus {
    Delivered { status: u16 },
    Rejected { status: u16 },
    Failed { reason: String },
}

impl SubmitStatus {
    pub fn is_delivered(&self) -> bool {
        matches!(self, SubmitStatus::Delivered { .. })
    }
}
