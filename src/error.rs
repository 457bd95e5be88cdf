use thiserror::Error;

/// Errors surfaced by the chat client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No nickname was configured; the client cannot pick a channel.
    #[error("no nickname configured (use --nickname, CHAT_NICKNAME or the config file)")]
    MissingIdentity,

    #[error("invalid url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The realtime connection could not be established.
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    /// The realtime connection broke after it was established.
    #[error("transport error: {0}")]
    Transport(String),

    /// A packet did not follow the Engine.IO / Socket.IO framing.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A pushed payload could not be decoded into a chat message.
    #[error("failed to decode message: {0}")]
    Decode(String),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_display() {
        let err = ClientError::Connect {
            url: "ws://127.0.0.1:5000/socket.io/".into(),
            reason: "connection refused".into(),
        };
        assert!(err.to_string().contains("ws://127.0.0.1:5000"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn missing_identity_mentions_flag() {
        assert!(ClientError::MissingIdentity.to_string().contains("--nickname"));
    }

    #[test]
    fn decode_display() {
        let err = ClientError::Decode("expected value at line 1 column 1".into());
        assert_eq!(
            err.to_string(),
            "failed to decode message: expected value at line 1 column 1"
        );
    }
}
