use url::Url;

use crate::error::ClientError;

/// Per-run connection context: who we are and where the backend lives.
/// Built once at start-up and handed to the client explicitly.
#[derive(Debug, Clone)]
pub struct Session {
    identity: String,
    server_url: Url,
}

impl Session {
    pub fn new(identity: &str, server_url: &str) -> Result<Self, ClientError> {
        let identity = identity.trim();
        if identity.is_empty() {
            return Err(ClientError::MissingIdentity);
        }
        let server_url = Url::parse(server_url).map_err(|err| ClientError::InvalidUrl {
            url: server_url.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self {
            identity: identity.to_string(),
            server_url,
        })
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Channel carrying messages addressed to this user.
    pub fn channel(&self) -> &str {
        &self.identity
    }

    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    pub fn presence_message(&self) -> String {
        format!("{} is connected", self.identity)
    }

    /// Resolves a form action or endpoint path the way a browser resolves
    /// it against the page URL.
    pub fn resolve(&self, target: &str) -> Result<Url, ClientError> {
        self.server_url
            .join(target)
            .map_err(|err| ClientError::InvalidUrl {
                url: target.to_string(),
                reason: err.to_string(),
            })
    }
}
