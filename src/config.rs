use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config/client.json";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_SOCKETIO_PATH: &str = "socket.io";
pub const DEFAULT_FORM_ACTION: &str = "/api/messages";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default = "default_socketio_path")]
    pub socketio_path: String,
    /// Endpoint returning the messages that already exist for this user.
    #[serde(default)]
    pub history_path: Option<String>,
    #[serde(default)]
    pub send_form: SendFormConfig,
}

/// Declared shape of the send form: its action and its fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendFormConfig {
    #[serde(default = "default_form_action")]
    pub action: String,
    #[serde(default = "default_form_fields")]
    pub fields: Vec<FormFieldConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormFieldConfig {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub value: String,
    /// Hidden fields are submitted but not editable.
    #[serde(default)]
    pub hidden: bool,
}

impl FormFieldConfig {
    fn visible(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: Some(label.to_string()),
            value: String::new(),
            hidden: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            nickname: None,
            socketio_path: default_socketio_path(),
            history_path: None,
            send_form: SendFormConfig::default(),
        }
    }
}

impl Default for SendFormConfig {
    fn default() -> Self {
        Self {
            action: default_form_action(),
            fields: default_form_fields(),
        }
    }
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_socketio_path() -> String {
    DEFAULT_SOCKETIO_PATH.to_string()
}

fn default_form_action() -> String {
    DEFAULT_FORM_ACTION.to_string()
}

fn default_form_fields() -> Vec<FormFieldConfig> {
    vec![
        FormFieldConfig::visible("to", "To"),
        FormFieldConfig::visible("content", "Message"),
    ]
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config("does/not/exist.json");
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert!(config.nickname.is_none());
        assert_eq!(config.send_form.action, DEFAULT_FORM_ACTION);
        let names: Vec<_> = config.send_form.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["to", "content"]);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{
                "nickname": "alice",
                "history_path": "/api/users/1/messages",
                "send_form": {
                    "fields": [
                        {"name": "author_id", "value": "1", "hidden": true},
                        {"name": "recipient_id", "label": "To"},
                        {"name": "content"}
                    ]
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.nickname.as_deref(), Some("alice"));
        assert_eq!(config.socketio_path, DEFAULT_SOCKETIO_PATH);
        assert_eq!(config.send_form.action, DEFAULT_FORM_ACTION);
        assert!(config.send_form.fields[0].hidden);
        assert_eq!(config.send_form.fields[0].value, "1");
        assert!(config.send_form.fields[2].label.is_none());
    }

    #[test]
    fn unparsable_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join(format!("chat-config-{}.json", uuid::Uuid::new_v4()));
        fs::write(&path, "{ not json").unwrap();
        let config = load_config(path.to_str().unwrap());
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        fs::remove_file(path).ok();
    }
}
