use url::Url;

use crate::common::ChatMessage;
use crate::error::ClientError;

/// Fetches the messages that already exist for the user, oldest first.
pub async fn fetch_history(
    http: &reqwest::Client,
    target: Url,
) -> Result<Vec<ChatMessage>, ClientError> {
    log::debug!("GET {target}");
    let messages = http
        .get(target)
        .send()
        .await?
        .error_for_status()?
        .json::<Vec<ChatMessage>>()
        .await?;
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn decodes_history_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "id": 1,
                    "author": {"id": 2, "name": "Bob", "email": "b@x", "nickname": "bob"},
                    "recipient": {"id": 1, "name": "Alice", "email": "a@x", "nickname": "alice"},
                    "content": "first",
                    "date": "Mon, 01 Jan 2024 10:00:00 GMT"
                }
            ])))
            .mount(&server)
            .await;

        let target = Url::parse(&format!("{}/api/users/1/messages", server.uri())).unwrap();
        let history = fetch_history(&reqwest::Client::new(), target).await.unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].author.nickname, "bob");
        assert_eq!(history[0].content, "first");
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let target = Url::parse(&format!("{}/api/users/1/messages", server.uri())).unwrap();
        let err = fetch_history(&reqwest::Client::new(), target).await.unwrap_err();
        assert!(matches!(err, ClientError::Http(_)));
    }
}
