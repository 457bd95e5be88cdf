use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::common::{FormSubmission, SubmitStatus};
use crate::error::ClientError;

/// Posts the send form as JSON, the way the page did with `fetch`.
#[derive(Clone)]
pub struct FormSubmitter {
    http: reqwest::Client,
}

impl FormSubmitter {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Sends one submission. The response body is not read; only the
    /// status code is reported back.
    pub async fn submit(
        &self,
        target: Url,
        submission: &FormSubmission,
    ) -> Result<u16, ClientError> {
        let body = serde_json::to_vec(&submission.to_json())
            .map_err(|err| ClientError::Decode(err.to_string()))?;
        log::debug!("POST {target} ({} fields)", submission.fields.len());
        let response = self
            .http
            .post(target)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        Ok(response.status().as_u16())
    }

    /// Like `submit`, folded into a status the UI can show.
    pub async fn submit_status(&self, target: Url, submission: &FormSubmission) -> SubmitStatus {
        match self.submit(target, submission).await {
            Ok(status) if (200..300).contains(&status) => SubmitStatus::Delivered { status },
            Ok(status) => SubmitStatus::Rejected { status },
            Err(err) => SubmitStatus::Failed {
                reason: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn form(fields: &[(&str, &str)]) -> FormSubmission {
        FormSubmission::new(
            "/api/messages",
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[tokio::test]
    async fn posts_json_body_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/messages"))
            .and(header("content-type", "application/json"))
            .and(body_string(r#"{"to":"bob","content":"hello"}"#))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let submitter = FormSubmitter::new(reqwest::Client::new());
        let target = Url::parse(&format!("{}/api/messages", server.uri())).unwrap();
        let status = submitter
            .submit_status(target, &form(&[("to", "bob"), ("content", "hello")]))
            .await;

        assert_eq!(status, SubmitStatus::Delivered { status: 200 });
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("bad"))
            .mount(&server)
            .await;

        let submitter = FormSubmitter::new(reqwest::Client::new());
        let target = Url::parse(&format!("{}/api/messages", server.uri())).unwrap();
        let status = submitter
            .submit_status(target, &form(&[("content", "hello")]))
            .await;

        assert_eq!(status, SubmitStatus::Rejected { status: 422 });
    }

    #[tokio::test]
    async fn network_error_is_failed() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let submitter = FormSubmitter::new(reqwest::Client::new());
        let target = Url::parse(&format!("http://{addr}/api/messages")).unwrap();
        let status = submitter
            .submit_status(target, &form(&[("content", "hello")]))
            .await;

        assert!(matches!(status, SubmitStatus::Failed { .. }));
    }
}
