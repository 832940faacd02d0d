//! Outbound notification channel.
//!
//! [`Notify`] is the seam between the pipeline and the external messaging
//! service, injected so the pipeline is testable without a live network.
//! The production implementation talks to the Slack Web API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::error::DeliveryError;

/// Operations the forwarding plan's actions are executed against.
///
/// Implementations must tolerate concurrent use from multiple sessions.
#[async_trait]
pub trait Notify: Send + Sync {
    async fn post_text(&self, channel: &str, text: &str) -> Result<(), DeliveryError>;

    async fn upload_file(
        &self,
        channel: &str,
        filename: &str,
        payload: Vec<u8>,
        comment: Option<String>,
    ) -> Result<(), DeliveryError>;
}

const SLACK_API: &str = "https://slack.com/api";

/// Applied at this collaborator boundary, not inside the pipeline.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SlackClient {
    token: String,
    client: reqwest::Client,
}

/// Slack answers 200 for application-level failures; `ok` is the real
/// verdict.
#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackClient {
    pub fn new(token: String) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { token, client })
    }

    fn api_url(method: &str) -> String {
        format!("{SLACK_API}/{method}")
    }

    async fn check(response: reqwest::Response) -> Result<(), DeliveryError> {
        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Rejected(format!("HTTP {status}")));
        }

        let body: ApiResponse = response.json().await?;
        if body.ok {
            Ok(())
        } else {
            Err(DeliveryError::Rejected(
                body.error.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}

#[async_trait]
impl Notify for SlackClient {
    async fn post_text(&self, channel: &str, text: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(Self::api_url("chat.postMessage"))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({
                "channel": channel,
                "text": text,
            }))
            .send()
            .await?;

        Self::check(response).await
    }

    async fn upload_file(
        &self,
        channel: &str,
        filename: &str,
        payload: Vec<u8>,
        comment: Option<String>,
    ) -> Result<(), DeliveryError> {
        let mut form = Form::new()
            .text("channels", channel.to_string())
            .text("filename", filename.to_string())
            .part("file", Part::bytes(payload).file_name(filename.to_string()));

        if let Some(comment) = comment {
            form = form.text("initial_comment", comment);
        }

        let response = self
            .client
            .post(Self::api_url("files.upload"))
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await?;

        Self::check(response).await
    }
}
