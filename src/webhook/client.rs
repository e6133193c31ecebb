//! reqwest client for the workflow engine's webhooks
//!
//! Both webhooks take a JSON `POST`. The fetch webhook answers with a
//! definition, possibly wrapped; the submit webhook's body is ignored.

use super::error::{describe_transport, FetchError, SubmitError};
use super::traits::WebhookClientTrait;
use crate::config::Endpoints;
use crate::state::{parse_definition, DefinitionError, DefinitionKind, FormDefinition};
use crate::submission::SubmissionPayload;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;

/// Client for the fetch and submit webhooks
pub struct WebhookClient {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl WebhookClient {
    /// Create a client with a per-request timeout
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hookform-tui/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, endpoints })
    }
}

/// `{"form_id": id}` or `{"quizid": id}`
pub(crate) fn fetch_request_body(kind: DefinitionKind, id: &str) -> Value {
    let mut body = Map::new();
    body.insert(kind.id_key().to_string(), Value::String(id.to_string()));
    Value::Object(body)
}

/// Decode a successful fetch response body
pub(crate) fn decode_fetch_body(body: &str) -> Result<Value, DefinitionError> {
    if body.trim().is_empty() {
        return Err(DefinitionError::NotJson("empty response".to_string()));
    }
    serde_json::from_str(body).map_err(|e| DefinitionError::NotJson(e.to_string()))
}

#[async_trait]
impl WebhookClientTrait for WebhookClient {
    async fn fetch_definition(
        &self,
        kind: DefinitionKind,
        id: &str,
    ) -> Result<FormDefinition, FetchError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(FetchError::MissingIdentifier);
        }

        let url = self.endpoints.fetch_url(kind);
        tracing::info!("Fetching {} {id} from {url}", kind.label());

        let response = self
            .http
            .post(url)
            .json(&fetch_request_body(kind, id))
            .send()
            .await
            .map_err(|e| FetchError::Network(describe_transport(&e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(describe_transport(&e)))?;

        if !status.is_success() {
            tracing::warn!("Fetch of {id} failed with {status}");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value = decode_fetch_body(&body)?;
        let definition = parse_definition(kind, id, value)?;
        tracing::info!(
            "Loaded {} {id} with {} questions",
            kind.label(),
            definition.questions.len()
        );
        Ok(definition)
    }

    async fn submit(
        &self,
        kind: DefinitionKind,
        payload: &SubmissionPayload,
    ) -> Result<(), SubmitError> {
        let url = self.endpoints.submit_url(kind);
        tracing::info!("Submitting {} to {url}", payload.submission_id);

        let response = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| SubmitError::Network(describe_transport(&e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Submission {} rejected with {status}", payload.submission_id);
            return Err(SubmitError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!("Submission {} accepted", payload.submission_id);
        Ok(())
    }
}
