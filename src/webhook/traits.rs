//! Trait abstraction for the webhook client to enable mocking in tests

use super::error::{FetchError, SubmitError};
use crate::state::{DefinitionKind, FormDefinition};
use crate::submission::SubmissionPayload;
use async_trait::async_trait;

/// Webhook operations, enabling mocking in tests
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebhookClientTrait: Send + Sync {
    /// Fetch and parse the definition with the given identifier
    async fn fetch_definition(
        &self,
        kind: DefinitionKind,
        id: &str,
    ) -> Result<FormDefinition, FetchError>;

    /// Post a submission payload
    async fn submit(
        &self,
        kind: DefinitionKind,
        payload: &SubmissionPayload,
    ) -> Result<(), SubmitError>;
}
