//! HTTP client for the fetch and submit webhooks

mod client;
mod error;
mod traits;

pub use client::WebhookClient;
pub use error::{FetchError, SubmitError};
pub use traits::WebhookClientTrait;

#[cfg(test)]
pub use traits::MockWebhookClientTrait;
