//! Fetch and submit failures

use crate::state::DefinitionError;
use std::io;
use thiserror::Error;

/// Why a definition could not be loaded
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no form identifier given")]
    MissingIdentifier,
    #[error("could not reach the form server: {0}")]
    Network(String),
    #[error("form server answered {status}{}", detail(.body))]
    Status { status: u16, body: String },
    #[error("form is not configured correctly: {0}")]
    InvalidConfiguration(#[from] DefinitionError),
}

impl FetchError {
    /// Retrying the same identifier might succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::MissingIdentifier | Self::InvalidConfiguration(_) => false,
        }
    }
}

/// Why a submission did not go through
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("could not read {filename}: {source}")]
    Encoding {
        filename: String,
        #[source]
        source: io::Error,
    },
    #[error("could not reach the submission server: {0}")]
    Network(String),
    #[error("submission rejected with status {status}{}", detail(.body))]
    Status { status: u16, body: String },
    #[error("file encoding task failed: {0}")]
    Task(String),
}

const MAX_DETAIL_CHARS: usize = 120;

fn detail(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return String::new();
    }
    let mut short: String = body.chars().take(MAX_DETAIL_CHARS).collect();
    if body.chars().count() > MAX_DETAIL_CHARS {
        short.push('…');
    }
    format!(": {short}")
}

/// Describe a transport error without the full reqwest chain
pub(crate) fn describe_transport(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        "connection failed".to_string()
    } else {
        err.to_string()
    }
}
