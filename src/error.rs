use std::fmt::Debug;

use crate::utils::error_chain_fmt;

/// Everything that can go wrong during a subscribe call.
///
/// Only `TransportError`, `RemoteError` and `MalformedResponse` are retried;
/// everything else is returned on first occurrence. Bad credentials look the
/// same as a flaky server from here, so they are retried too.
#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("{0}")]
    InvalidOption(String),

    #[error("Error creating the request")]
    RequestConstructionError(#[source] anyhow::Error),

    #[error("Error sending request")]
    TransportError(#[from] reqwest::Error),

    /// Non-200 status, or a well-formed but negative answer
    #[error("{reason} - {response}")]
    RemoteError { reason: String, response: String },

    #[error("Error decoding JSON from response --- {response}")]
    MalformedResponse {
        #[source]
        source: serde_json::Error,
        response: String,
    },

    #[error("Subscribe call was cancelled")]
    Cancelled,

    #[error("Subscribe call did not complete before its deadline")]
    DeadlineExceeded,
}

impl SubscribeError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransportError(_) | Self::RemoteError { .. } | Self::MalformedResponse { .. }
        )
    }

    /// The dumped HTTP response (status line, headers, body), if the failure
    /// got far enough to receive one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::RemoteError { response, .. } | Self::MalformedResponse { response, .. } => {
                Some(response)
            }
            _ => None,
        }
    }
}

impl Debug for SubscribeError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
