//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to the model
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Human readable text delivered in place of the model's response
    ///
    /// The step view shows it like any other fragment, so it starts on a new line.
    pub fn to_fragment(&self) -> String {
        match self {
            LlmError::RateLimited { .. } => "\nError: Rate limit reached. Please wait a moment before trying again.".to_string(),
            LlmError::ApiError { status: 402, .. } => {
                "\nError: API budget limit exceeded. Please try again later.".to_string()
            }
            LlmError::ApiError { status, message } if (400..500).contains(status) => {
                format!("\nError: Invalid request - {}", message)
            }
            LlmError::ApiError { message, .. } => format!("\nError: API error occurred - {}", message),
            LlmError::Timeout(after) => format!("\nError: No response from the model within {} seconds", after.as_secs()),
            other => format!("\nUnexpected error occurred: {}", other),
        }
    }
}
