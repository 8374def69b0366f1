//! LlmClient trait definition

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ChatRequest, LlmError};

/// Streaming chat transport
///
/// Implementations push response text to `fragment_tx` in arrival order and
/// return once the response is complete. A closed receiver means the consumer
/// has seen enough; implementations should stop quietly when a send fails.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn stream(&self, request: ChatRequest, fragment_tx: mpsc::Sender<String>) -> Result<(), LlmError>;
}
