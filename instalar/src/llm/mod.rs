//! LLM transport
//!
//! Turns a conversation into a lazy stream of response fragments. A provider
//! failure arrives as the last item of the stream, after whatever text made
//! it through.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub mod client;
mod error;
mod openai;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use openai::OpenAIClient;
pub use types::{ChatRequest, Message, Role};

use crate::config::LlmConfig;

/// Fragments buffered between the transport task and the consumer
const FRAGMENT_BUFFER: usize = 64;

/// Forward-only stream of response text, ending early on a transport failure
pub type FragmentStream = BoxStream<'static, Result<String, LlmError>>;

/// Create the chat client described by config
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(model = %config.model, "create_client: called");
    Ok(Arc::new(OpenAIClient::from_config(config)?))
}

/// Start a streamed chat call and return its fragments
///
/// The call runs in its own task. Dropping the returned stream closes the
/// channel, which makes the transport stop at its next send.
pub fn fragments(client: Arc<dyn LlmClient>, request: ChatRequest) -> FragmentStream {
    debug!(message_count = %request.messages.len(), "fragments: called");
    let (tx, mut rx) = mpsc::channel::<Result<String, LlmError>>(FRAGMENT_BUFFER);

    tokio::spawn(async move {
        let (text_tx, mut text_rx) = mpsc::channel::<String>(FRAGMENT_BUFFER);
        let forward = async {
            while let Some(text) = text_rx.recv().await {
                if tx.send(Ok(text)).await.is_err() {
                    break;
                }
            }
        };

        let (result, ()) = tokio::join!(client.stream(request, text_tx), forward);
        if let Err(e) = result {
            warn!(error = %e, "fragments: transport failed");
            let _ = tx.send(Err(e)).await;
        }
    });

    futures::stream::poll_fn(move |cx| rx.poll_recv(cx)).boxed()
}

#[cfg(test)]
mod tests {
    use super::client::mock::MockLlmClient;
    use super::*;

    fn request() -> ChatRequest {
        ChatRequest {
            system_prompt: "Test".to_string(),
            messages: vec![Message::user("hi")],
            max_tokens: 100,
        }
    }

    #[tokio::test]
    async fn test_fragments_in_order() {
        let client: Arc<dyn LlmClient> = Arc::new(MockLlmClient::new(vec![vec!["one ", "two ", "three"]]));
        let collected: Vec<String> = fragments(client, request())
            .filter_map(|f| async move { f.ok() })
            .collect()
            .await;
        assert_eq!(collected, vec!["one ", "two ", "three"]);
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream() {
        let client: Arc<dyn LlmClient> = Arc::new(MockLlmClient::new(vec![]));
        let collected: Vec<Result<String, LlmError>> = fragments(client, request()).collect().await;
        assert_eq!(collected.len(), 1);
        let Err(e) = &collected[0] else {
            panic!("expected a transport error");
        };
        assert!(e.to_string().contains("No more mock responses"));
    }

    #[tokio::test]
    async fn test_text_before_failure_is_kept() {
        let client: Arc<dyn LlmClient> = Arc::new(MockLlmClient::failing_after(
            vec!["<title_section>Install</title_section>"],
            LlmError::ApiError {
                status: 503,
                message: "upstream connection lost".to_string(),
            },
        ));
        let collected: Vec<Result<String, LlmError>> = fragments(client, request()).collect().await;
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].as_deref().ok(), Some("<title_section>Install</title_section>"));
        assert!(matches!(collected[1], Err(LlmError::ApiError { status: 503, .. })));
    }
}
