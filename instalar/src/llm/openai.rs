//! OpenAI-compatible chat completions client
//!
//! Speaks the `/v1/chat/completions` streaming protocol used by OpenAI,
//! OpenRouter and most self-hosted gateways.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use reqwest_eventsource::{Event, EventSource};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{ChatRequest, LlmClient, LlmError, Message};
use crate::config::LlmConfig;

/// Chat completions client
pub struct OpenAIClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    timeout: Duration,
    max_tokens: u32,
}

impl OpenAIClient {
    /// Create a new client from configuration
    ///
    /// Reads the API key from the environment variable named in config.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, base_url = %config.base_url, "from_config: called");
        let api_key = config
            .get_api_key()
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            timeout,
            max_tokens: config.max_tokens,
        })
    }

    /// Build the request body; the system prompt always goes first
    fn build_request_body(&self, request: &ChatRequest) -> serde_json::Value {
        debug!(%self.model, message_count = %request.messages.len(), "build_request_body: called");
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(Message::system(request.system_prompt.clone()));
        messages.extend(request.messages.iter().cloned());

        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": request.max_tokens.min(self.max_tokens),
            "stream": true,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn stream(&self, request: ChatRequest, fragment_tx: mpsc::Sender<String>) -> Result<(), LlmError> {
        debug!(%self.model, %request.max_tokens, "stream: called");
        let body = self.build_request_body(&request);

        let http_request = self
            .http
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .header("X-Title", "instalar")
            .json(&body);

        let mut es = EventSource::new(http_request).map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        while let Some(event) = es.next().await {
            match event {
                Ok(Event::Open) => {
                    debug!("stream: Event::Open");
                }
                Ok(Event::Message(msg)) => {
                    if msg.data.trim() == "[DONE]" {
                        debug!("stream: [DONE]");
                        break;
                    }

                    let chunk: StreamChunk = serde_json::from_str(&msg.data)?;
                    if let Some(err) = chunk.error {
                        debug!(?err, "stream: error payload mid-stream");
                        es.close();
                        return Err(LlmError::ApiError {
                            status: err.code.unwrap_or(500),
                            message: err.message,
                        });
                    }

                    let content = chunk.choices.into_iter().next().and_then(|c| c.delta.content);
                    if let Some(content) = content.filter(|c| !c.is_empty())
                        && fragment_tx.send(content).await.is_err()
                    {
                        debug!("stream: receiver dropped, stopping");
                        break;
                    }
                }
                Err(reqwest_eventsource::Error::StreamEnded) => {
                    debug!("stream: stream ended");
                    break;
                }
                Err(reqwest_eventsource::Error::InvalidStatusCode(status, response)) => {
                    es.close();
                    let status = status.as_u16();
                    if status == 429 {
                        let retry_after = response
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .unwrap_or(60);
                        debug!(%retry_after, "stream: rate limited (429)");
                        return Err(LlmError::RateLimited {
                            retry_after: Duration::from_secs(retry_after),
                        });
                    }
                    let message = response.text().await.unwrap_or_default();
                    warn!(%status, "stream: API error");
                    return Err(LlmError::ApiError { status, message });
                }
                Err(reqwest_eventsource::Error::Transport(e)) if e.is_timeout() => {
                    warn!(timeout = ?self.timeout, "stream: request timed out");
                    es.close();
                    return Err(LlmError::Timeout(self.timeout));
                }
                Err(e) => {
                    debug!(%e, "stream: event error");
                    es.close();
                    return Err(LlmError::InvalidResponse(e.to_string()));
                }
            }
        }

        es.close();
        debug!("stream: complete");
        Ok(())
    }
}

// Streaming response payloads

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<StreamError>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamError {
    code: Option<u16>,
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(max_tokens: u32) -> OpenAIClient {
        OpenAIClient {
            model: "google/gemini-2.0-flash-001".to_string(),
            api_key: "test-key".to_string(),
            base_url: "https://openrouter.ai/api".to_string(),
            http: Client::new(),
            timeout: Duration::from_secs(30),
            max_tokens,
        }
    }

    #[test]
    fn test_build_request_body_puts_system_first() {
        let request = ChatRequest {
            system_prompt: "You are a DevOps engineer".to_string(),
            messages: vec![Message::user("Install datadog"), Message::assistant("<title_section>x</title_section>")],
            max_tokens: 1000,
        };

        let body = client(8192).build_request_body(&request);

        assert_eq!(body["model"], "google/gemini-2.0-flash-001");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "You are a DevOps engineer");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][2]["role"], "assistant");
    }

    #[test]
    fn test_max_tokens_capped() {
        let request = ChatRequest {
            system_prompt: "Test".to_string(),
            messages: vec![],
            max_tokens: 5000,
        };

        let body = client(1000).build_request_body(&request);
        assert_eq!(body["max_tokens"], 1000);
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(client(1).endpoint(), "https://openrouter.ai/api/v1/chat/completions");
    }

    #[test]
    fn test_parse_stream_chunk() {
        let chunk: StreamChunk =
            serde_json::from_str(r#"{"id":"x","choices":[{"index":0,"delta":{"content":"<title_"}}]}"#).unwrap();
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("<title_"));

        let role_only: StreamChunk =
            serde_json::from_str(r#"{"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#).unwrap();
        assert!(role_only.choices[0].delta.content.is_none());
    }

    #[test]
    fn test_parse_error_chunk() {
        let chunk: StreamChunk = serde_json::from_str(r#"{"error":{"code":502,"message":"upstream down"}}"#).unwrap();
        let err = chunk.error.unwrap();
        assert_eq!(err.code, Some(502));
        assert_eq!(err.message, "upstream down");
    }
}
