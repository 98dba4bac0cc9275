// Beans Engine — OpenAI-Compatible Provider
// Streamed chat completions over SSE against api.openai.com or any
// compatible base URL (Bearer auth).

use async_trait::async_trait;
use futures::StreamExt;
use log::{error, info};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::traits::AiProvider;
use crate::engine::types::{truncate_utf8, Message, ProviderConfig, StreamChunk};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiProvider {
    pub fn new(config: &ProviderConfig) -> Self {
        OpenAiProvider {
            client: Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
            base_url: config.base_url.clone().unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: config.api_key.clone().unwrap_or_default(),
        }
    }

    fn format_messages(messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|msg| json!({ "role": msg.role, "content": msg.content }))
            .collect()
    }

    /// Parse a single SSE data line. `[DONE]` and non-JSON lines map to None.
    fn parse_sse_chunk(data: &str) -> Option<StreamChunk> {
        if data == "[DONE]" {
            return None;
        }

        let v: Value = serde_json::from_str(data).ok()?;
        let choice = v["choices"].get(0)?;
        Some(StreamChunk {
            delta_text: choice["delta"]["content"].as_str().map(|s| s.to_string()),
            finish_reason: choice["finish_reason"].as_str().map(|s| s.to_string()),
        })
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    /// Send one chat completion request with SSE streaming and fold the
    /// fragments into the final reply, forwarding each to `deltas`.
    async fn chat_stream(
        &self,
        messages: &[Message],
        model: &str,
        max_tokens: u32,
        deltas: UnboundedSender<String>,
    ) -> EngineResult<String> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let body = json!({
            "model": model,
            "messages": Self::format_messages(messages),
            "max_tokens": max_tokens,
            "stream": true,
        });

        info!("[engine] OpenAI request to {} model={}", url, model);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::provider("openai", format!("HTTP request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body_text = response.text().await.unwrap_or_default();
            error!("[engine] OpenAI error {}: {}", status, truncate_utf8(&body_text, 500));
            return Err(EngineError::provider(
                "openai",
                format!("API error {}: {}", status, truncate_utf8(&body_text, 200)),
            ));
        }

        // ── Read the SSE stream ────────────────────────────────────────
        let mut reply = String::new();
        let mut byte_stream = response.bytes_stream();
        let mut buffer = String::new();

        while let Some(result) = byte_stream.next().await {
            let bytes = result
                .map_err(|e| EngineError::provider("openai", format!("Stream read error: {e}")))?;
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            // Process complete SSE lines
            while let Some(line_end) = buffer.find('\n') {
                let line = buffer[..line_end].trim().to_string();
                buffer = buffer[line_end + 1..].to_string();

                if let Some(data) = line.strip_prefix("data: ") {
                    if data == "[DONE]" {
                        return Ok(reply);
                    }
                    if let Some(chunk) = Self::parse_sse_chunk(data) {
                        if let Some(text) = chunk.delta_text {
                            reply.push_str(&text);
                            // Receiver gone means the connection closed;
                            // finish the fold anyway.
                            let _ = deltas.send(text);
                        }
                    }
                }
            }
        }

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sse_chunk_delta() {
        let data = r#"{"choices":[{"delta":{"content":"Hel"},"finish_reason":null}]}"#;
        let chunk = OpenAiProvider::parse_sse_chunk(data).unwrap();
        assert_eq!(chunk.delta_text.as_deref(), Some("Hel"));
        assert!(chunk.finish_reason.is_none());
    }

    #[test]
    fn test_parse_sse_chunk_finish() {
        let data = r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#;
        let chunk = OpenAiProvider::parse_sse_chunk(data).unwrap();
        assert!(chunk.delta_text.is_none());
        assert_eq!(chunk.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_parse_sse_chunk_done_and_garbage() {
        assert!(OpenAiProvider::parse_sse_chunk("[DONE]").is_none());
        assert!(OpenAiProvider::parse_sse_chunk("not json").is_none());
        assert!(OpenAiProvider::parse_sse_chunk(r#"{"choices":[]}"#).is_none());
    }

    #[test]
    fn test_message_wire_format() {
        let msgs = vec![Message::system("persona"), Message::user("hi")];
        let formatted = OpenAiProvider::format_messages(&msgs);
        assert_eq!(formatted[0], json!({"role": "system", "content": "persona"}));
        assert_eq!(formatted[1], json!({"role": "user", "content": "hi"}));
    }
}
