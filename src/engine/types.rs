// Beans Engine — Core types
// These are the data structures that flow through the entire engine.
// They are independent of any specific AI provider.

use serde::{Deserialize, Serialize};

// ── Provider Config ────────────────────────────────────────────────────

/// How to reach the live text-generation backend. Built from the process
/// environment at startup; the API key may be replaced per session from
/// the page sidebar (never persisted).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    /// Override for OpenAI-compatible backends. `None` = api.openai.com.
    pub base_url: Option<String>,
    pub model: String,
}

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

impl ProviderConfig {
    /// Read `OPENAI_API_KEY`, `OPENAI_BASE_URL`, and `BEANS_MODEL`.
    /// A blank key counts as absent.
    pub fn from_env() -> Self {
        ProviderConfig {
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            base_url: std::env::var("OPENAI_BASE_URL").ok(),
            model: std::env::var("BEANS_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
        }
    }

    /// The same config with the key entered in the sidebar, if any.
    /// An empty override falls back to the environment key.
    pub fn with_session_key(&self, key: Option<&str>) -> Self {
        let key = key.map(str::trim).filter(|k| !k.is_empty());
        ProviderConfig {
            api_key: key.map(String::from).or_else(|| self.api_key.clone()),
            ..self.clone()
        }
    }
}

// ── Messages ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of conversation. Immutable once created; the stored history
/// never contains a `System` entry — the persona instruction is prepended
/// only when a live request is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message { role: Role::Assistant, content: content.into() }
    }
}

// ── Streaming chunk (provider → selector) ──────────────────────────────

/// One parsed SSE data line from an OpenAI-compatible stream.
#[derive(Debug, Clone)]
pub struct StreamChunk {
    pub delta_text: Option<String>,
    pub finish_reason: Option<String>,
}

// ── WebSocket wire frames ──────────────────────────────────────────────

/// Server → browser. `partial` carries the growing reply prefix, used for
/// both the simulated typing effect and live stream rendering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatEvent {
    System { text: String },
    Typing,
    Partial { text: String },
    Message { text: String },
    Error { text: String },
}

/// Browser → server. `setup` arrives at session start and whenever the
/// sidebar controls change; `message` once per submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientFrame {
    Setup {
        #[serde(default = "default_test_mode")]
        test_mode: bool,
        #[serde(default)]
        api_key: Option<String>,
    },
    Message { text: String },
}

fn default_test_mode() -> bool {
    true
}

// ── Helpers ────────────────────────────────────────────────────────────

/// Truncate to at most `max_bytes` without splitting a UTF-8 sequence.
pub fn truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_utf8_on_char_boundary() {
        // "☕" is 3 bytes; cutting mid-sequence must back off.
        let s = "a☕b";
        assert_eq!(truncate_utf8(s, 2), "a");
        assert_eq!(truncate_utf8(s, 4), "a☕");
        assert_eq!(truncate_utf8(s, 10), "a☕b");
    }

    #[test]
    fn test_client_frame_setup_defaults() {
        let f: ClientFrame = serde_json::from_str(r#"{"type":"setup"}"#).unwrap();
        assert_eq!(f, ClientFrame::Setup { test_mode: true, api_key: None });
    }

    #[test]
    fn test_chat_event_wire_shape() {
        let json = serde_json::to_string(&ChatEvent::Typing).unwrap();
        assert_eq!(json, r#"{"type":"typing"}"#);
        let json = serde_json::to_string(&ChatEvent::Partial { text: "he".into() }).unwrap();
        assert_eq!(json, r#"{"type":"partial","text":"he"}"#);
    }

    #[test]
    fn test_session_key_override_precedence() {
        let base = ProviderConfig { api_key: Some("env-key".into()), base_url: None, model: DEFAULT_MODEL.into() };
        assert_eq!(base.with_session_key(Some("sk-abc")).api_key.as_deref(), Some("sk-abc"));
        assert_eq!(base.with_session_key(Some("  ")).api_key.as_deref(), Some("env-key"));
        assert_eq!(base.with_session_key(None).api_key.as_deref(), Some("env-key"));
    }
}
