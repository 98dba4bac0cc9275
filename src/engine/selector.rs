// Beans Engine — Response Selector
// Chooses the live-mode reply path: a streamed provider call seeded with
// the persona instruction and recent history, a pass-through echo when no
// credential is configured, or the error fallback string. Test-mode
// replies come from `engine::simulated` and are dispatched by the caller.

use std::sync::Arc;

use log::{info, warn};
use tokio::sync::mpsc::UnboundedSender;

use crate::atoms::traits::AiProvider;
use crate::engine::history::ChatHistory;
use crate::engine::providers::OpenAiProvider;
use crate::engine::types::{Message, ProviderConfig};

/// The assistant persona sent as the leading system message of every live
/// request. Never stored in the session history.
pub const PERSONA: &str = "You are Beans, a helpful AI assistant powered by beans. You love talking about coffee, productivity, and being awesome!";

/// How many stored messages ride along as model context.
pub const CONTEXT_MESSAGES: usize = 10;

/// Token budget for one generated reply.
pub const MAX_REPLY_TOKENS: u32 = 150;

pub struct ResponseSelector {
    provider: Option<Arc<dyn AiProvider>>,
    model: String,
}

impl ResponseSelector {
    /// Build from config. Without an API key the selector has no provider
    /// and live mode degrades to echo.
    pub fn from_config(config: &ProviderConfig) -> Self {
        let provider: Option<Arc<dyn AiProvider>> = config
            .api_key
            .as_deref()
            .map(|_| Arc::new(OpenAiProvider::new(config)) as Arc<dyn AiProvider>);
        ResponseSelector { provider, model: config.model.clone() }
    }

    /// For tests: inject any provider implementation.
    pub fn with_provider(provider: Arc<dyn AiProvider>, model: impl Into<String>) -> Self {
        ResponseSelector { provider: Some(provider), model: model.into() }
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Persona instruction + the most recent stored turns, in order.
    /// The caller has already pushed the latest user message, so it is the
    /// final entry of the request.
    pub fn request_messages(history: &ChatHistory) -> Vec<Message> {
        let mut messages = vec![Message::system(PERSONA)];
        messages.extend(history.recent(CONTEXT_MESSAGES).iter().cloned());
        messages
    }

    /// One live reply. Total: provider failures collapse into the fallback
    /// string and never reach the caller as errors.
    ///
    /// Fragments are forwarded to `deltas` as they arrive so the caller can
    /// render the growing reply; the channel closes at end-of-stream.
    pub async fn live_reply(
        &self,
        messages: Vec<Message>,
        input: String,
        deltas: UnboundedSender<String>,
    ) -> String {
        let Some(provider) = &self.provider else {
            return format!("Echo: {input}");
        };

        info!("[engine] live request: {} messages, model={}", messages.len(), self.model);
        match provider.chat_stream(&messages, &self.model, MAX_REPLY_TOKENS, deltas).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("[engine] {} call failed: {}", provider.name(), e);
                format!("Error: {e}. Falling back to echo mode.")
            }
        }
    }
}
