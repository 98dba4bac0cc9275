// ── Beans Atoms: Provider Trait ────────────────────────────────────────────
// The one seam between the response selector and the outside world.
// Implementations live in engine/providers/; tests substitute their own.

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use crate::atoms::error::EngineResult;
use crate::engine::types::Message;

/// A streamed chat-completion backend.
///
/// `chat_stream` sends the conversation, forwards each text fragment to
/// `deltas` as it arrives, and resolves to the fully accumulated reply.
/// The fragment channel closes when the sender is dropped — receivers treat
/// that as end-of-stream. Fragments are raw deltas, not running prefixes;
/// folding is the consumer's job.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Short provider name used in logs and error messages.
    fn name(&self) -> &str;

    /// One streamed completion. `max_tokens` caps the generated reply.
    async fn chat_stream(
        &self,
        messages: &[Message],
        model: &str,
        max_tokens: u32,
        deltas: UnboundedSender<String>,
    ) -> EngineResult<String>;
}
