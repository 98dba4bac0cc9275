// Beans Engine — AI Providers
// One backend today: any OpenAI-compatible chat-completions API.
// New backends implement `atoms::traits::AiProvider` alongside it.

pub mod openai;

pub use openai::OpenAiProvider;
