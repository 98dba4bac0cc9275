// Beans Web Chat — integration tests.
// One binary: selector contracts (echo, error collapse, request shape,
// streaming fold) plus a full bridge round-trip over a real WebSocket.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use beans_chat::atoms::error::{EngineError, EngineResult};
use beans_chat::atoms::traits::AiProvider;
use beans_chat::engine::history::ChatHistory;
use beans_chat::engine::selector::{ResponseSelector, CONTEXT_MESSAGES, PERSONA};
use beans_chat::engine::simulated::{COFFEE_JOKES, GREETING_REPLY};
use beans_chat::engine::types::{ChatEvent, Message, ProviderConfig, Role, DEFAULT_MODEL};
use beans_chat::engine::webchat::{self, WebChatConfig};

// ── Mock providers ─────────────────────────────────────────────────────

/// Fails every call with a fixed message.
struct FailingProvider;

#[async_trait]
impl AiProvider for FailingProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn chat_stream(
        &self,
        _messages: &[Message],
        _model: &str,
        _max_tokens: u32,
        _deltas: mpsc::UnboundedSender<String>,
    ) -> EngineResult<String> {
        Err(EngineError::provider("mock", "boom"))
    }
}

/// Streams a fixed fragment sequence, then resolves to their concatenation.
struct StreamingProvider {
    fragments: Vec<&'static str>,
}

#[async_trait]
impl AiProvider for StreamingProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn chat_stream(
        &self,
        _messages: &[Message],
        _model: &str,
        _max_tokens: u32,
        deltas: mpsc::UnboundedSender<String>,
    ) -> EngineResult<String> {
        let mut reply = String::new();
        for frag in &self.fragments {
            reply.push_str(frag);
            let _ = deltas.send(frag.to_string());
        }
        Ok(reply)
    }
}

fn no_key_config() -> ProviderConfig {
    ProviderConfig { api_key: None, base_url: None, model: DEFAULT_MODEL.into() }
}

// ── Selector contracts ─────────────────────────────────────────────────

#[tokio::test]
async fn live_failure_collapses_into_fallback_reply() {
    let selector = ResponseSelector::with_provider(Arc::new(FailingProvider), DEFAULT_MODEL);
    let (tx, _rx) = mpsc::unbounded_channel();

    let reply = selector
        .live_reply(vec![Message::user("hi")], "hi".into(), tx)
        .await;

    assert_eq!(reply, "Error: Provider error: mock: boom. Falling back to echo mode.");
}

#[tokio::test]
async fn live_without_credential_echoes_input() {
    let selector = ResponseSelector::from_config(&no_key_config());
    assert!(!selector.has_provider());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let reply = selector.live_reply(vec![], "What's brewing?".into(), tx).await;

    assert_eq!(reply, "Echo: What's brewing?");
    // No call attempted → no fragments.
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn live_reply_folds_streamed_fragments() {
    let provider = StreamingProvider { fragments: vec!["Hel", "lo ", "there ", "☕"] };
    let selector = ResponseSelector::with_provider(Arc::new(provider), DEFAULT_MODEL);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let reply = selector.live_reply(vec![Message::user("hi")], "hi".into(), tx).await;
    assert_eq!(reply, "Hello there ☕");

    let mut folded = String::new();
    while let Some(frag) = rx.recv().await {
        folded.push_str(&frag);
    }
    assert_eq!(folded, reply);
}

#[test]
fn request_is_persona_plus_recent_ten() {
    let mut history = ChatHistory::new();
    for i in 0..7 {
        history.push(Message::user(format!("q{i}")));
        history.push(Message::assistant(format!("a{i}")));
    }

    let messages = ResponseSelector::request_messages(&history);

    assert_eq!(messages.len(), CONTEXT_MESSAGES + 1);
    assert_eq!(messages[0], Message::system(PERSONA));
    // The context is the last 10 stored entries, order preserved; the
    // persona never enters the stored history.
    assert_eq!(&messages[1..], history.recent(CONTEXT_MESSAGES));
    assert_eq!(messages[1].content, "q2");
    assert_eq!(messages.last().map(|m| m.content.as_str()), Some("a6"));
    assert!(history.recent(history.len()).iter().all(|m| m.role != Role::System));
}

// ── Bridge round-trip ──────────────────────────────────────────────────

async fn next_event<S>(ws: &mut S) -> ChatEvent
where
    S: Stream<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let msg = ws
            .next()
            .await
            .expect("socket closed early")
            .expect("socket error");
        if let WsMessage::Text(text) = msg {
            return serde_json::from_str(&text).expect("malformed frame");
        }
    }
}

#[tokio::test]
async fn webchat_end_to_end() {
    // Port 0: the bridge reports where it actually bound. One bridge per
    // process — everything end-to-end lives in this test.
    let config = WebChatConfig {
        bind_address: "127.0.0.1".into(),
        port: 0,
        page_title: "Beans Test".into(),
    };
    let addr = webchat::start(config, no_key_config()).await.expect("bridge start");
    assert!(webchat::is_running());

    // The page is served at / and carries the configured title.
    let page = reqwest::get(format!("http://{addr}/"))
        .await
        .expect("GET /")
        .text()
        .await
        .expect("page body");
    assert!(page.contains("<title>Beans Test</title>"));
    assert!(page.contains("Enable Test Mode"));

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("ws connect");

    // Welcome frame, then our setup is acknowledged.
    assert!(matches!(next_event(&mut ws).await, ChatEvent::System { .. }));
    ws.send(WsMessage::Text(r#"{"type":"setup","test_mode":true,"api_key":null}"#.into()))
        .await
        .expect("send setup");
    assert!(matches!(next_event(&mut ws).await, ChatEvent::System { .. }));

    // One submission → typing indicator, per-character partials, final reply.
    ws.send(WsMessage::Text(r#"{"type":"message","text":"tell me a joke"}"#.into()))
        .await
        .expect("send message");
    assert_eq!(next_event(&mut ws).await, ChatEvent::Typing);

    let mut partials = Vec::new();
    let reply = loop {
        match next_event(&mut ws).await {
            ChatEvent::Partial { text } => partials.push(text),
            ChatEvent::Message { text } => break text,
            other => panic!("unexpected frame: {other:?}"),
        }
    };

    assert!(COFFEE_JOKES.contains(&reply.as_str()), "got: {reply}");
    assert_eq!(partials.len(), reply.chars().count());
    assert_eq!(partials.last(), Some(&reply));
    // Each partial extends the previous one by exactly one character.
    for pair in partials.windows(2) {
        assert!(pair[1].starts_with(pair[0].as_str()));
    }

    // A second turn exercises rule priority end to end.
    ws.send(WsMessage::Text(r#"{"type":"message","text":"How are you today?"}"#.into()))
        .await
        .expect("send second message");
    let reply = loop {
        match next_event(&mut ws).await {
            ChatEvent::Message { text } => break text,
            ChatEvent::Typing | ChatEvent::Partial { .. } => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    };
    assert_eq!(reply, GREETING_REPLY);

    assert!(webchat::message_count() >= 2);

    ws.close(None).await.ok();
    webchat::stop();
}
