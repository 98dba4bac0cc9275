// Beans Engine — Web Chat Bridge
//
// A lightweight HTTP + WebSocket server that serves the single-page chat
// UI and answers each submission with the response selector.
//
// Architecture:
//   - Binds a TCP listener on a configurable port (default 3939)
//   - GET /   → serves a self-contained HTML chat page (no secrets embedded)
//   - GET /ws → upgrades to WebSocket carrying {type, text} JSON frames
//   - One task per connection; within a connection, one submission is
//     fully answered before the next frame is read
//
// Test mode (default on) replies from the canned rule table and reveals
// the reply one character at a time; live mode streams provider fragments
// as they arrive. Flipping the sidebar toggle or entering an API key sends
// a `setup` frame that applies from the next submission on.

mod html;
mod server;

use log::{debug, info, warn};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use futures::stream::{SplitSink, StreamExt};
use futures::SinkExt;
use tokio_tungstenite::WebSocketStream;

use crate::atoms::error::{EngineError, EngineResult};
use crate::engine::history::ChatHistory;
use crate::engine::selector::ResponseSelector;
use crate::engine::simulated;
use crate::engine::types::{truncate_utf8, ChatEvent, ClientFrame, Message, ProviderConfig};

// ── Web Chat Config ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct WebChatConfig {
    /// Address to bind — "127.0.0.1" (local only) or "0.0.0.0" (LAN)
    pub bind_address: String,
    /// Port 0 picks an ephemeral port; `start` returns the bound address.
    pub port: u16,
    /// Title shown on the chat page
    pub page_title: String,
}

impl Default for WebChatConfig {
    fn default() -> Self {
        WebChatConfig {
            bind_address: "127.0.0.1".into(),
            port: 3939,
            page_title: "Beans AI Chatbot".into(),
        }
    }
}

impl WebChatConfig {
    /// Read `BEANS_BIND`, `BEANS_PORT`, and `BEANS_TITLE` over the defaults.
    pub fn from_env() -> Self {
        let defaults = WebChatConfig::default();
        WebChatConfig {
            bind_address: std::env::var("BEANS_BIND").unwrap_or(defaults.bind_address),
            port: std::env::var("BEANS_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            page_title: std::env::var("BEANS_TITLE").unwrap_or(defaults.page_title),
        }
    }
}

/// Per-character delay of the simulated typing effect.
pub const TYPING_DELAY: Duration = Duration::from_millis(30);

// ── Global State ───────────────────────────────────────────────────────

static BRIDGE_RUNNING: AtomicBool = AtomicBool::new(false);
static MESSAGE_COUNT: AtomicI64 = AtomicI64::new(0);
static STOP_SIGNAL: std::sync::OnceLock<Arc<AtomicBool>> = std::sync::OnceLock::new();

fn get_stop_signal() -> Arc<AtomicBool> {
    STOP_SIGNAL.get_or_init(|| Arc::new(AtomicBool::new(false))).clone()
}

// ── Public API ─────────────────────────────────────────────────────────

/// Bind the listener and spawn the accept loop. Returns the bound address
/// so callers (and tests, with port 0) know where the page lives.
pub async fn start(config: WebChatConfig, provider: ProviderConfig) -> EngineResult<SocketAddr> {
    if BRIDGE_RUNNING.swap(true, Ordering::Relaxed) {
        return Err(EngineError::channel("webchat", "bridge is already running"));
    }

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            BRIDGE_RUNNING.store(false, Ordering::Relaxed);
            return Err(EngineError::channel("webchat", format!("Bind {addr} failed: {e}")));
        }
    };
    let local_addr = listener.local_addr()?;

    let stop = get_stop_signal();
    stop.store(false, Ordering::Relaxed);

    info!("[webchat] Listening on http://{}", local_addr);

    tokio::spawn(async move {
        server::run_server(listener, Arc::new(config), Arc::new(provider)).await;
        BRIDGE_RUNNING.store(false, Ordering::Relaxed);
        info!("[webchat] Server stopped");
    });

    Ok(local_addr)
}

/// Signal the accept loop to wind down. In-flight connections finish on
/// their own.
pub fn stop() {
    get_stop_signal().store(true, Ordering::Relaxed);
    info!("[webchat] Stop signal sent");
}

pub fn is_running() -> bool {
    BRIDGE_RUNNING.load(Ordering::Relaxed)
}

pub fn message_count() -> i64 {
    MESSAGE_COUNT.load(Ordering::Relaxed)
}

// ── WebSocket Chat Handler ─────────────────────────────────────────────

pub(crate) async fn handle_websocket<S: AsyncRead + AsyncWrite + Unpin>(
    stream: S,
    peer: std::net::SocketAddr,
    provider_config: Arc<ProviderConfig>,
) -> EngineResult<()> {
    let ws_stream = tokio_tungstenite::accept_async(stream)
        .await
        .map_err(|e| EngineError::channel("webchat", e.to_string()))?;

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Session-scoped state: one history, one mode flag, one selector.
    let session_id = uuid::Uuid::new_v4().to_string();
    let mut history = ChatHistory::new();
    let mut test_mode = true;
    let mut selector = Arc::new(ResponseSelector::from_config(&provider_config));

    info!("[webchat] Session {} connected from {}", session_id, peer);

    let welcome = if provider_config.api_key.is_some() {
        "Connected to Beans! Test mode is on — canned replies, no API calls. Untick it in the sidebar for live responses."
    } else {
        "Connected to Beans! Test mode is on. No API key is configured, so live mode would only echo — set OPENAI_API_KEY or paste a key in the sidebar."
    };
    send_event(&mut ws_sender, &ChatEvent::System { text: welcome.into() }).await;

    while let Some(msg) = ws_receiver.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                warn!("[webchat] WebSocket error from {}: {}", peer, e);
                break;
            }
        };

        match msg {
            WsMessage::Text(text) => {
                let frame: ClientFrame = match serde_json::from_str(&text) {
                    Ok(f) => f,
                    Err(e) => {
                        debug!("[webchat] Ignoring malformed frame from {}: {}", peer, e);
                        continue;
                    }
                };

                match frame {
                    ClientFrame::Setup { test_mode: mode, api_key } => {
                        test_mode = mode;
                        selector = Arc::new(ResponseSelector::from_config(
                            &provider_config.with_session_key(api_key.as_deref()),
                        ));
                        info!(
                            "[webchat] Session {} setup: test_mode={} key={}",
                            session_id,
                            test_mode,
                            if selector.has_provider() { "set" } else { "none" }
                        );
                        let ack = setup_ack(test_mode, selector.has_provider());
                        send_event(&mut ws_sender, &ChatEvent::System { text: ack }).await;
                    }
                    ClientFrame::Message { text } => {
                        let user_text = text.trim().to_string();
                        if user_text.is_empty() {
                            continue;
                        }

                        MESSAGE_COUNT.fetch_add(1, Ordering::Relaxed);
                        debug!(
                            "[webchat] Session {} says: {}",
                            session_id,
                            truncate_utf8(&user_text, 80)
                        );

                        history.push(Message::user(user_text.clone()));
                        send_event(&mut ws_sender, &ChatEvent::Typing).await;

                        let reply = if test_mode {
                            let reply = simulated::simulated_reply(&user_text);
                            reveal_typed(&mut ws_sender, &reply).await;
                            reply
                        } else {
                            live_reply(&mut ws_sender, &selector, &history, user_text).await
                        };

                        if !send_event(&mut ws_sender, &ChatEvent::Message { text: reply.clone() }).await {
                            break;
                        }
                        history.push(Message::assistant(reply));
                    }
                }
            }
            WsMessage::Close(_) => {
                info!("[webchat] Session {} disconnected", session_id);
                break;
            }
            WsMessage::Ping(data) => {
                let _ = ws_sender.send(WsMessage::Pong(data)).await;
            }
            _ => {}
        }
    }

    Ok(())
}

fn setup_ack(test_mode: bool, has_key: bool) -> String {
    if test_mode {
        "Test mode: using simulated responses, no API calls.".into()
    } else if has_key {
        "Live mode: replies come from the model, streamed as they generate.".into()
    } else {
        "Live mode without an API key — replies will just echo your input.".into()
    }
}

/// Simulated typing: reveal the reply one character at a time with a fixed
/// per-character delay. Purely presentational; the reply is already chosen.
async fn reveal_typed<S: AsyncRead + AsyncWrite + Unpin>(
    ws_sender: &mut SplitSink<WebSocketStream<S>, WsMessage>,
    reply: &str,
) {
    let mut partial = String::with_capacity(reply.len());
    for ch in reply.chars() {
        partial.push(ch);
        if !send_event(ws_sender, &ChatEvent::Partial { text: partial.clone() }).await {
            return;
        }
        tokio::time::sleep(TYPING_DELAY).await;
    }
}

/// Live mode: run the provider call on its own task and forward each
/// accumulated partial to the browser as fragments arrive. Blocks until
/// end-of-stream or failure; the selector collapses every failure into
/// the fallback reply string.
async fn live_reply<S: AsyncRead + AsyncWrite + Unpin>(
    ws_sender: &mut SplitSink<WebSocketStream<S>, WsMessage>,
    selector: &Arc<ResponseSelector>,
    history: &ChatHistory,
    input: String,
) -> String {
    let messages = ResponseSelector::request_messages(history);
    let (delta_tx, mut delta_rx) = mpsc::unbounded_channel();

    let task = {
        let selector = selector.clone();
        tokio::spawn(async move { selector.live_reply(messages, input, delta_tx).await })
    };

    let mut partial = String::new();
    while let Some(fragment) = delta_rx.recv().await {
        partial.push_str(&fragment);
        if !send_event(ws_sender, &ChatEvent::Partial { text: partial.clone() }).await {
            break;
        }
    }

    match task.await {
        Ok(reply) => reply,
        Err(e) => format!("Error: {e}. Falling back to echo mode."),
    }
}

/// Send one wire frame. Returns false once the socket is gone.
async fn send_event<S: AsyncRead + AsyncWrite + Unpin>(
    ws_sender: &mut SplitSink<WebSocketStream<S>, WsMessage>,
    event: &ChatEvent,
) -> bool {
    let json = serde_json::to_string(event).unwrap_or_default();
    ws_sender.send(WsMessage::Text(json)).await.is_ok()
}
