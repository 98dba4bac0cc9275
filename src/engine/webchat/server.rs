// Beans Engine — Web Chat Server Core
//
// TCP accept loop, minimal HTTP routing, and the prefix-replay stream that
// hands an already-read upgrade request to the WebSocket handshake.

use super::html::build_chat_html;
use super::{get_stop_signal, handle_websocket, WebChatConfig};

use log::{info, warn};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::{TcpListener, TcpStream};

use crate::atoms::error::EngineResult;
use crate::engine::types::ProviderConfig;

// ── Prefixed Stream (replays buffered bytes then delegates) ────────────

pub(crate) struct PrefixedStream<S> {
    prefix: Vec<u8>,
    pos: usize,
    inner: S,
}

impl<S> PrefixedStream<S> {
    pub fn new(prefix: Vec<u8>, inner: S) -> Self {
        Self { prefix, pos: 0, inner }
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for PrefixedStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        if this.pos < this.prefix.len() {
            let remaining = &this.prefix[this.pos..];
            let n = remaining.len().min(buf.remaining());
            buf.put_slice(&remaining[..n]);
            this.pos += n;
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for PrefixedStream<S> {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }
    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }
    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

// ── Server Core ────────────────────────────────────────────────────────

pub(crate) async fn run_server(
    listener: TcpListener,
    config: Arc<WebChatConfig>,
    provider: Arc<ProviderConfig>,
) {
    let stop = get_stop_signal();

    loop {
        if stop.load(std::sync::atomic::Ordering::Relaxed) {
            break;
        }

        // Accept with timeout so we can check the stop signal
        let accept = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            listener.accept(),
        )
        .await;

        match accept {
            Ok(Ok((tcp_stream, peer))) => {
                let cfg = config.clone();
                let provider = provider.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(tcp_stream, peer, cfg, provider).await {
                        warn!("[webchat] Connection error from {}: {}", peer, e);
                    }
                });
            }
            Ok(Err(e)) => {
                warn!("[webchat] Accept error: {}", e);
            }
            Err(_) => { /* timeout — loop to check stop signal */ }
        }
    }
}

// ── Connection Handler ─────────────────────────────────────────────────

async fn handle_connection(
    mut stream: TcpStream,
    peer: std::net::SocketAddr,
    config: Arc<WebChatConfig>,
    provider: Arc<ProviderConfig>,
) -> EngineResult<()> {
    // Read the HTTP request (consumed — PrefixedStream replays it for WS)
    let mut buf = vec![0u8; 8192];
    let n = stream.read(&mut buf).await?;
    if n == 0 {
        return Ok(());
    }
    buf.truncate(n);

    let request_str = String::from_utf8_lossy(&buf);
    let first_line = request_str.lines().next().unwrap_or("");
    let is_websocket = request_str.contains("Upgrade: websocket")
        || request_str.contains("upgrade: websocket");

    if is_websocket && first_line.contains("/ws") {
        info!("[webchat] WebSocket connection from {}", peer);
        // Replay the buffered bytes so tungstenite can read the HTTP upgrade
        let prefixed = PrefixedStream::new(buf, stream);
        handle_websocket(prefixed, peer, provider).await
    } else if first_line.starts_with("GET /") {
        serve_html(stream, &config).await
    } else {
        Ok(())
    }
}

// ── HTML Chat Page ─────────────────────────────────────────────────────

async fn serve_html(mut stream: TcpStream, config: &WebChatConfig) -> EngineResult<()> {
    let html = build_chat_html(&config.page_title);
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        html.len(),
        html
    );

    stream.write_all(response.as_bytes()).await?;

    Ok(())
}
