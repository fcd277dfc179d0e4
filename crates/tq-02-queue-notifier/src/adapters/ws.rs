//! # WebSocket Adapter
//!
//! Binds axum WebSocket connections to the notifier ports.
//!
//! ```text
//!   notifier ──write_text──→ [WsTransport] ──mpsc──→ write pump ──→ socket sink
//!                                 │ close
//!                                 ▼ watch
//!   registry ←──deregister── read pump ←── [WsFrameSource] ←── socket stream
//! ```
//!
//! Writes never wait on the peer: each connection has a bounded outbound
//! buffer and a full buffer fails the write, which gets the connection
//! pruned. Closing the transport stops both pumps.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::Deserialize;
use shared_types::{ConnectionId, Role};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::domain::{ConnectionHandle, ConnectionRegistry, TransportError};
use crate::ports::{ConnectionTransport, Frame, FrameSource, NoopObserver, NotifierObserver};
use crate::pump::{run_read_pump, PumpExit};

/// Default per-connection outbound buffer, in frames.
pub const DEFAULT_WS_BUFFER: usize = 64;

/// How long the write pump waits for the peer to take the close frame.
pub const CLOSE_FRAME_TIMEOUT: Duration = Duration::from_secs(1);

// =============================================================================
// TRANSPORT (write side)
// =============================================================================

/// Non-blocking write handle for one WebSocket connection.
#[derive(Debug)]
pub struct WsTransport {
    outbound: mpsc::Sender<Message>,
    shutdown: watch::Sender<bool>,
}

/// Receiving ends for a [`WsTransport`], consumed by the pumps.
#[derive(Debug)]
pub struct WsChannels {
    pub outbound: mpsc::Receiver<Message>,
    pub shutdown: watch::Receiver<bool>,
}

impl WsTransport {
    /// Create a transport buffering at most `buffer` frames.
    #[must_use]
    pub fn new(buffer: usize) -> (Self, WsChannels) {
        let (outbound_tx, outbound_rx) = mpsc::channel(buffer.max(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        (
            Self {
                outbound: outbound_tx,
                shutdown: shutdown_tx,
            },
            WsChannels {
                outbound: outbound_rx,
                shutdown: shutdown_rx,
            },
        )
    }

    /// Another receiver for the close signal.
    #[must_use]
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }
}

impl ConnectionTransport for WsTransport {
    fn write_text(&self, text: &str) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        self.outbound
            .try_send(Message::Text(text.to_owned()))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => TransportError::Backpressure,
                mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
            })
    }

    fn close(&self) {
        self.shutdown.send_replace(true);
    }
}

/// Resolves once the transport is closed or dropped.
async fn wait_closed(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// Forward queued frames to the socket until the transport closes.
pub async fn write_pump<K>(mut sink: K, channels: WsChannels)
where
    K: Sink<Message> + Unpin + Send,
    K::Error: Display,
{
    let WsChannels {
        mut outbound,
        mut shutdown,
    } = channels;

    loop {
        tokio::select! {
            biased;
            _ = wait_closed(&mut shutdown) => break,
            next = outbound.recv() => {
                let Some(message) = next else { break };
                // A peer that stops reading must not pin the pump past close.
                tokio::select! {
                    biased;
                    _ = wait_closed(&mut shutdown) => break,
                    sent = sink.send(message) => {
                        if let Err(e) = sent {
                            debug!(error = %e, "Socket write failed");
                            break;
                        }
                    }
                }
            }
        }
    }

    // Queued frames are dropped, further writes fail with `Closed`.
    outbound.close();
    let farewell = async {
        let _ = sink.send(Message::Close(None)).await;
        let _ = sink.close().await;
    };
    if tokio::time::timeout(CLOSE_FRAME_TIMEOUT, farewell).await.is_err() {
        debug!("Peer did not accept close frame");
    }
}

// =============================================================================
// FRAME SOURCE (read side)
// =============================================================================

/// Reads client frames from a WebSocket stream.
pub struct WsFrameSource<S> {
    stream: S,
    shutdown: watch::Receiver<bool>,
}

impl<S> WsFrameSource<S> {
    /// Wrap `stream`; reads end with `Closed` once `shutdown` fires.
    pub fn new(stream: S, shutdown: watch::Receiver<bool>) -> Self {
        Self { stream, shutdown }
    }
}

#[async_trait]
impl<S, E> FrameSource for WsFrameSource<S>
where
    S: Stream<Item = Result<Message, E>> + Unpin + Send,
    E: Display + Send,
{
    async fn read_next(&mut self) -> Result<Frame, TransportError> {
        tokio::select! {
            biased;
            _ = wait_closed(&mut self.shutdown) => Err(TransportError::Closed),
            next = self.stream.next() => match next {
                Some(Ok(Message::Text(text))) => Ok(Frame::Text(text)),
                Some(Ok(Message::Binary(data))) => Ok(Frame::Binary(data)),
                Some(Ok(Message::Ping(data))) => Ok(Frame::Ping(data)),
                Some(Ok(Message::Pong(data))) => Ok(Frame::Pong(data)),
                Some(Ok(Message::Close(_))) => Ok(Frame::Close),
                Some(Err(e)) => Err(TransportError::Io(e.to_string())),
                None => Err(TransportError::Closed),
            },
        }
    }
}

// =============================================================================
// CONNECTION LIFECYCLE
// =============================================================================

/// Shared state for the upgrade handler.
#[derive(Clone)]
pub struct WsState {
    registry: ConnectionRegistry,
    observer: Arc<dyn NotifierObserver>,
    buffer: usize,
}

impl WsState {
    pub fn new(registry: ConnectionRegistry, buffer: usize) -> Self {
        Self {
            registry,
            observer: Arc::new(NoopObserver),
            buffer,
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn NotifierObserver>) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }
}

/// Query parameters identifying the connecting client.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectParams {
    /// Student id for students; any unique id for teachers.
    pub id: String,
    pub role: Role,
}

/// Register a connection and run its pumps until it ends.
///
/// Any connection already registered under `id` is closed and replaced.
pub async fn serve_connection<K, S, E>(
    sink: K,
    stream: S,
    id: ConnectionId,
    role: Role,
    state: WsState,
) -> PumpExit
where
    K: Sink<Message> + Unpin + Send + 'static,
    K::Error: Display,
    S: Stream<Item = Result<Message, E>> + Unpin + Send,
    E: Display + Send,
{
    let (transport, channels) = WsTransport::new(state.buffer);
    let frames = WsFrameSource::new(stream, transport.shutdown_signal());
    let handle: ConnectionHandle = Arc::new(transport);
    tokio::spawn(write_pump(sink, channels));

    if let Some(previous) = state
        .registry
        .insert(id.clone(), role, handle.clone())
        .await
    {
        previous.handle.close();
        info!(connection_id = %id, "Replaced existing connection");
    }
    state
        .observer
        .connections_changed(state.registry.len().await);
    info!(connection_id = %id, role = %role, "Connection registered");

    run_read_pump(state.registry, id, handle, frames, state.observer).await
}

/// `GET` handler upgrading to a WebSocket.
pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<WsState>,
    Query(params): Query<ConnectParams>,
) -> Response {
    let id = match ConnectionId::new(params.id) {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "Rejected WebSocket upgrade");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };
    let role = params.role;

    ws.on_upgrade(move |socket: WebSocket| async move {
        let (sink, stream) = socket.split();
        serve_connection(sink, stream, id, role, state).await;
    })
}

/// Router serving the upgrade endpoint at `path`.
pub fn router(path: &str, state: WsState) -> Router {
    Router::new()
        .route(path, get(ws_upgrade))
        .with_state(state)
}
