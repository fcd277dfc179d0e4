//! Adapters layer for the queue notifier subsystem.
//!
//! - `ws`: axum WebSocket transport, frame source and upgrade handler
//! - `memory_queue`: in-process queue store

pub mod memory_queue;
pub mod ws;

pub use memory_queue::InMemoryQueueStore;
pub use ws::{
    router, serve_connection, ws_upgrade, write_pump, ConnectParams, WsChannels, WsFrameSource,
    WsState, WsTransport, DEFAULT_WS_BUFFER,
};
