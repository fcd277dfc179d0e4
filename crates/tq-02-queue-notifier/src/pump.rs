//! # Read Pump
//!
//! One task per live connection. It exists to notice when the peer goes
//! away: client frames carry no commands and are discarded. However the pump
//! ends (close frame, read error, or panic) the connection is deregistered
//! and closed.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use shared_types::ConnectionId;
use tracing::{debug, error, info};

use crate::domain::{ConnectionHandle, ConnectionRegistry, TransportError};
use crate::ports::{Frame, FrameSource, NotifierObserver};

/// Why a read pump stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PumpExit {
    /// The peer sent a close frame or the stream ended.
    Closed,
    /// Reading failed.
    ReadError(TransportError),
    /// The pump panicked.
    Panicked,
}

/// Read frames until the connection ends, then deregister it.
///
/// Deregistration only removes the registry entry if it still refers to
/// `handle`, so a pump outliving a replaced connection leaves the new one
/// alone.
pub async fn run_read_pump<F: FrameSource>(
    registry: ConnectionRegistry,
    id: ConnectionId,
    handle: ConnectionHandle,
    frames: F,
    observer: Arc<dyn NotifierObserver>,
) -> PumpExit {
    let exit = match AssertUnwindSafe(drain_frames(&id, frames))
        .catch_unwind()
        .await
    {
        Ok(exit) => exit,
        Err(_) => {
            error!(connection_id = %id, "Read pump panicked");
            PumpExit::Panicked
        }
    };

    handle.close();
    if registry.remove_if_current(&id, &handle).await {
        observer.connections_changed(registry.len().await);
        info!(connection_id = %id, reason = ?exit, "Connection deregistered");
    } else {
        debug!(connection_id = %id, reason = ?exit, "Connection already deregistered");
    }
    exit
}

async fn drain_frames<F: FrameSource>(id: &ConnectionId, mut frames: F) -> PumpExit {
    loop {
        match frames.read_next().await {
            Ok(Frame::Close) | Err(TransportError::Closed) => return PumpExit::Closed,
            Ok(Frame::Text(text)) => {
                debug!(connection_id = %id, len = text.len(), "Ignoring client text frame");
            }
            Ok(Frame::Binary(data)) => {
                debug!(connection_id = %id, len = data.len(), "Ignoring client binary frame");
            }
            Ok(Frame::Ping(_) | Frame::Pong(_)) => {}
            Err(e) => {
                debug!(connection_id = %id, error = %e, "Read failed");
                return PumpExit::ReadError(e);
            }
        }
    }
}
