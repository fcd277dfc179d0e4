//! Test doubles for the notifier ports.
//!
//! Compiled for unit tests and, behind the `test-utils` feature, for the
//! integration suite.

use crate::domain::{QueueStoreError, TransportError};
use crate::ports::{ConnectionTransport, Frame, FrameSource, NotifierObserver, QueueStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::QuestionQueue;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// Transport that records every frame written to it.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    frames: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames written so far.
    pub fn frames(&self) -> Vec<String> {
        self.frames.lock().clone()
    }

    /// The most recent frame parsed as JSON.
    pub fn last_json(&self) -> Option<serde_json::Value> {
        self.frames
            .lock()
            .last()
            .and_then(|frame| serde_json::from_str(frame).ok())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl ConnectionTransport for RecordingTransport {
    fn write_text(&self, text: &str) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        self.frames.lock().push(text.to_owned());
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Transport whose writes always fail.
#[derive(Debug, Default)]
pub struct FailingTransport {
    attempts: AtomicUsize,
    closed: AtomicBool,
}

impl FailingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl ConnectionTransport for FailingTransport {
    fn write_text(&self, _text: &str) -> Result<(), TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(TransportError::Io("broken pipe".into()))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Queue store returning scripted results, then a fixed queue.
#[derive(Debug, Default)]
pub struct MockQueueStore {
    scripted: Mutex<VecDeque<Result<QuestionQueue, QueueStoreError>>>,
    current: Mutex<Option<QuestionQueue>>,
    fetches: AtomicUsize,
}

impl MockQueueStore {
    /// A store that has never had a queue written.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding `queue`.
    pub fn with_queue(queue: QuestionQueue) -> Self {
        let store = Self::default();
        store.set_queue(queue);
        store
    }

    pub fn set_queue(&self, queue: QuestionQueue) {
        *self.current.lock() = Some(queue);
    }

    /// Make the next fetch return `error`.
    pub fn fail_next(&self, error: QueueStoreError) {
        self.scripted.lock().push_back(Err(error));
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueueStore for MockQueueStore {
    async fn current_queue(&self) -> Result<QuestionQueue, QueueStoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(result) = self.scripted.lock().pop_front() {
            return result;
        }
        self.current.lock().clone().ok_or(QueueStoreError::NotFound)
    }
}

/// Frame source fed through a channel. Dropping the sender ends the stream.
#[derive(Debug)]
pub struct ChannelFrames {
    receiver: mpsc::UnboundedReceiver<Result<Frame, TransportError>>,
}

/// Create a frame source and the sender that drives it.
pub fn frame_channel() -> (
    mpsc::UnboundedSender<Result<Frame, TransportError>>,
    ChannelFrames,
) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (sender, ChannelFrames { receiver })
}

#[async_trait]
impl FrameSource for ChannelFrames {
    async fn read_next(&mut self) -> Result<Frame, TransportError> {
        self.receiver.recv().await.unwrap_or(Err(TransportError::Closed))
    }
}

/// Observer counting every hook.
#[derive(Debug, Default)]
pub struct CountingObserver {
    pub broadcasts: AtomicUsize,
    pub delivered: AtomicUsize,
    pub pruned: AtomicUsize,
    pub dropped: AtomicUsize,
    pub active: AtomicUsize,
}

impl NotifierObserver for CountingObserver {
    fn broadcast_completed(&self, delivered: usize, pruned: usize) {
        self.broadcasts.fetch_add(1, Ordering::SeqCst);
        self.delivered.fetch_add(delivered, Ordering::SeqCst);
        self.pruned.fetch_add(pruned, Ordering::SeqCst);
    }

    fn delivery_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
    }

    fn connections_changed(&self, active: usize) {
        self.active.store(active, Ordering::SeqCst);
    }
}
