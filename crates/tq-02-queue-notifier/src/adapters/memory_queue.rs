//! In-memory queue store.
//!
//! Holds the question queue for a single gateway process. Starts with no
//! queue at all, so the first fetch reports `NotFound` the way a fresh
//! external store does.

use crate::domain::QueueStoreError;
use crate::ports::QueueStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Question, QuestionQueue};

#[derive(Debug, Default)]
pub struct InMemoryQueueStore {
    queue: RwLock<Option<QuestionQueue>>,
}

impl InMemoryQueueStore {
    /// Create a store with no queue written.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole queue.
    pub fn replace(&self, queue: QuestionQueue) {
        *self.queue.write() = Some(queue);
    }

    /// Append a question at the back of the line.
    ///
    /// A student already in line keeps their place; returns `false` then.
    pub fn push(&self, question: Question) -> bool {
        let mut guard = self.queue.write();
        let queue = guard.get_or_insert_with(QuestionQueue::default);
        if queue.queue.iter().any(|q| q.id == question.id) {
            return false;
        }
        queue.queue.push(question);
        true
    }

    /// Remove a student's question. Returns it if present.
    pub fn remove(&self, student_id: &str) -> Option<Question> {
        let mut guard = self.queue.write();
        let queue = guard.as_mut()?;
        let index = queue.queue.iter().position(|q| q.id == student_id)?;
        Some(queue.queue.remove(index))
    }

    /// Empty the queue. Returns how many questions were dropped.
    pub fn clear(&self) -> usize {
        let mut guard = self.queue.write();
        let queue = guard.get_or_insert_with(QuestionQueue::default);
        std::mem::take(&mut queue.queue).len()
    }

    /// Copy of the queue with everything but student ids stripped.
    #[must_use]
    pub fn studentized(&self) -> Option<QuestionQueue> {
        self.queue.read().as_ref().map(QuestionQueue::studentized)
    }
}

#[async_trait]
impl QueueStore for InMemoryQueueStore {
    async fn current_queue(&self) -> Result<QuestionQueue, QueueStoreError> {
        self.queue.read().clone().ok_or(QueueStoreError::NotFound)
    }
}
