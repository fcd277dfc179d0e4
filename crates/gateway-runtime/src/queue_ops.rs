//! # Queue Writer
//!
//! Mutates the queue store and announces each change on the broker, the
//! same two steps the question endpoints perform. The notifier picks the
//! change up from the broker; nothing here touches connections.

use std::sync::Arc;

use anyhow::{Context, Result};
use shared_bus::{InMemoryBroker, MessagePublisher, QueueEvent};
use shared_types::Question;
use tq_02_queue_notifier::InMemoryQueueStore;
use tracing::debug;

/// Writes questions and publishes the matching queue events.
#[derive(Clone)]
pub struct QueueWriter {
    store: Arc<InMemoryQueueStore>,
    broker: Arc<InMemoryBroker>,
}

impl QueueWriter {
    pub fn new(store: Arc<InMemoryQueueStore>, broker: Arc<InMemoryBroker>) -> Self {
        Self { store, broker }
    }

    /// Put a student's question in line. Returns `false` if they already
    /// had one; nothing is published then.
    pub async fn post_question(&self, question: Question) -> Result<bool> {
        let user_id = question.id.clone();
        if !self.store.push(question.clone()) {
            return Ok(false);
        }
        self.publish(QueueEvent::QuestionNew {
            user_id,
            content: Some(question),
        })
        .await?;
        Ok(true)
    }

    /// Take a student's question out of line.
    pub async fn resolve_question(&self, student_id: &str) -> Result<Option<Question>> {
        let Some(question) = self.store.remove(student_id) else {
            return Ok(None);
        };
        self.publish(QueueEvent::QuestionDelete {
            user_id: student_id.to_string(),
        })
        .await?;
        Ok(Some(question))
    }

    /// Empty the queue. Returns how many questions were dropped.
    pub async fn clear_queue(&self) -> Result<usize> {
        let cleared = self.store.clear();
        self.publish(QueueEvent::QueueCleared).await?;
        Ok(cleared)
    }

    async fn publish(&self, event: QueueEvent) -> Result<()> {
        let body = event.encode().context("Failed to encode queue event")?;
        let delivery_tag = self
            .broker
            .publish(body)
            .await
            .context("Failed to publish queue event")?;
        debug!(delivery_tag, kind = event.kind(), "Queue event published");
        Ok(())
    }
}
