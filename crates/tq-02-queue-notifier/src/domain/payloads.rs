//! # Per-Role Payloads
//!
//! Computes, from one queue snapshot, what every connection is sent in a
//! broadcast cycle:
//!
//! - **Teacher**: the full queue, serialized once and shared.
//! - **Student**: `{position, queueLength}` for the connection's own id,
//!   looked up in a position map rebuilt from the snapshot each cycle.

use shared_types::{ConnectionId, Payload, PositionInLine, QuestionQueue, Role};
use std::borrow::Cow;
use std::collections::HashMap;

/// Frames for one broadcast cycle.
#[derive(Debug)]
pub struct RolePayloads<'q> {
    teacher_frame: String,
    positions: HashMap<&'q str, PositionInLine>,
    queue_length: usize,
}

impl<'q> RolePayloads<'q> {
    /// Build the frames for `queue`.
    pub fn build(queue: &'q QuestionQueue) -> Result<Self, serde_json::Error> {
        Ok(Self {
            teacher_frame: Payload::QueueSnapshot(queue.clone()).to_json()?,
            positions: queue.student_positions(),
            queue_length: queue.len(),
        })
    }

    /// Position of `student`, or an absent position if they are not queued.
    #[must_use]
    pub fn position_of(&self, student: &str) -> PositionInLine {
        self.positions
            .get(student)
            .copied()
            .unwrap_or_else(|| PositionInLine::absent(self.queue_length))
    }

    /// Serialized frame for a connection.
    pub fn frame_for(
        &self,
        role: Role,
        id: &ConnectionId,
    ) -> Result<Cow<'_, str>, serde_json::Error> {
        match role {
            Role::Teacher => Ok(Cow::Borrowed(&self.teacher_frame)),
            Role::Student => {
                Payload::StudentPosition(self.position_of(id.as_str())).to_json().map(Cow::Owned)
            }
        }
    }

    #[must_use]
    pub fn queue_length(&self) -> usize {
        self.queue_length
    }
}
