//! # Outbound Payloads
//!
//! Every frame pushed to a WebSocket client is one variant of [`Payload`],
//! serialized as `{"type": ..., "data": ...}` so clients can dispatch on the
//! tag instead of guessing the shape.

use crate::entities::{PositionInLine, QuestionQueue};
use serde::{Deserialize, Serialize};

/// Tagged union of all frames the gateway sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum Payload {
    /// Full queue, sent to teachers.
    QueueSnapshot(QuestionQueue),
    /// One student's place in line, sent to that student.
    StudentPosition(PositionInLine),
}

impl Payload {
    /// Serialize to the JSON text written on the wire.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
