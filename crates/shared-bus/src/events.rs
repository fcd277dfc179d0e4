//! # Queue Events
//!
//! Bodies published to the broker whenever the question queue changes.
//! The notifier treats any decodable event as "the queue changed" and
//! re-reads the queue store; the event body is never trusted as queue state.

use serde::{Deserialize, Serialize};
use shared_types::entities::Question;

/// All events that can be published to the queue broker.
///
/// Encoded as JSON tagged by `type`, e.g.
/// `{"type": "question-new", "userID": "s1", "content": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QueueEvent {
    /// A student posted a question.
    QuestionNew {
        #[serde(rename = "userID")]
        user_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<Question>,
    },

    /// A question was answered or withdrawn.
    QuestionDelete {
        #[serde(rename = "userID")]
        user_id: String,
    },

    /// A teacher emptied the queue.
    QueueCleared,
}

impl QueueEvent {
    /// Decode a broker body.
    pub fn decode(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Encode for publishing.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Student affected by the event, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::QuestionNew { user_id, .. } | Self::QuestionDelete { user_id } => Some(user_id),
            Self::QueueCleared => None,
        }
    }

    /// Wire name of the event type.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::QuestionNew { .. } => "question-new",
            Self::QuestionDelete { .. } => "question-delete",
            Self::QueueCleared => "queue-cleared",
        }
    }
}
