//! # Core Domain Entities
//!
//! Defines the entities that flow between the identity store, the queue
//! store and the notifier.
//!
//! ## Clusters
//!
//! - **People**: `UserId`, `Identity`
//! - **Connections**: `ConnectionId`, `Role`
//! - **Queue**: `Question`, `QuestionQueue`, `PositionInLine`

use crate::errors::{ConnectionIdError, RoleParseError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// CLUSTER A: PEOPLE
// =============================================================================

/// Numeric identifier assigned to a user by the identity store.
pub type UserId = i64;

/// A person as seen by the name index: an identifier and every name the
/// person may be searched by (username, first name, last name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Identifier returned by searches.
    pub id: UserId,
    /// Names to index. Each entry may hold several whitespace-separated words.
    pub names: Vec<String>,
}

impl Identity {
    /// Create an identity from an id and any iterable of names.
    pub fn new<I, S>(id: UserId, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

// =============================================================================
// CLUSTER B: CONNECTIONS
// =============================================================================

/// Identifier of a live WebSocket connection.
///
/// For student connections this is the student identifier used as the key
/// into the queue, so a student's position can be looked up by connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Create a connection id, rejecting empty or whitespace-only input.
    pub fn new(id: impl Into<String>) -> Result<Self, ConnectionIdError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ConnectionIdError::Empty);
        }
        Ok(Self(id))
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ConnectionId {
    type Err = ConnectionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Which payload shape a connection receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Sees the full queue.
    Teacher,
    /// Sees only its own position.
    Student,
}

impl Role {
    /// Lowercase name used on the wire and in query strings.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Teacher => "teacher",
            Self::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "teacher" => Ok(Self::Teacher),
            "student" => Ok(Self::Student),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

// =============================================================================
// CLUSTER C: QUEUE
// =============================================================================

/// A single pending question.
///
/// `id` carries the asking student's identifier; everything else is opaque
/// to the notifier and only forwarded to teachers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Student identifier.
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub class: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub topic: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub problem: String,
    #[serde(default, rename = "loc.x", skip_serializing_if = "String::is_empty")]
    pub location_x: String,
    #[serde(default, rename = "loc.y", skip_serializing_if = "String::is_empty")]
    pub location_y: String,
    /// Unix timestamp (milliseconds) when the question was posted.
    #[serde(default)]
    pub created_at: i64,
}

impl Question {
    /// A question carrying only the student identifier.
    pub fn for_student(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Ordered queue of pending questions, front of the line first.
///
/// Serialized as `{"queue": [...]}`, the shape the queue store persists.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuestionQueue {
    #[serde(default)]
    pub queue: Vec<Question>,
}

impl QuestionQueue {
    /// Create a queue from questions in line order.
    #[must_use]
    pub fn new(queue: Vec<Question>) -> Self {
        Self { queue }
    }

    /// Number of pending questions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Map every student in the queue to their 1-based position.
    ///
    /// Built by a linear scan on every call. If a student appears more than
    /// once, the first occurrence wins.
    #[must_use]
    pub fn student_positions(&self) -> HashMap<&str, PositionInLine> {
        let queue_length = self.queue.len();
        let mut positions = HashMap::with_capacity(queue_length);
        for (index, question) in self.queue.iter().enumerate() {
            positions
                .entry(question.id.as_str())
                .or_insert(PositionInLine {
                    position: Some(index + 1),
                    queue_length,
                });
        }
        positions
    }

    /// Copy of the queue stripped down to student identifiers.
    #[must_use]
    pub fn studentized(&self) -> Self {
        Self {
            queue: self
                .queue
                .iter()
                .map(|q| Question::for_student(q.id.clone()))
                .collect(),
        }
    }
}

/// A student's view of the queue.
///
/// `position` is `None` when the student has no pending question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionInLine {
    pub position: Option<usize>,
    pub queue_length: usize,
}

impl PositionInLine {
    /// Position for a student who is not in a queue of `queue_length`.
    #[must_use]
    pub fn absent(queue_length: usize) -> Self {
        Self {
            position: None,
            queue_length,
        }
    }
}
