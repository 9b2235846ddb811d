//! Messaging data model
//!
//! Entities exchanged with the messaging API. Field names follow the API's
//! camelCase convention; aliases accept the older field names still emitted
//! by deployed backends (`_id`, `name`, `message`, `timestamp`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use careline_common::{Error, Identity, Result};

/// Directory entry: someone the operator may converse with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counterpart {
    #[serde(alias = "_id")]
    pub id: Identity,
    #[serde(alias = "name")]
    pub display_name: String,
}

impl Counterpart {
    pub fn new(id: Identity, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}

/// Which way a message travelled, seen from one participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outgoing,
    Incoming,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Outgoing => write!(f, "outgoing"),
            Direction::Incoming => write!(f, "incoming"),
        }
    }
}

/// A single message in a two-party conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub sender_id: Identity,
    pub receiver_id: Identity,
    #[serde(alias = "message")]
    pub body: String,
    #[serde(alias = "timestamp", with = "timestamp")]
    pub sent_at: DateTime<Utc>,
}

impl Message {
    /// Create a new message
    pub fn new(
        sender_id: Identity,
        receiver_id: Identity,
        body: impl Into<String>,
        sent_at: DateTime<Utc>,
    ) -> Result<Self> {
        let body = body.into();
        Self::validate_body(&body)?;

        if sender_id == receiver_id {
            return Err(Error::Validation(
                "Sender and receiver must be different participants".to_string(),
            ));
        }

        Ok(Message {
            sender_id,
            receiver_id,
            body,
            sent_at,
        })
    }

    /// Whether this message was exchanged between `a` and `b`, in either direction
    pub fn is_between(&self, a: &Identity, b: &Identity) -> bool {
        (&self.sender_id == a && &self.receiver_id == b)
            || (&self.sender_id == b && &self.receiver_id == a)
    }

    /// Direction of this message from `operator`'s point of view
    pub fn direction_for(&self, operator: &Identity) -> Direction {
        if &self.sender_id == operator {
            Direction::Outgoing
        } else {
            Direction::Incoming
        }
    }

    /// Whether `body` has any non-whitespace content
    pub fn is_sendable(body: &str) -> bool {
        !body.trim().is_empty()
    }

    fn validate_body(body: &str) -> Result<()> {
        if !Self::is_sendable(body) {
            return Err(Error::Validation(
                "Message body cannot be empty or whitespace-only".to_string(),
            ));
        }
        Ok(())
    }
}

/// Request for a conversation's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchHistoryRequest {
    pub counterpart_id: Identity,
    pub operator_id: Identity,
}

/// Request to append a message to a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub sender_id: Identity,
    pub receiver_id: Identity,
    pub body: String,
}

/// Timestamps arrive either as RFC 3339 strings or as epoch milliseconds.
mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Millis(i64),
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(de::Error::custom),
            Raw::Millis(ms) => DateTime::from_timestamp_millis(ms)
                .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {}", ms))),
        }
    }
}
