//! # party-proto
//!
//! The envelope schema and framing for the partyd presence broker.
//!
//! Every message exchanged between a client and the broker is a single
//! [`Envelope`]: a typed, timestamped unit with a random message id that the
//! receiver treats as an opaque correlation token. Type-specific payload
//! fields are optional and omitted from the wire when absent.
//!
//! ## Quick Start
//!
//! ```rust
//! use party_proto::{Envelope, MessageType};
//!
//! // A client asks to attach session 42 of client 7 to party 999.
//! let join = Envelope::join_request(7, 999, 42);
//! assert_eq!(join.message_type, MessageType::Join);
//!
//! // The broker acknowledges it by message id.
//! let ack = Envelope::ack(join.message_id);
//! assert_eq!(ack.ack_message_ids, vec![join.message_id]);
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod codec;
pub mod error;

pub use codec::EnvelopeCodec;
pub use error::ProtocolError;

use serde::{Deserialize, Serialize};

/// The kind of an [`Envelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    /// Client → broker: attach a session to a party.
    /// Broker → client: notification that another session joined.
    Join,
    /// Client → broker: detach gracefully.
    /// Broker → client: notification that a session left, with a status code.
    Leave,
    /// Client → broker: keepalive probe; answered with an ACK.
    Ping,
    /// Either direction: acknowledge previously received message ids.
    Ack,
    /// Broker → client: roster snapshot for the joined party.
    List,
    /// Broker → client: typed rejection before disconnect.
    Error,
}

/// Status codes carried by LEAVE notifications and ERROR envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    /// Graceful leave.
    Ok,
    /// A JOIN named a session id already held by a different client.
    SessionIdInUse,
    /// The session was expired by the keepalive timeout.
    ClientTimeout,
}

/// One roster entry: a client and all of its live session ids in the party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// The client id.
    pub client_id: u64,
    /// The client's session ids within the party.
    #[serde(default)]
    pub session_ids: Vec<u64>,
}

/// An immutable message unit.
///
/// Which optional fields are populated depends on [`MessageType`]; absent
/// fields and empty lists are omitted from the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Random id, opaque to the receiver; used for acknowledgment.
    pub message_id: u64,
    /// The kind of message.
    pub message_type: MessageType,
    /// Emission time in milliseconds since the Unix epoch. Advisory.
    pub timestamp: i64,
    /// JOIN request, and the subject of JOIN/LEAVE notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<u64>,
    /// JOIN request only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_id: Option<u64>,
    /// JOIN request, and the subject of JOIN/LEAVE/ERROR envelopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<u64>,
    /// LEAVE notifications and ERROR envelopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<StatusCode>,
    /// ACK only: the message ids being acknowledged.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ack_message_ids: Vec<u64>,
    /// LIST only: the party roster.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participants: Vec<Participant>,
}

impl Envelope {
    /// Create an envelope of the given type with a fresh random message id
    /// and the current timestamp, and no payload fields set.
    pub fn new(message_type: MessageType) -> Self {
        Self {
            message_id: rand::random(),
            message_type,
            timestamp: chrono::Utc::now().timestamp_millis(),
            client_id: None,
            party_id: None,
            session_id: None,
            status_code: None,
            ack_message_ids: Vec::new(),
            participants: Vec::new(),
        }
    }

    /// An ACK for a single received message id.
    pub fn ack(acked_message_id: u64) -> Self {
        let mut envelope = Self::new(MessageType::Ack);
        envelope.ack_message_ids.push(acked_message_id);
        envelope
    }

    /// A client's request to attach `session_id` to `party_id`.
    pub fn join_request(client_id: u64, party_id: u64, session_id: u64) -> Self {
        let mut envelope = Self::new(MessageType::Join);
        envelope.client_id = Some(client_id);
        envelope.party_id = Some(party_id);
        envelope.session_id = Some(session_id);
        envelope
    }

    /// A client's request to detach gracefully.
    pub fn leave_request() -> Self {
        Self::new(MessageType::Leave)
    }

    /// A keepalive probe.
    pub fn ping() -> Self {
        Self::new(MessageType::Ping)
    }

    /// Notification to existing members that a session joined their party.
    pub fn join_notice(client_id: u64, session_id: u64) -> Self {
        let mut envelope = Self::new(MessageType::Join);
        envelope.client_id = Some(client_id);
        envelope.session_id = Some(session_id);
        envelope
    }

    /// Notification to remaining members that a session left their party.
    pub fn leave_notice(client_id: u64, session_id: u64, status: StatusCode) -> Self {
        let mut envelope = Self::new(MessageType::Leave);
        envelope.client_id = Some(client_id);
        envelope.session_id = Some(session_id);
        envelope.status_code = Some(status);
        envelope
    }

    /// Roster snapshot sent to a freshly joined session.
    pub fn roster(participants: Vec<Participant>) -> Self {
        let mut envelope = Self::new(MessageType::List);
        envelope.participants = participants;
        envelope
    }

    /// Typed rejection sent before the broker terminates the connection.
    pub fn rejection(session_id: u64, status: StatusCode) -> Self {
        let mut envelope = Self::new(MessageType::Error);
        envelope.session_id = Some(session_id);
        envelope.status_code = Some(status);
        envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ack_carries_exactly_one_id() {
        let ack = Envelope::ack(77);
        assert_eq!(ack.message_type, MessageType::Ack);
        assert_eq!(ack.ack_message_ids, vec![77]);
        assert!(ack.client_id.is_none());
    }

    #[test]
    fn test_message_ids_are_fresh() {
        // Random 64-bit ids; two envelopes colliding would be astonishing.
        let a = Envelope::ping();
        let b = Envelope::ping();
        assert_ne!(a.message_id, b.message_id);
    }

    #[test]
    fn test_absent_fields_are_omitted_from_the_wire() {
        let json = serde_json::to_string(&Envelope::ping()).unwrap();
        assert!(!json.contains("client_id"));
        assert!(!json.contains("ack_message_ids"));
        assert!(!json.contains("participants"));

        let json = serde_json::to_string(&Envelope::join_request(1, 2, 3)).unwrap();
        assert!(json.contains("\"party_id\":2"));
        assert!(json.contains("\"message_type\":\"JOIN\""));
    }

    #[test]
    fn test_rejection_fields() {
        let rejection = Envelope::rejection(5, StatusCode::SessionIdInUse);
        assert_eq!(rejection.message_type, MessageType::Error);
        assert_eq!(rejection.session_id, Some(5));
        assert_eq!(rejection.status_code, Some(StatusCode::SessionIdInUse));
    }

    #[test]
    fn test_status_code_wire_names() {
        let json = serde_json::to_string(&StatusCode::ClientTimeout).unwrap();
        assert_eq!(json, "\"CLIENT_TIMEOUT\"");
    }
}
