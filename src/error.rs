//! Unified error handling for partyd.

use party_proto::{Envelope, StatusCode};
use thiserror::Error;

/// Errors that can occur while processing an inbound envelope.
///
/// Malformed and unknown envelopes are deliberately *not* errors: the broker
/// ignores them and keeps the connection open, favoring availability over
/// strictness. A [`HandlerError`] terminates the connection.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The requested session id is already held by a different client.
    #[error("session id {0} is in use by another client")]
    SessionIdInUse(u64),
}

impl HandlerError {
    /// Convert to a client-visible ERROR envelope.
    ///
    /// Returns `None` for errors that don't warrant a reply before the
    /// connection is terminated.
    pub fn to_error_envelope(&self) -> Option<Envelope> {
        match self {
            Self::SessionIdInUse(session_id) => {
                Some(Envelope::rejection(*session_id, StatusCode::SessionIdInUse))
            }
        }
    }
}

/// Result type for envelope handlers.
pub type HandlerResult<T = ()> = Result<T, HandlerError>;
