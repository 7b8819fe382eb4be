//! Per-connection session slot.

use crate::state::Session;
use parking_lot::Mutex;
use std::sync::Arc;

/// The at-most-one session a connection is currently bound to.
///
/// Set by the first successful JOIN, cleared on LEAVE or disconnect. Further
/// JOINs on the same connection are ignored while the slot is occupied.
#[derive(Default)]
pub struct SessionRef {
    current: Mutex<Option<Arc<Session>>>,
}

impl SessionRef {
    /// The bound session, if any.
    pub fn get(&self) -> Option<Arc<Session>> {
        self.current.lock().clone()
    }

    /// Bind a session to this connection.
    pub fn set(&self, session: Arc<Session>) {
        *self.current.lock() = Some(session);
    }

    /// Take the bound session, leaving the slot empty.
    pub fn clear(&self) -> Option<Arc<Session>> {
        self.current.lock().take()
    }
}
