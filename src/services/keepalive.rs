//! Keepalive expiry.
//!
//! Every message from a session rearms its timer; a timer that reaches the
//! timeout expires the session, broadcasts a CLIENT_TIMEOUT leave to its
//! party, and deletes it. One timer task per session, replaced on rearm.

use crate::services::SessionService;
use crate::state::Session;
use party_proto::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Arms and rearms per-session expiry timers.
pub struct KeepaliveService {
    timeout: Duration,
    sessions: Arc<SessionService>,
}

impl KeepaliveService {
    /// Create a service expiring sessions after `timeout` of silence.
    pub fn new(timeout: Duration, sessions: Arc<SessionService>) -> Self {
        Self { timeout, sessions }
    }

    /// Arm (or rearm) the expiry timer for a session.
    ///
    /// The timer carries the epoch it was armed under; if the session is
    /// rearmed, resumed, or deleted before it fires, `begin_expiry` rejects
    /// the stale epoch and the fired task does nothing.
    pub fn arm(&self, session: &Arc<Session>) {
        let timeout = self.timeout;
        let sessions = Arc::clone(&self.sessions);
        let expiring = Arc::clone(session);
        session.arm_timer(move |epoch| {
            tokio::spawn(async move {
                sleep(timeout).await;
                if !expiring.begin_expiry(epoch) {
                    return;
                }
                warn!(session = %expiring, timeout = ?timeout, "session expired");
                Self::reap(&expiring, &sessions);
            })
            .abort_handle()
        });
    }

    /// Tear down a session that has passed its expiry check.
    ///
    /// `begin_expiry` already marked it `EXPIRED`, so a resume arriving
    /// from here on creates a fresh session under the same id. Both the
    /// party removal and the directory delete are keyed to this exact
    /// instance and leave any such successor untouched; if the delete lost
    /// the id to one, only the old transport is left to close.
    fn reap(expiring: &Arc<Session>, sessions: &SessionService) {
        expiring
            .party()
            .remove_session(expiring, StatusCode::ClientTimeout);
        if sessions.delete(expiring).is_none() {
            expiring.close();
        }
    }
}
