//! Session lifecycle: creation, resume, unbind, and deletion.

use crate::error::{HandlerError, HandlerResult};
use crate::network::Transport;
use crate::state::{Client, Party, Session, SessionState};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tracing::info;

/// Owns every live session, keyed by session id.
///
/// Session ids are allocated by clients, so an id collision across two
/// different clients is a client bug and is rejected rather than resolved.
#[derive(Default)]
pub struct SessionService {
    sessions: DashMap<u64, Arc<Session>>,
}

impl SessionService {
    /// Whether a live session exists under this id.
    pub fn contains(&self, session_id: u64) -> bool {
        self.sessions.contains_key(&session_id)
    }

    /// Look up a live session.
    pub fn get(&self, session_id: u64) -> Option<Arc<Session>> {
        self.sessions.get(&session_id).map(|entry| entry.clone())
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is live.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Bind `transport` to the session named by `session_id`, resuming the
    /// existing session if the same client already owns it and creating a
    /// fresh one otherwise.
    ///
    /// On resume the pending keepalive timer is cancelled first, so a timer
    /// firing mid-resume loses the race and expires nothing. A resume that
    /// overtakes the old connection's teardown force-unbinds it; the stale
    /// reader will find its transport already detached.
    pub fn create_or_resume(
        &self,
        session_id: u64,
        client: Arc<Client>,
        party: Arc<Party>,
        transport: Transport,
    ) -> HandlerResult<Arc<Session>> {
        // The entry holds the key's shard lock, so the ownership check,
        // creation, and insert are one atomic step; two connections racing
        // to claim the same id serialize here and exactly one wins.
        let entry = self.sessions.entry(session_id);
        if let Entry::Occupied(occupied) = &entry {
            let existing = occupied.get();
            if existing.state() != SessionState::Expired {
                if existing.client().id() != client.id() {
                    return Err(HandlerError::SessionIdInUse(session_id));
                }
                let existing = Arc::clone(existing);
                existing.cancel_timer();
                existing.unbind();
                existing.bind(transport);
                info!(session = %existing, "session resumed");
                return Ok(existing);
            }
            // Expired leftover; the insert below replaces it.
        }

        let session = Arc::new(Session::new(session_id, client, party));
        session.bind(transport);
        entry.insert(Arc::clone(&session));
        info!(session = %session, "session created");
        Ok(session)
    }

    /// Detach the transport from a session, leaving it resumable.
    /// Unknown ids and non-active sessions are a no-op.
    pub fn unbind(&self, session_id: u64) -> bool {
        match self.get(session_id) {
            Some(session) => session.unbind(),
            None => false,
        }
    }

    /// Remove and close a session. The directory entry is removed only if
    /// it still denotes this exact instance, so a delete racing a resume
    /// that already reclaimed the id cannot evict the successor. Idempotent;
    /// a repeat delete returns `None` and does nothing.
    pub fn delete(&self, session: &Arc<Session>) -> Option<Arc<Session>> {
        let (_, removed) = self
            .sessions
            .remove_if(&session.id(), |_, current| Arc::ptr_eq(current, session))?;
        removed.close();
        info!(session = %removed, "session deleted");
        Some(removed)
    }
}
