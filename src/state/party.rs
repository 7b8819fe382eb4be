//! Party membership and broadcast fan-out.

use crate::state::{Session, SessionState};
use parking_lot::Mutex;
use party_proto::{Envelope, Participant, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A broadcast group of sessions.
///
/// Membership changes and their fan-out happen under one mutex, so every
/// member observes joins and leaves in the same order. Lock order is always
/// party first, then session; sessions never call back into their party
/// while holding their own lock.
pub struct Party {
    id: u64,
    members: Mutex<HashMap<u64, Arc<Session>>>,
}

impl Party {
    /// Create an empty party.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            members: Mutex::new(HashMap::new()),
        }
    }

    /// The party id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of member sessions.
    pub fn member_count(&self) -> usize {
        self.members.lock().len()
    }

    /// Whether the given session id is currently a member.
    pub fn contains(&self, session_id: u64) -> bool {
        self.members.lock().contains_key(&session_id)
    }

    /// Admit a session: drop any stale entry under the same id, announce the
    /// join to existing members, send the joiner a roster snapshot, then
    /// flush everyone.
    ///
    /// The roster is built after the insert, so the joiner sees itself in
    /// the snapshot. Existing members learn of the joiner from the JOIN
    /// notice alone.
    pub fn add_session(&self, session: Arc<Session>) {
        let mut members = self.members.lock();

        // A resumed session re-joins under its old id; the map entry is the
        // same Arc, but an expired leftover under that id must not linger.
        if let Some(stale) = members.get(&session.id()) {
            if stale.state() == SessionState::Expired {
                members.remove(&session.id());
            }
        }

        for member in members.values() {
            if member.id() != session.id() {
                member.queue(Envelope::join_notice(session.client().id(), session.id()));
            }
        }

        members.insert(session.id(), Arc::clone(&session));
        debug!(party = self.id, session = %session, members = members.len(), "session joined");

        session.queue(Envelope::roster(roster(&members)));

        for member in members.values() {
            member.flush();
        }
    }

    /// Remove a session and announce the leave to the remaining members,
    /// with `status` telling them whether it was graceful or a timeout.
    ///
    /// Removal is keyed to this exact instance: if the session is not a
    /// member, or its id has already been reclaimed by a fresh attachment,
    /// nothing is removed and nothing is broadcast. A keepalive expiry
    /// racing a voluntary leave or a resume therefore cannot
    /// double-broadcast or evict the successor.
    pub fn remove_session(&self, session: &Arc<Session>, status: StatusCode) {
        let mut members = self.members.lock();
        match members.get(&session.id()) {
            Some(member) if Arc::ptr_eq(member, session) => {}
            _ => return,
        }
        members.remove(&session.id());
        debug!(party = self.id, session = %session, members = members.len(), "session left");

        for member in members.values() {
            member.queue(Envelope::leave_notice(
                session.client().id(),
                session.id(),
                status,
            ));
            member.flush();
        }
    }
}

/// Group member session ids by owning client.
fn roster(members: &HashMap<u64, Arc<Session>>) -> Vec<Participant> {
    let mut by_client: HashMap<u64, Vec<u64>> = HashMap::new();
    for session in members.values() {
        by_client
            .entry(session.client().id())
            .or_default()
            .push(session.id());
    }
    let mut participants: Vec<Participant> = by_client
        .into_iter()
        .map(|(client_id, mut session_ids)| {
            session_ids.sort_unstable();
            Participant {
                client_id,
                session_ids,
            }
        })
        .collect();
    participants.sort_unstable_by_key(|p| p.client_id);
    participants
}
