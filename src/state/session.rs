//! Session state machine.
//!
//! A session is one logical client-to-party attachment, independent of how
//! many times the underlying transport connects and reconnects. All queue,
//! flush, binding, and timer operations go through the session's own mutex,
//! so a flush triggered by the owning connection can never interleave with
//! one triggered by a party broadcast touching the same session.

use crate::network::Transport;
use crate::state::{Client, Party};
use parking_lot::Mutex;
use party_proto::Envelope;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use tokio::task::AbortHandle;

/// Session lifecycle states.
///
/// ```text
/// NEW ──bind──▶ ACTIVE ──unbind──▶ INACTIVE ──bind──▶ ACTIVE
///                  │                   │
///                  └──────delete───────┴─▶ EXPIRED (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Just allocated, never bound to a transport.
    New,
    /// Bound to a live transport.
    Active,
    /// Unbound; eligible for resume until keepalive expiry.
    Inactive,
    /// Fully torn down. Terminal.
    Expired,
}

struct SessionInner {
    state: SessionState,
    /// Ordered outbound queue of not-yet-sent envelopes.
    outgoing: VecDeque<Envelope>,
    /// Sent-but-unacknowledged envelopes, keyed by message id.
    ///
    /// Entries are never retried or escalated; under sustained message loss
    /// this map grows without bound. Known limitation.
    inflight: HashMap<u64, Envelope>,
    transport: Option<Transport>,
    /// Armed keepalive timer, at most one.
    timer: Option<AbortHandle>,
    /// Bumped on every arm/cancel so a fired-but-stale timer callback can
    /// detect it lost the race against a rebind or delete.
    timer_epoch: u64,
}

/// One client-to-party attachment.
///
/// Client and party are fixed at creation; a session cannot change party.
pub struct Session {
    id: u64,
    client: Arc<Client>,
    party: Arc<Party>,
    inner: Mutex<SessionInner>,
}

impl Session {
    /// Create a session in the `NEW` state.
    pub fn new(id: u64, client: Arc<Client>, party: Arc<Party>) -> Self {
        Self {
            id,
            client,
            party,
            inner: Mutex::new(SessionInner {
                state: SessionState::New,
                outgoing: VecDeque::new(),
                inflight: HashMap::new(),
                transport: None,
                timer: None,
                timer_epoch: 0,
            }),
        }
    }

    /// The session id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The owning client.
    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    /// The owning party.
    pub fn party(&self) -> &Arc<Party> {
        &self.party
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    /// Enqueue an outbound envelope.
    ///
    /// Only takes effect while `ACTIVE`; otherwise the envelope is silently
    /// dropped. A resuming transport receives a fresh LIST snapshot instead,
    /// so stale pre-resume messages would be redundant or wrong.
    pub fn queue(&self, envelope: Envelope) {
        let mut inner = self.inner.lock();
        if inner.state == SessionState::Active {
            inner.outgoing.push_back(envelope);
        }
    }

    /// Move queued envelopes to the transport, recording each as inflight.
    ///
    /// Stops as soon as the session is no longer `ACTIVE` or no transport is
    /// bound; the remainder stays queued for the next bind.
    pub fn flush(&self) {
        let mut inner = self.inner.lock();
        while inner.state == SessionState::Active {
            let Some(transport) = inner.transport.clone() else {
                break;
            };
            let Some(envelope) = inner.outgoing.pop_front() else {
                break;
            };
            if transport.send(envelope.clone()).is_err() {
                // Writer is gone; the connection teardown will unbind us.
                inner.outgoing.push_front(envelope);
                break;
            }
            inner.inflight.insert(envelope.message_id, envelope);
        }
    }

    /// Acknowledge delivery of a sent envelope. Unknown ids are a no-op.
    pub fn ack(&self, message_id: u64) {
        self.inner.lock().inflight.remove(&message_id);
    }

    /// Attach a transport. Only takes effect from `NEW` or `INACTIVE`;
    /// callers must unbind an active session first.
    pub(crate) fn bind(&self, transport: Transport) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            SessionState::New | SessionState::Inactive => {
                inner.state = SessionState::Active;
                inner.transport = Some(transport);
                true
            }
            _ => false,
        }
    }

    /// Detach the transport without closing it; the caller owns the socket.
    /// Only takes effect from `ACTIVE`.
    pub(crate) fn unbind(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state == SessionState::Active {
            inner.state = SessionState::Inactive;
            inner.transport = None;
            true
        } else {
            false
        }
    }

    /// Tear the session down: cancel the timer, close the transport if one
    /// is still bound, clear both queues, and mark `EXPIRED`.
    ///
    /// Queues are cleared only when the state is not `ACTIVE`, an ordering
    /// guard carried over from the flush invariant.
    pub(crate) fn close(&self) {
        let mut inner = self.inner.lock();
        inner.timer_epoch += 1;
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }
        if let Some(transport) = inner.transport.take() {
            transport.close();
        }
        if inner.state != SessionState::Active {
            inner.outgoing.clear();
            inner.inflight.clear();
        }
        inner.state = SessionState::Expired;
    }

    /// Arm the keepalive timer, replacing any previously armed one.
    ///
    /// `spawn` receives the new timer epoch and returns the abort handle of
    /// the spawned expiry task; the whole exchange happens under the session
    /// mutex so two arms can never leave two live timers.
    pub(crate) fn arm_timer<F>(&self, spawn: F)
    where
        F: FnOnce(u64) -> AbortHandle,
    {
        let mut inner = self.inner.lock();
        inner.timer_epoch += 1;
        let handle = spawn(inner.timer_epoch);
        if let Some(previous) = inner.timer.replace(handle) {
            previous.abort();
        }
    }

    /// Abort any armed keepalive timer and invalidate its epoch.
    pub(crate) fn cancel_timer(&self) {
        let mut inner = self.inner.lock();
        inner.timer_epoch += 1;
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }
    }

    /// Entry point for a fired keepalive timer.
    ///
    /// Succeeds only if `epoch` still denotes the armed timer, i.e. no
    /// rebind, rearm, or delete happened since it was set. On success the
    /// session goes straight to `EXPIRED` (transport left attached so the
    /// follow-up teardown closes it), which forces any resume landing after
    /// this point onto the fresh-session path instead of rebinding the
    /// attachment being torn down. The caller proceeds with party removal
    /// and deletion, both keyed to this exact instance.
    pub(crate) fn begin_expiry(&self, epoch: u64) -> bool {
        let mut inner = self.inner.lock();
        if inner.timer_epoch != epoch || inner.state == SessionState::Expired {
            return false;
        }
        inner.timer.take();
        inner.state = SessionState::Expired;
        true
    }

    #[cfg(test)]
    pub(crate) fn queued_len(&self) -> usize {
        self.inner.lock().outgoing.len()
    }

    #[cfg(test)]
    pub(crate) fn inflight_len(&self) -> usize {
        self.inner.lock().inflight.len()
    }
}

impl fmt::Debug for Session {
    // No lock taken; safe to format while the session mutex is held.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("client", &self.client.id())
            .field("party", &self.party.id())
            .finish()
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Session(id={}, client={}, party={})",
            self.id,
            self.client.id(),
            self.party.id()
        )
    }
}
