//! The broker's message handling core.

use crate::error::HandlerResult;
use crate::messaging::SessionRef;
use crate::network::Transport;
use crate::services::{ClientRegistry, KeepaliveService, PartyRegistry, SessionService};
use crate::state::SessionState;
use party_proto::{Envelope, MessageType, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Dispatches inbound envelopes against the broker state.
///
/// One processor serves all connections; per-connection state lives in the
/// caller-owned [`SessionRef`]. Envelopes from one connection arrive
/// strictly in order, envelopes from different connections concurrently.
pub struct MessageProcessor {
    clients: ClientRegistry,
    parties: PartyRegistry,
    sessions: Arc<SessionService>,
    keepalive: KeepaliveService,
}

impl MessageProcessor {
    /// Create a processor with empty registries and the given keepalive
    /// timeout.
    pub fn new(keepalive_timeout: Duration) -> Self {
        let sessions = Arc::new(SessionService::default());
        Self {
            clients: ClientRegistry::default(),
            parties: PartyRegistry::default(),
            keepalive: KeepaliveService::new(keepalive_timeout, Arc::clone(&sessions)),
            sessions,
        }
    }

    /// Handle one inbound envelope.
    ///
    /// Malformed and out-of-place envelopes are ignored; the only error is
    /// the duplicate-session-id rejection, which the connection layer turns
    /// into an ERROR reply and a disconnect.
    pub fn process_envelope(
        &self,
        envelope: Envelope,
        transport: &Transport,
        session_ref: &SessionRef,
    ) -> HandlerResult<()> {
        debug!(message_type = ?envelope.message_type, message_id = envelope.message_id, "envelope received");
        match envelope.message_type {
            MessageType::Join => self.handle_join(envelope, transport, session_ref)?,
            MessageType::Leave => self.handle_leave(envelope, session_ref),
            MessageType::Ping => self.handle_ping(envelope, session_ref),
            MessageType::Ack => self.handle_ack(envelope, session_ref),
            MessageType::List | MessageType::Error => {
                debug!(message_type = ?envelope.message_type, "ignoring server-only envelope from client");
            }
        }

        // Any traffic proves the client alive.
        if let Some(session) = session_ref.get() {
            if session.state() == SessionState::Active {
                self.keepalive.arm(&session);
            }
        }
        Ok(())
    }

    /// The connection's stream errored. The session stays resumable.
    pub fn process_error(&self, session_ref: &SessionRef) {
        self.detach(session_ref);
    }

    /// The connection's stream ended cleanly. The session stays resumable.
    pub fn process_completed(&self, session_ref: &SessionRef) {
        self.detach(session_ref);
    }

    fn detach(&self, session_ref: &SessionRef) {
        if let Some(session) = session_ref.clear() {
            session.unbind();
            debug!(session = %session, "connection detached");
        }
    }

    fn handle_join(
        &self,
        envelope: Envelope,
        transport: &Transport,
        session_ref: &SessionRef,
    ) -> HandlerResult<()> {
        if session_ref.get().is_some() {
            debug!("ignoring JOIN on an already-joined connection");
            return Ok(());
        }
        let (Some(client_id), Some(party_id), Some(session_id)) =
            (envelope.client_id, envelope.party_id, envelope.session_id)
        else {
            debug!("ignoring JOIN with missing ids");
            return Ok(());
        };

        let client = self.clients.get_or_create(client_id);
        let party = self.parties.get_or_create(party_id);
        let session =
            self.sessions
                .create_or_resume(session_id, client, party, transport.clone())?;

        // ACK the JOIN before the roster so the client sees them in that
        // order on the wire.
        session.queue(Envelope::ack(envelope.message_id));
        session.flush();

        // A resume joins the party the session was created in, whatever the
        // envelope said.
        session.party().add_session(Arc::clone(&session));
        session_ref.set(session);
        Ok(())
    }

    fn handle_leave(&self, envelope: Envelope, session_ref: &SessionRef) {
        let Some(session) = session_ref.clear() else {
            debug!("ignoring LEAVE on a connection with no session");
            return;
        };
        session.party().remove_session(&session, StatusCode::Ok);

        // Still ACTIVE here, so the final ACK reaches the leaver before the
        // delete closes its connection.
        session.queue(Envelope::ack(envelope.message_id));
        session.flush();
        self.sessions.delete(&session);
    }

    fn handle_ping(&self, envelope: Envelope, session_ref: &SessionRef) {
        let Some(session) = session_ref.get() else {
            debug!("ignoring PING on a connection with no session");
            return;
        };
        session.queue(Envelope::ack(envelope.message_id));
        session.flush();
    }

    fn handle_ack(&self, envelope: Envelope, session_ref: &SessionRef) {
        let Some(session) = session_ref.get() else {
            return;
        };
        for message_id in envelope.ack_message_ids {
            session.ack(message_id);
        }
    }

    #[cfg(test)]
    pub(crate) fn sessions(&self) -> &SessionService {
        &self.sessions
    }
}
