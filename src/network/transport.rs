//! Outbound transport handle.
//!
//! The state layer never touches sockets. Envelopes go into this handle and
//! the owning connection's writer task drains them to the wire, so sending
//! is non-blocking and safe to do while holding an entity lock.

use party_proto::Envelope;
use tokio::sync::mpsc;

/// A frame on a connection's writer channel.
#[derive(Debug)]
pub enum Frame {
    /// An envelope to serialize onto the wire.
    Envelope(Envelope),
    /// Flush and shut the connection down.
    Close,
}

/// The connection writer has gone away.
#[derive(Debug, thiserror::Error)]
#[error("transport closed")]
pub struct TransportClosed;

/// Cloneable, non-blocking handle to one connection's outbound stream.
#[derive(Debug, Clone)]
pub struct Transport {
    tx: mpsc::UnboundedSender<Frame>,
}

impl Transport {
    /// Create a transport and the receiver its writer task drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Frame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue an envelope for the wire. Never blocks.
    pub fn send(&self, envelope: Envelope) -> Result<(), TransportClosed> {
        self.tx
            .send(Frame::Envelope(envelope))
            .map_err(|_| TransportClosed)
    }

    /// Ask the writer to flush pending envelopes and close the connection.
    pub fn close(&self) {
        let _ = self.tx.send(Frame::Close);
    }
}

/// Collect the envelopes queued on a writer channel so far.
#[cfg(test)]
pub(crate) fn drain_envelopes(rx: &mut mpsc::UnboundedReceiver<Frame>) -> Vec<Envelope> {
    let mut envelopes = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        if let Frame::Envelope(envelope) = frame {
            envelopes.push(envelope);
        }
    }
    envelopes
}
