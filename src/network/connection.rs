//! Per-socket connection task.

use crate::messaging::{MessageProcessor, SessionRef};
use crate::network::transport::{Frame, Transport};
use futures_util::{SinkExt, StreamExt};
use party_proto::EnvelopeCodec;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

/// One accepted client socket.
///
/// Runs a single task multiplexing the inbound envelope stream against the
/// outbound [`Frame`] channel. Inbound envelopes are handled one at a time,
/// so a connection's requests are strictly sequential; fan-in from other
/// connections arrives through the transport only.
pub struct Connection {
    peer: SocketAddr,
    framed: Framed<TcpStream, EnvelopeCodec>,
    processor: Arc<MessageProcessor>,
}

impl Connection {
    /// Wrap an accepted socket.
    pub fn new(stream: TcpStream, peer: SocketAddr, processor: Arc<MessageProcessor>) -> Self {
        Self {
            peer,
            framed: Framed::new(stream, EnvelopeCodec::new()),
            processor,
        }
    }

    /// Drive the connection until either side closes it.
    pub async fn run(self) {
        let peer = self.peer;
        let processor = self.processor;
        let (mut sink, mut stream) = self.framed.split();
        let (transport, mut outbound) = Transport::channel();
        let session_ref = SessionRef::default();

        loop {
            tokio::select! {
                frame = outbound.recv() => match frame {
                    Some(Frame::Envelope(envelope)) => {
                        if sink.send(envelope).await.is_err() {
                            warn!(%peer, "write failed, detaching");
                            processor.process_error(&session_ref);
                            break;
                        }
                    }
                    // Close arrives after the session was deleted; nothing
                    // left to detach.
                    Some(Frame::Close) | None => {
                        let _ = sink.close().await;
                        session_ref.clear();
                        debug!(%peer, "connection closed by broker");
                        break;
                    }
                },
                inbound = stream.next() => match inbound {
                    Some(Ok(envelope)) => {
                        if let Err(err) = processor.process_envelope(envelope, &transport, &session_ref) {
                            warn!(%peer, %err, "rejecting connection");
                            if let Some(reply) = err.to_error_envelope() {
                                let _ = sink.send(reply).await;
                            }
                            let _ = sink.close().await;
                            processor.process_error(&session_ref);
                            break;
                        }
                    }
                    Some(Err(err)) => {
                        warn!(%peer, %err, "stream error, detaching");
                        processor.process_error(&session_ref);
                        break;
                    }
                    None => {
                        debug!(%peer, "connection closed by peer");
                        processor.process_completed(&session_ref);
                        break;
                    }
                },
            }
        }
    }
}
