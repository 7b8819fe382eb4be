use futures_util::{SinkExt, StreamExt};
use party_proto::{Envelope, EnvelopeCodec, MessageType};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// A framed client speaking the envelope protocol against a [`TestServer`].
///
/// [`TestServer`]: super::TestServer
pub struct TestClient {
    framed: Framed<TcpStream, EnvelopeCodec>,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect to broker");
        Self {
            framed: Framed::new(stream, EnvelopeCodec::new()),
        }
    }

    pub async fn send(&mut self, envelope: Envelope) {
        self.framed.send(envelope).await.expect("send envelope");
    }

    /// Receive the next envelope, failing the test after a few seconds.
    pub async fn recv(&mut self) -> Envelope {
        timeout(RECV_TIMEOUT, self.framed.next())
            .await
            .expect("timed out waiting for an envelope")
            .expect("connection closed while waiting for an envelope")
            .expect("protocol error")
    }

    /// Receive the next envelope, or `None` if nothing arrives within
    /// `wait`. Panics if the connection closes.
    pub async fn try_recv(&mut self, wait: Duration) -> Option<Envelope> {
        match timeout(wait, self.framed.next()).await {
            Ok(Some(Ok(envelope))) => Some(envelope),
            Ok(Some(Err(err))) => panic!("protocol error: {err}"),
            Ok(None) => panic!("connection closed while waiting for an envelope"),
            Err(_) => None,
        }
    }

    /// Receive until an envelope matches `predicate`, acknowledging and
    /// discarding everything in between.
    pub async fn recv_until(&mut self, predicate: impl Fn(&Envelope) -> bool) -> Envelope {
        loop {
            let envelope = self.recv().await;
            if predicate(&envelope) {
                return envelope;
            }
            self.send(Envelope::ack(envelope.message_id)).await;
        }
    }

    pub async fn ack(&mut self, envelope: &Envelope) {
        self.send(Envelope::ack(envelope.message_id)).await;
    }

    /// JOIN a party and return the roster snapshot.
    ///
    /// Asserts the broker's reply ordering: the ACK for the JOIN request is
    /// the first envelope on the wire, the roster follows.
    pub async fn join(&mut self, client_id: u64, party_id: u64, session_id: u64) -> Envelope {
        let request = Envelope::join_request(client_id, party_id, session_id);
        let request_id = request.message_id;
        self.send(request).await;

        let first = self.recv().await;
        assert_eq!(first.message_type, MessageType::Ack, "JOIN must be ACKed first");
        assert_eq!(first.ack_message_ids, vec![request_id]);

        let roster = self
            .recv_until(|e| e.message_type == MessageType::List)
            .await;
        self.ack(&roster).await;
        roster
    }

    /// LEAVE and return the ACK for the LEAVE request.
    ///
    /// Broadcasts addressed to this session may still arrive ahead of the
    /// ACK; they are acknowledged and skipped.
    pub async fn leave(&mut self) -> Envelope {
        let request = Envelope::leave_request();
        let request_id = request.message_id;
        self.send(request).await;
        self.recv_until(|e| {
            e.message_type == MessageType::Ack && e.ack_message_ids.contains(&request_id)
        })
        .await
    }

    /// Consume the stream to its end, asserting the broker closes it.
    pub async fn expect_closed(&mut self) {
        loop {
            match timeout(RECV_TIMEOUT, self.framed.next()).await {
                Ok(Some(Ok(_))) => continue,
                Ok(Some(Err(_))) | Ok(None) => return,
                Err(_) => panic!("timed out waiting for the broker to close the connection"),
            }
        }
    }
}
