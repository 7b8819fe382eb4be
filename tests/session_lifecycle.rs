//! Session resume, rejection, and keepalive expiry over real sockets.

mod common;

use common::{TestClient, TestServer};
use party_proto::{Envelope, MessageType, StatusCode};
use std::time::Duration;

#[tokio::test]
async fn test_duplicate_session_id_is_rejected() {
    let server = TestServer::spawn().await;

    let mut owner = TestClient::connect(server.addr()).await;
    owner.join(10, 999, 100).await;

    // A different client claiming the same session id gets a typed error
    // and its connection closed.
    let mut intruder = TestClient::connect(server.addr()).await;
    intruder.send(Envelope::join_request(20, 999, 100)).await;
    let reply = intruder.recv().await;
    assert_eq!(reply.message_type, MessageType::Error);
    assert_eq!(reply.status_code, Some(StatusCode::SessionIdInUse));
    assert_eq!(reply.session_id, Some(100));
    intruder.expect_closed().await;

    // The owner is untouched.
    let mut probe = TestClient::connect(server.addr()).await;
    let roster = probe.join(30, 999, 300).await;
    assert!(roster.participants.iter().any(|p| p.client_id == 10));
}

#[tokio::test]
async fn test_resume_without_leave_keeps_membership() {
    let server = TestServer::spawn().await;

    let mut observer = TestClient::connect(server.addr()).await;
    observer.join(10, 999, 100).await;

    let mut flaky = TestClient::connect(server.addr()).await;
    flaky.join(20, 999, 200).await;
    let notice = observer.recv().await;
    assert_eq!(notice.message_type, MessageType::Join);
    observer.ack(&notice).await;

    // Drop the socket without a LEAVE; the session stays resumable.
    drop(flaky);

    let mut resumed = TestClient::connect(server.addr()).await;
    let roster = resumed.join(20, 999, 200).await;
    assert_eq!(roster.participants.len(), 2);

    // The observer never saw a leave, only the join announcements.
    let next = observer.recv().await;
    assert_eq!(next.message_type, MessageType::Join);
    assert_eq!(next.session_id, Some(200));
    assert!(observer
        .try_recv(Duration::from_millis(200))
        .await
        .is_none());
}

#[tokio::test]
async fn test_keepalive_expiry_broadcasts_client_timeout() {
    let server = TestServer::spawn_with_keepalive(Duration::from_secs(1)).await;

    let mut observer = TestClient::connect(server.addr()).await;
    observer.join(10, 999, 100).await;
    let mut silent = TestClient::connect(server.addr()).await;
    silent.join(20, 999, 200).await;

    // The observer stays alive by pinging; the silent client says nothing
    // and must be reaped.
    let notice = loop {
        observer.send(Envelope::ping()).await;
        let Some(envelope) = observer.try_recv(Duration::from_millis(300)).await else {
            continue;
        };
        match envelope.message_type {
            MessageType::Leave => break envelope,
            _ => observer.ack(&envelope).await,
        }
    };
    assert_eq!(notice.status_code, Some(StatusCode::ClientTimeout));
    assert_eq!(notice.session_id, Some(200));
    assert_eq!(notice.client_id, Some(20));

    // The expired session's connection is closed by the broker...
    silent.expect_closed().await;

    // ...and its id is free for a fresh session afterwards.
    let mut fresh = TestClient::connect(server.addr()).await;
    let roster = fresh.join(20, 999, 200).await;
    assert!(roster.participants.iter().any(|p| p.client_id == 10));
}
