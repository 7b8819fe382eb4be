use partyd::messaging::MessageProcessor;
use partyd::network::Gateway;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::task::JoinHandle;

/// A broker running in-process on an ephemeral port.
pub struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a broker with a keepalive timeout far beyond any test's
    /// runtime, so nothing expires unless a test wants it to.
    pub async fn spawn() -> Self {
        Self::spawn_with_keepalive(Duration::from_secs(600)).await
    }

    /// Start a broker with an explicit keepalive timeout.
    pub async fn spawn_with_keepalive(timeout: Duration) -> Self {
        let processor = MessageProcessor::new(timeout);
        let gateway = Gateway::bind("127.0.0.1:0".parse().unwrap(), processor)
            .await
            .expect("bind test gateway");
        let addr = gateway.local_addr().expect("gateway local addr");
        let handle = tokio::spawn(async move {
            let _ = gateway.run().await;
        });
        Self { addr, handle }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
