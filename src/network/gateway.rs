//! TCP accept loop.

use crate::messaging::MessageProcessor;
use crate::network::Connection;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Listens for client connections and spawns one [`Connection`] task each.
pub struct Gateway {
    listener: TcpListener,
    processor: Arc<MessageProcessor>,
}

impl Gateway {
    /// Bind the listener.
    pub async fn bind(address: SocketAddr, processor: MessageProcessor) -> io::Result<Self> {
        let listener = TcpListener::bind(address).await?;
        info!(address = %listener.local_addr()?, "listening");
        Ok(Self {
            listener,
            processor: Arc::new(processor),
        })
    }

    /// The bound address, useful when binding port 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever.
    pub async fn run(self) -> io::Result<()> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            debug!(%peer, "connection accepted");
            let connection = Connection::new(stream, peer, Arc::clone(&self.processor));
            tokio::spawn(connection.run());
        }
    }
}
