//! Network layer: listener, per-connection tasks, and the outbound
//! transport handle the state layer writes into.

mod connection;
mod gateway;
pub(crate) mod transport;

pub use connection::Connection;
pub use gateway::Gateway;
pub use transport::{Frame, Transport, TransportClosed};
