//! Long-lived broker services: entity registries, the session lifecycle
//! service, and keepalive expiry.

mod keepalive;
mod registry;
mod session;

pub use keepalive::KeepaliveService;
pub use registry::{ClientRegistry, PartyRegistry};
pub use session::SessionService;
