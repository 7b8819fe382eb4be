//! State management module.
//!
//! Contains the Client, Party, and Session entities that make up the
//! broker's in-memory model.

mod client;
mod party;
mod session;

pub use client::Client;
pub use party::Party;
pub use session::{Session, SessionState};
