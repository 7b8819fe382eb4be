//! partyd - party presence message broker.
//!
//! Clients attach a long-lived connection, join a party, and receive
//! real-time notifications as other members join, leave, or time out.
//! Sessions survive transport drops: a client may reconnect with the same
//! session id and resume until the keepalive window expires.
//!
//! The crate is a library plus a thin binary so the integration tests can
//! run the broker in-process on an ephemeral port.

pub mod config;
pub mod error;
pub mod messaging;
pub mod network;
pub mod services;
pub mod state;
