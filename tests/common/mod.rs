//! Shared harness for integration tests: an in-process broker and a framed
//! test client.

#![allow(dead_code)]

pub mod client;
pub mod server;

pub use client::TestClient;
pub use server::TestServer;
