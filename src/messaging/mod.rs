//! Inbound envelope dispatch.

mod processor;
mod session_ref;

pub use processor::MessageProcessor;
pub use session_ref::SessionRef;
