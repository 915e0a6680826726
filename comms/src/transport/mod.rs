/// HTTP implementation for a client to be able to interact with the chat service
#[cfg(feature = "client")]
pub mod client;
#[cfg(feature = "client")]
mod common;
/// Failures of the requests and of the push channel
#[cfg(feature = "client")]
pub mod error;
/// Incremental decoder for the `text/event-stream` format used by the push channel
pub mod sse;
