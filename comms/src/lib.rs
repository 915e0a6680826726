/// Request bodies which the client sends to the chat service
pub mod command;
/// Payloads which the chat service sends back: rooms, messages and replies
pub mod event;
/// Implementation of the chat service endpoints over HTTP and Server-Sent Events.
/// Requires the 'client' feature to be enabled and will bring in reqwest alongside with other dependencies
pub mod transport;
