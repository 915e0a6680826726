pub use self::state::{LiveStatus, RoomCreationStatus, SessionStatus, State, SyncPhase, View};
pub use self::state_store::StateStore;

pub mod action;
mod poll_loop;
mod room_sync;
pub mod service;
mod state;
#[allow(clippy::module_inception)]
mod state_store;
#[cfg(test)]
mod test_support;
