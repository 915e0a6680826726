use std::{sync::Arc, time::Duration};

use tokio::{
    sync::mpsc::UnboundedSender,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::debug;

use super::service::{ChatService, ServiceEvent};

/// [PollLoop] refreshes the room directory at a fixed period for as long as it is alive.
///
/// The first refresh happens right away. A failed refresh does not stop the loop,
/// the next tick simply tries again.
pub struct PollLoop {
    handle: JoinHandle<()>,
}

impl PollLoop {
    pub fn spawn<S: ChatService>(
        service: Arc<S>,
        period: Duration,
        event_tx: UnboundedSender<ServiceEvent>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let result = service.list_rooms().await;
                debug!(ok = result.is_ok(), "room directory polled");

                // the store is gone, nobody is interested in the rooms anymore
                if event_tx.send(ServiceEvent::RoomsRefreshed(result)).is_err() {
                    break;
                }
            }
        });

        Self { handle }
    }
}

impl Drop for PollLoop {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
