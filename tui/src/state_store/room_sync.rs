use std::sync::Arc;

use comms::event::Room;
use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};
use tokio_stream::StreamExt;
use tracing::{debug, info};

use super::service::{ChatService, ServiceEvent};

/// Identifies a room selection. Every selection gets a greater token than the previous one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SelectionToken(u64);

impl SelectionToken {
    fn next(self) -> Self {
        SelectionToken(self.0 + 1)
    }
}

/// Handle of the task which loads the history of a room and then listens to its push channel
struct Subscription {
    room_id: String,
    token: SelectionToken,
    handle: JoinHandle<()>,
}

impl Subscription {
    /// Aborts the task and waits until it is dropped, which closes its connection
    async fn close(mut self) {
        self.handle.abort();

        let _ = (&mut self.handle).await;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// [RoomSync] owns the active room and its single live subscription.
///
/// Selecting a room closes the previous subscription before the new one is started and
/// hands out a new [SelectionToken]. Results of the room task are tagged with the token,
/// so the results of a superseded selection can be recognized and dropped.
pub struct RoomSync<S: ChatService> {
    service: Arc<S>,
    event_tx: UnboundedSender<ServiceEvent>,
    active_room_id: Option<String>,
    subscription: Option<Subscription>,
    token: SelectionToken,
}

impl<S: ChatService> RoomSync<S> {
    pub fn new(service: Arc<S>, event_tx: UnboundedSender<ServiceEvent>) -> Self {
        Self {
            service,
            event_tx,
            active_room_id: None,
            subscription: None,
            token: SelectionToken::default(),
        }
    }

    pub fn active_room_id(&self) -> Option<&str> {
        self.active_room_id.as_deref()
    }

    /// Whether the token belongs to the latest selection
    pub fn is_current(&self, token: SelectionToken) -> bool {
        self.active_room_id.is_some() && self.token == token
    }

    pub fn has_subscription(&self) -> bool {
        self.subscription.is_some()
    }

    /// Refreshes the room directory once, outside of the poll loop schedule
    pub fn refresh_rooms(&self) {
        let service = self.service.clone();
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            let result = service.list_rooms().await;
            let _ = event_tx.send(ServiceEvent::RoomsRefreshed(result));
        });
    }

    /// Makes the given room the active one. Reselecting the active room opens a fresh subscription.
    pub async fn select_room(&mut self, room: &Room) -> SelectionToken {
        self.close().await;

        self.token = self.token.next();
        self.active_room_id = Some(room.id.clone());

        let handle = tokio::spawn(sync_room(
            self.service.clone(),
            room.id.clone(),
            self.token,
            self.event_tx.clone(),
        ));

        self.subscription = Some(Subscription {
            room_id: room.id.clone(),
            token: self.token,
            handle,
        });

        info!(room_id = %room.id, token = ?self.token, "room selected");

        self.token
    }

    /// Forgets the subscription of the given selection once its push channel has ended
    pub fn release(&mut self, token: SelectionToken) {
        if matches!(&self.subscription, Some(subscription) if subscription.token == token) {
            self.subscription = None;
        }
    }

    /// Closes the live subscription, if any
    pub async fn close(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            debug!(room_id = %subscription.room_id, "closing push channel");

            subscription.close().await;
        }
    }
}

async fn sync_room<S: ChatService>(
    service: Arc<S>,
    room_id: String,
    token: SelectionToken,
    event_tx: UnboundedSender<ServiceEvent>,
) {
    // the history is requested before the push channel is opened
    let result = service.fetch_history(&room_id).await;
    if event_tx
        .send(ServiceEvent::HistoryLoaded { token, result })
        .is_err()
    {
        return;
    }

    let mut messages = match service.subscribe(&room_id).await {
        Ok(messages) => messages,
        Err(err) => {
            let _ = event_tx.send(ServiceEvent::LiveClosed {
                token,
                error: Some(err),
            });
            return;
        }
    };

    if event_tx.send(ServiceEvent::LiveConnected { token }).is_err() {
        return;
    }

    let error = loop {
        match messages.next().await {
            Some(Ok(message)) => {
                if event_tx
                    .send(ServiceEvent::LiveMessage { token, message })
                    .is_err()
                {
                    return;
                }
            }
            Some(Err(err)) => break Some(err),
            None => break None,
        }
    };

    // the connection is released before the store hears about it
    drop(messages);

    let _ = event_tx.send(ServiceEvent::LiveClosed { token, error });
}
