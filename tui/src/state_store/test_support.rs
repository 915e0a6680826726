use std::{
    collections::HashMap,
    io,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use comms::{
    command,
    event::{Message, Room, ServiceReply},
    transport::{
        client::MessageStream,
        error::{NetworkError, StatusCode, StreamError},
    },
};
use tokio::sync::{mpsc, Notify};
use tokio_stream::{wrappers::UnboundedReceiverStream, StreamExt};

use super::service::ChatService;

type ChannelSender = mpsc::UnboundedSender<Result<Message, StreamError>>;

/// Decrements the open channel counter once the push stream holding it is dropped
struct OpenChannelGuard(Arc<AtomicUsize>);

impl Drop for OpenChannelGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In memory chat service recording what the client asked for
#[derive(Default)]
pub struct FakeService {
    rooms: Mutex<Vec<Room>>,
    histories: Mutex<HashMap<String, Vec<Message>>>,
    channels: Mutex<HashMap<String, ChannelSender>>,
    subscriptions: Mutex<Vec<String>>,
    sent: Mutex<Vec<command::SendMessageCommand>>,
    created: Mutex<Vec<command::CreateRoomCommand>>,
    /// Rooms whose history requests wait until released
    history_gates: Mutex<HashMap<String, Arc<Notify>>>,
    pub fail_room_listing: AtomicBool,
    pub fail_session: AtomicBool,
    pub list_calls: AtomicUsize,
    pub open_channels: Arc<AtomicUsize>,
    pub max_open_channels: AtomicUsize,
}

fn internal_error(endpoint: &str) -> NetworkError {
    NetworkError::Status {
        endpoint: endpoint.to_string(),
        status: StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl FakeService {
    pub fn with_rooms(rooms: Vec<Room>) -> Self {
        let service = Self::default();
        *service.rooms.lock().unwrap() = rooms;
        service
    }

    pub fn set_history(&self, room_id: &str, messages: Vec<Message>) {
        self.histories
            .lock()
            .unwrap()
            .insert(room_id.to_string(), messages);
    }

    /// Makes the next history requests of the room wait for [FakeService::release_history]
    pub fn hold_history(&self, room_id: &str) {
        self.history_gates
            .lock()
            .unwrap()
            .insert(room_id.to_string(), Arc::new(Notify::new()));
    }

    /// Lets the held history request of the room complete, even one not started yet
    pub fn release_history(&self, room_id: &str) {
        if let Some(gate) = self.history_gates.lock().unwrap().remove(room_id) {
            gate.notify_one();
        }
    }

    /// Pushes a message on the open channel of the room
    pub fn push(&self, room_id: &str, message: Message) {
        if let Some(channel) = self.channels.lock().unwrap().get(room_id) {
            let _ = channel.send(Ok(message));
        }
    }

    /// Fails the open channel of the room with a transport error
    pub fn fail_channel(&self, room_id: &str) {
        if let Some(channel) = self.channels.lock().unwrap().remove(room_id) {
            let _ = channel.send(Err(StreamError::Transport(Box::new(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by the service",
            )))));
        }
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<command::SendMessageCommand> {
        self.sent.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<command::CreateRoomCommand> {
        self.created.lock().unwrap().clone()
    }

    fn session_reply(&self, endpoint: &str) -> Result<ServiceReply, NetworkError> {
        if self.fail_session.load(Ordering::SeqCst) {
            return Err(internal_error(endpoint));
        }

        Ok(ServiceReply::from_body(r#"{"status":"success"}"#))
    }
}

#[async_trait]
impl ChatService for FakeService {
    async fn register(&self, _credentials: &command::Credentials) -> Result<ServiceReply, NetworkError> {
        self.session_reply("register")
    }

    async fn login(&self, _credentials: &command::Credentials) -> Result<ServiceReply, NetworkError> {
        self.session_reply("login")
    }

    async fn create_room(
        &self,
        command: &command::CreateRoomCommand,
    ) -> Result<ServiceReply, NetworkError> {
        self.created.lock().unwrap().push(command.clone());
        self.rooms
            .lock()
            .unwrap()
            .push(Room::new(format!("created-{}", command.room), command.room.clone()));

        Ok(ServiceReply::from_body(""))
    }

    async fn send_message(
        &self,
        command: &command::SendMessageCommand,
    ) -> Result<ServiceReply, NetworkError> {
        self.sent.lock().unwrap().push(command.clone());

        Ok(ServiceReply::from_body(r#"{"status":"success"}"#))
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, NetworkError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_room_listing.load(Ordering::SeqCst) {
            return Err(internal_error("spitroom"));
        }

        Ok(self.rooms.lock().unwrap().clone())
    }

    async fn fetch_history(&self, room_id: &str) -> Result<Vec<Message>, NetworkError> {
        let gate = self.history_gates.lock().unwrap().get(room_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        Ok(self
            .histories
            .lock()
            .unwrap()
            .get(room_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn subscribe(&self, room_id: &str) -> Result<MessageStream, StreamError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.channels.lock().unwrap().insert(room_id.to_string(), tx);
        self.subscriptions.lock().unwrap().push(room_id.to_string());

        let open = self.open_channels.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_open_channels.fetch_max(open, Ordering::SeqCst);

        let guard = OpenChannelGuard(self.open_channels.clone());

        Ok(Box::pin(UnboundedReceiverStream::new(rx).map(move |item| {
            let _ = &guard;
            item
        })))
    }
}
