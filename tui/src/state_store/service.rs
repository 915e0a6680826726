use async_trait::async_trait;
use comms::{
    command,
    event::{Message, Room, ServiceReply},
    transport::{
        client::{ChatClient, MessageStream},
        error::{NetworkError, StreamError},
    },
};

use super::room_sync::SelectionToken;

/// The operations of the chat service the state store depends on
#[async_trait]
pub trait ChatService: Send + Sync + 'static {
    async fn register(&self, credentials: &command::Credentials) -> Result<ServiceReply, NetworkError>;
    async fn login(&self, credentials: &command::Credentials) -> Result<ServiceReply, NetworkError>;
    async fn create_room(
        &self,
        command: &command::CreateRoomCommand,
    ) -> Result<ServiceReply, NetworkError>;
    async fn send_message(
        &self,
        command: &command::SendMessageCommand,
    ) -> Result<ServiceReply, NetworkError>;
    async fn list_rooms(&self) -> Result<Vec<Room>, NetworkError>;
    async fn fetch_history(&self, room_id: &str) -> Result<Vec<Message>, NetworkError>;
    async fn subscribe(&self, room_id: &str) -> Result<MessageStream, StreamError>;
}

#[async_trait]
impl ChatService for ChatClient {
    async fn register(&self, credentials: &command::Credentials) -> Result<ServiceReply, NetworkError> {
        ChatClient::register(self, credentials).await
    }

    async fn login(&self, credentials: &command::Credentials) -> Result<ServiceReply, NetworkError> {
        ChatClient::login(self, credentials).await
    }

    async fn create_room(
        &self,
        command: &command::CreateRoomCommand,
    ) -> Result<ServiceReply, NetworkError> {
        ChatClient::create_room(self, command).await
    }

    async fn send_message(
        &self,
        command: &command::SendMessageCommand,
    ) -> Result<ServiceReply, NetworkError> {
        ChatClient::send_message(self, command).await
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, NetworkError> {
        ChatClient::list_rooms(self).await
    }

    async fn fetch_history(&self, room_id: &str) -> Result<Vec<Message>, NetworkError> {
        ChatClient::fetch_history(self, room_id).await
    }

    async fn subscribe(&self, room_id: &str) -> Result<MessageStream, StreamError> {
        ChatClient::subscribe(self, room_id).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRequest {
    Login,
    Register,
}

/// Results of the network work spawned by the state store, delivered back to its main loop
#[derive(Debug)]
pub enum ServiceEvent {
    RoomsRefreshed(Result<Vec<Room>, NetworkError>),
    HistoryLoaded {
        token: SelectionToken,
        result: Result<Vec<Message>, NetworkError>,
    },
    LiveConnected {
        token: SelectionToken,
    },
    LiveMessage {
        token: SelectionToken,
        message: Message,
    },
    /// The push channel failed to open, failed while open or was closed by the service
    LiveClosed {
        token: SelectionToken,
        error: Option<StreamError>,
    },
    SessionResolved {
        request: SessionRequest,
        login: String,
        result: Result<ServiceReply, NetworkError>,
    },
    RoomCreated {
        name: String,
        result: Result<ServiceReply, NetworkError>,
    },
    MessageSent(Result<ServiceReply, NetworkError>),
}
