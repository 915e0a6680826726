use futures_util::{future, stream, StreamExt};
use reqwest::{header, Client, Response, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::{
    command,
    event::{Message, Room, ServiceReply},
};

use super::{
    common::{BoxedStream, EVENT_STREAM_CONTENT_TYPE},
    error::{NetworkError, StreamError},
    sse::SseDecoder,
};

pub const REGISTER_ENDPOINT: &str = "register";
pub const LOGIN_ENDPOINT: &str = "login";
pub const CREATE_ROOM_ENDPOINT: &str = "createroom";
pub const LIST_ROOMS_ENDPOINT: &str = "spitroom";
pub const ROOM_HISTORY_ENDPOINT: &str = "spitmessages";
pub const STREAM_MESSAGES_ENDPOINT: &str = "streammessages";
pub const SEND_MESSAGE_ENDPOINT: &str = "send";

const ROOM_ID_QUERY_KEY: &str = "room_id";

/// [MessageStream] is a stream of [crate::event::Message]s pushed by the service for a single room
///
/// Dropping the stream closes the underlying connection.
pub type MessageStream = BoxedStream<Result<Message, StreamError>>;

/// [ChatClient] issues the requests of the chat service relative to a base url
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    base_url: Url,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Result<Self, NetworkError> {
        Self::with_http_client(Client::new(), base_url)
    }

    pub fn with_http_client(http: Client, base_url: &str) -> Result<Self, NetworkError> {
        let mut url = Url::parse(base_url).map_err(|source| NetworkError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;

        // endpoints are joined relative to the base url, so a path prefix must end with a slash to be kept
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self {
            http,
            base_url: url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Registers a new user, `POST /register`
    pub async fn register(
        &self,
        credentials: &command::Credentials,
    ) -> Result<ServiceReply, NetworkError> {
        self.post(REGISTER_ENDPOINT, credentials).await
    }

    /// Logs in as an existing user, `POST /login`
    pub async fn login(
        &self,
        credentials: &command::Credentials,
    ) -> Result<ServiceReply, NetworkError> {
        self.post(LOGIN_ENDPOINT, credentials).await
    }

    /// Creates a room with the given members, `POST /createroom`
    pub async fn create_room(
        &self,
        command: &command::CreateRoomCommand,
    ) -> Result<ServiceReply, NetworkError> {
        self.post(CREATE_ROOM_ENDPOINT, command).await
    }

    /// Sends a message to a room, `POST /send`
    pub async fn send_message(
        &self,
        command: &command::SendMessageCommand,
    ) -> Result<ServiceReply, NetworkError> {
        self.post(SEND_MESSAGE_ENDPOINT, command).await
    }

    /// Lists the rooms known to the service, `GET /spitroom`
    pub async fn list_rooms(&self) -> Result<Vec<Room>, NetworkError> {
        self.get_json(LIST_ROOMS_ENDPOINT, &[]).await
    }

    /// Fetches the full message history of a room in the order the service returns it,
    /// `GET /spitmessages?room_id=<id>`
    pub async fn fetch_history(&self, room_id: &str) -> Result<Vec<Message>, NetworkError> {
        self.get_json(ROOM_HISTORY_ENDPOINT, &[(ROOM_ID_QUERY_KEY, room_id)])
            .await
    }

    /// Opens the push channel of a room, `GET /streammessages?room_id=<id>`.
    ///
    /// The returned stream yields one [Message] per delivered event and ends when the
    /// service closes the connection. A transport failure or an event stream that cannot be
    /// decoded is yielded as a single error item, after which the stream ends.
    pub async fn subscribe(&self, room_id: &str) -> Result<MessageStream, StreamError> {
        let response = self
            .send(
                STREAM_MESSAGES_ENDPOINT,
                self.http
                    .get(self.endpoint_url(STREAM_MESSAGES_ENDPOINT)?)
                    .query(&[(ROOM_ID_QUERY_KEY, room_id)])
                    .header(header::ACCEPT, EVENT_STREAM_CONTENT_TYPE),
            )
            .await?;

        debug!(room_id, "push channel opened");

        // the decoder is dropped after the first failure, which ends the stream
        let messages = response
            .bytes_stream()
            .scan(Some(SseDecoder::new()), |decoder, chunk| {
                let Some(active) = decoder.as_mut() else {
                    return future::ready(None);
                };

                let items: Vec<Result<Message, StreamError>> = match chunk {
                    Ok(chunk) => active
                        .feed(&chunk)
                        .into_iter()
                        .map(|event| {
                            event
                                .map(|data| Message::from_event_data(&data))
                                .map_err(StreamError::from)
                        })
                        .collect(),
                    Err(err) => vec![Err(StreamError::Transport(Box::new(err)))],
                };

                if items.iter().any(Result::is_err) {
                    *decoder = None;
                }

                future::ready(Some(stream::iter(items)))
            })
            .flatten();

        Ok(Box::pin(messages))
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url, NetworkError> {
        self.base_url
            .join(endpoint)
            .map_err(|source| NetworkError::InvalidUrl {
                url: format!("{}{}", self.base_url, endpoint),
                source,
            })
    }

    async fn send(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<Response, NetworkError> {
        let response = request
            .send()
            .await
            .map_err(|source| NetworkError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        debug!(endpoint, status = %response.status(), "service responded");

        if !response.status().is_success() {
            return Err(NetworkError::Status {
                endpoint: endpoint.to_string(),
                status: response.status(),
            });
        }

        Ok(response)
    }

    async fn read_body(&self, endpoint: &str, response: Response) -> Result<Vec<u8>, NetworkError> {
        let body = response
            .bytes()
            .await
            .map_err(|source| NetworkError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        Ok(body.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, NetworkError> {
        let request = self.http.get(self.endpoint_url(endpoint)?).query(query);
        let response = self.send(endpoint, request).await?;
        let body = self.read_body(endpoint, response).await?;

        serde_json::from_slice(&body).map_err(|source| NetworkError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<ServiceReply, NetworkError> {
        let request = self.http.post(self.endpoint_url(endpoint)?).json(body);
        let response = self.send(endpoint, request).await?;
        let body = self.read_body(endpoint, response).await?;

        Ok(ServiceReply::from_body(&String::from_utf8_lossy(&body)))
    }
}
