use std::{sync::Arc, time::Duration};

use comms::command;
use tokio::sync::{
    broadcast,
    mpsc::{self, UnboundedReceiver, UnboundedSender},
};
use tracing::{debug, info, warn};

use crate::{Interrupted, Terminator};

use super::{
    action::Action,
    poll_loop::PollLoop,
    room_sync::RoomSync,
    service::{ChatService, ServiceEvent, SessionRequest},
    State,
};

pub struct StateStore<S: ChatService> {
    state_tx: UnboundedSender<State>,
    service: Arc<S>,
    service_url: String,
    poll_interval: Duration,
}

impl<S: ChatService> StateStore<S> {
    pub fn new(
        service: Arc<S>,
        service_url: String,
        poll_interval: Duration,
    ) -> (Self, UnboundedReceiver<State>) {
        let (state_tx, state_rx) = mpsc::unbounded_channel::<State>();

        (
            StateStore {
                state_tx,
                service,
                service_url,
                poll_interval,
            },
            state_rx,
        )
    }
}

impl<S: ChatService> StateStore<S> {
    pub async fn main_loop(
        self,
        mut terminator: Terminator,
        mut action_rx: UnboundedReceiver<Action>,
        mut interrupt_rx: broadcast::Receiver<Interrupted>,
    ) -> anyhow::Result<Interrupted> {
        let (mut session, mut event_rx) =
            ChatSession::new(self.service, self.service_url, self.poll_interval);

        // the initial state once
        self.state_tx.send(session.state.clone())?;

        let result = loop {
            tokio::select! {
                // Apply the results of the network work as they come in
                Some(event) = event_rx.recv() => {
                    session.handle_service_event(event);
                },
                // Handle the actions coming from the UI
                // and process them to do async operations
                Some(action) = action_rx.recv() => match action {
                    Action::Exit => {
                        let _ = terminator.terminate(Interrupted::UserInt);

                        break Interrupted::UserInt;
                    },
                    action => session.handle_action(action).await,
                },
                // Catch and handle interrupt signal to gracefully shutdown
                Ok(interrupted) = interrupt_rx.recv() => {
                    break interrupted;
                }
            }

            self.state_tx.send(session.state.clone())?;
        };

        session.shutdown().await;

        Ok(result)
    }
}

/// [ChatSession] owns the [State] together with the room synchronization and the poll loop.
/// Actions and service events are applied one at a time.
struct ChatSession<S: ChatService> {
    state: State,
    service: Arc<S>,
    event_tx: UnboundedSender<ServiceEvent>,
    room_sync: RoomSync<S>,
    poll_loop: Option<PollLoop>,
    poll_interval: Duration,
}

impl<S: ChatService> ChatSession<S> {
    fn new(
        service: Arc<S>,
        service_url: String,
        poll_interval: Duration,
    ) -> (Self, UnboundedReceiver<ServiceEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel::<ServiceEvent>();

        (
            ChatSession {
                state: State::new(service_url),
                room_sync: RoomSync::new(service.clone(), event_tx.clone()),
                service,
                event_tx,
                poll_loop: None,
                poll_interval,
            },
            event_rx,
        )
    }

    async fn handle_action(&mut self, action: Action) {
        match action {
            Action::Login { login, password } => {
                self.request_session(SessionRequest::Login, command::Credentials::new(login, password))
            }
            Action::Register { login, password } => self.request_session(
                SessionRequest::Register,
                command::Credentials::new(login, password),
            ),
            Action::SelectRoom { room_id } => {
                let Some(room) = self.state.find_room(&room_id).cloned() else {
                    warn!(%room_id, "selected room is not in the directory");
                    return;
                };

                self.state.set_active_room(room.clone());
                self.room_sync.select_room(&room).await;
            }
            Action::SendMessage { content } => self.send_message(content),
            Action::OpenRoomCreation => self.state.open_room_creation(),
            Action::CloseRoomCreation => self.state.close_room_creation(),
            Action::CreateRoom { name, usernames } => self.create_room(name, usernames),
            Action::Exit => (),
        }
    }

    fn handle_service_event(&mut self, event: ServiceEvent) {
        match event {
            ServiceEvent::RoomsRefreshed(Ok(rooms)) => {
                debug!(count = rooms.len(), "room directory refreshed");
                self.state.replace_rooms(rooms);
            }
            ServiceEvent::RoomsRefreshed(Err(err)) => {
                warn!(error = %err, "could not refresh the room directory");
            }
            ServiceEvent::HistoryLoaded { token, result } => {
                if !self.room_sync.is_current(token) {
                    debug!(?token, "dropping the history of a superseded selection");
                    return;
                }

                match result {
                    Ok(messages) => self.state.replace_messages(messages),
                    Err(err) => warn!(error = %err, "could not fetch the room history"),
                }
            }
            ServiceEvent::LiveConnected { token } => {
                if self.room_sync.is_current(token) {
                    self.state.mark_live();
                }
            }
            ServiceEvent::LiveMessage { token, message } => {
                if !self.room_sync.is_current(token) {
                    debug!(?token, "dropping a message of a superseded selection");
                    return;
                }

                self.state.append_message(message);
            }
            ServiceEvent::LiveClosed { token, error } => {
                if !self.room_sync.is_current(token) {
                    return;
                }

                self.room_sync.release(token);

                let room_id = self.room_sync.active_room_id().unwrap_or_default();
                let reason = match error {
                    Some(err) => {
                        warn!(room_id, error = %err, "push channel failed");
                        err.to_string()
                    }
                    None => {
                        warn!(room_id, "push channel closed by the service");
                        String::from("closed by the service")
                    }
                };
                self.state.mark_disconnected(reason);
            }
            ServiceEvent::SessionResolved {
                request,
                login,
                result,
            } => match result {
                Ok(reply) => {
                    info!(?request, %login, reply = %reply.0, "session established");
                    self.state.process_session_result(Ok(login));
                    self.start_polling();
                }
                Err(err) => {
                    warn!(?request, error = %err, "session request failed");
                    self.state.process_session_result(Err(err.to_string()));
                }
            },
            ServiceEvent::RoomCreated { name, result } => match result {
                Ok(_) => {
                    info!(%name, "room created");
                    self.state.process_room_creation_result(Ok(name));
                    self.room_sync.refresh_rooms();
                }
                Err(err) => {
                    warn!(%name, error = %err, "could not create the room");
                    self.state.process_room_creation_result(Err(err.to_string()));
                }
            },
            ServiceEvent::MessageSent(Ok(_)) => debug!("message sent"),
            ServiceEvent::MessageSent(Err(err)) => {
                warn!(error = %err, "could not send the message");
            }
        }
    }

    fn request_session(&mut self, request: SessionRequest, credentials: command::Credentials) {
        if !credentials.is_complete() {
            debug!(?request, "ignoring incomplete credentials");
            return;
        }

        self.state.mark_session_request_start(request);

        let service = self.service.clone();
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = match request {
                SessionRequest::Login => service.login(&credentials).await,
                SessionRequest::Register => service.register(&credentials).await,
            };

            let _ = event_tx.send(ServiceEvent::SessionResolved {
                request,
                login: credentials.login,
                result,
            });
        });
    }

    fn send_message(&mut self, content: String) {
        let Some(room_id) = self.state.active_room_id() else {
            return;
        };

        let message = content.trim();
        if message.is_empty() {
            return;
        }

        let command = command::SendMessageCommand {
            message: message.to_string(),
            room_id: room_id.to_string(),
        };

        let service = self.service.clone();
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = service.send_message(&command).await;
            let _ = event_tx.send(ServiceEvent::MessageSent(result));
        });
    }

    fn create_room(&mut self, name: String, usernames: Vec<String>) {
        let command =
            command::CreateRoomCommand::from_input(&name, usernames.iter().map(String::as_str));

        if command.room.is_empty() {
            self.state
                .process_room_creation_result(Err(String::from("the room needs a name")));
            return;
        }

        self.state.mark_room_creation_start();

        let service = self.service.clone();
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = service.create_room(&command).await;
            let _ = event_tx.send(ServiceEvent::RoomCreated {
                name: command.room,
                result,
            });
        });
    }

    fn start_polling(&mut self) {
        if self.poll_loop.is_none() {
            self.poll_loop = Some(PollLoop::spawn(
                self.service.clone(),
                self.poll_interval,
                self.event_tx.clone(),
            ));
        }
    }

    async fn shutdown(&mut self) {
        self.poll_loop = None;

        if self.room_sync.has_subscription() {
            info!("closing the push channel before exiting");
        }
        self.room_sync.close().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use comms::{
        command::SendMessageCommand,
        event::{Message, Room},
    };

    use super::*;
    use crate::state_store::{test_support::FakeService, LiveStatus, SessionStatus, SyncPhase, View};

    const POLL_INTERVAL: Duration = Duration::from_secs(3);

    fn new_session(
        service: &Arc<FakeService>,
    ) -> (ChatSession<FakeService>, UnboundedReceiver<ServiceEvent>) {
        ChatSession::new(
            service.clone(),
            String::from("http://localhost:8080"),
            POLL_INTERVAL,
        )
    }

    // apply service events until the state satisfies the predicate
    async fn pump_until(
        session: &mut ChatSession<FakeService>,
        event_rx: &mut UnboundedReceiver<ServiceEvent>,
        predicate: impl Fn(&State) -> bool,
    ) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !predicate(&session.state) {
                let event = event_rx.recv().await.expect("service event channel closed");
                session.handle_service_event(event);
            }
        })
        .await
        .expect("timed out waiting for the state");
    }

    fn general_and_random() -> Vec<Room> {
        vec![Room::new("r-1", "general"), Room::new("r-2", "random")]
    }

    #[tokio::test]
    async fn test_login_opens_the_chat_page_and_loads_the_rooms() {
        let service = Arc::new(FakeService::with_rooms(general_and_random()));
        let (mut session, mut event_rx) = new_session(&service);

        session
            .handle_action(Action::Login {
                login: "alice".into(),
                password: "secret".into(),
            })
            .await;
        assert_eq!(
            session.state.session_status,
            SessionStatus::Pending {
                request: SessionRequest::Login
            }
        );

        pump_until(&mut session, &mut event_rx, |state| state.rooms_loaded).await;

        assert_eq!(session.state.view, View::Chat);
        assert_eq!(session.state.rooms, general_and_random());
        assert_eq!(session.state.sync_phase(), SyncPhase::RoomListLoaded);
    }

    #[tokio::test]
    async fn test_blank_credentials_are_not_sent() {
        let service = Arc::new(FakeService::default());
        let (mut session, _event_rx) = new_session(&service);

        session
            .handle_action(Action::Register {
                login: "  ".into(),
                password: "secret".into(),
            })
            .await;

        assert_eq!(session.state.session_status, SessionStatus::LoggedOut);
    }

    #[tokio::test]
    async fn test_failed_login_stays_on_the_auth_page() {
        let service = Arc::new(FakeService::default());
        service.fail_session.store(true, Ordering::SeqCst);
        let (mut session, mut event_rx) = new_session(&service);

        session
            .handle_action(Action::Login {
                login: "alice".into(),
                password: "secret".into(),
            })
            .await;
        pump_until(&mut session, &mut event_rx, |state| {
            matches!(state.session_status, SessionStatus::Errored { .. })
        })
        .await;

        assert_eq!(session.state.view, View::Auth);
        assert!(session.poll_loop.is_none());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_the_rendered_rooms() {
        let service = Arc::new(FakeService::default());
        let (mut session, _event_rx) = new_session(&service);
        session.handle_service_event(ServiceEvent::RoomsRefreshed(Ok(general_and_random())));

        service.fail_room_listing.store(true, Ordering::SeqCst);
        session.handle_service_event(ServiceEvent::RoomsRefreshed(service.list_rooms().await));

        assert_eq!(session.state.rooms, general_and_random());
    }

    #[tokio::test]
    async fn test_selected_room_shows_history_then_pushed_messages() {
        let service = Arc::new(FakeService::with_rooms(general_and_random()));
        service.set_history("r-1", vec!["a".into(), "b".into(), "c".into()]);
        let (mut session, mut event_rx) = new_session(&service);
        session.handle_service_event(ServiceEvent::RoomsRefreshed(Ok(general_and_random())));

        session
            .handle_action(Action::SelectRoom {
                room_id: "r-1".into(),
            })
            .await;
        assert_eq!(session.state.active_room, Some(Room::new("r-1", "general")));

        pump_until(&mut session, &mut event_rx, |state| {
            state.live_status == LiveStatus::Live
        })
        .await;
        assert_eq!(
            session.state.messages,
            vec![Message::from("a"), Message::from("b"), Message::from("c")]
        );

        service.push("r-1", "d".into());
        pump_until(&mut session, &mut event_rx, |state| state.messages.len() == 4).await;

        assert_eq!(
            session.state.messages,
            vec![
                Message::from("a"),
                Message::from("b"),
                Message::from("c"),
                Message::from("d"),
            ]
        );
    }

    #[tokio::test]
    async fn test_switching_rooms_replaces_the_view_and_the_channel() {
        let service = Arc::new(FakeService::with_rooms(general_and_random()));
        service.set_history("r-1", vec!["from general".into()]);
        service.set_history("r-2", vec!["from random".into()]);
        let (mut session, mut event_rx) = new_session(&service);
        session.handle_service_event(ServiceEvent::RoomsRefreshed(Ok(general_and_random())));

        session
            .handle_action(Action::SelectRoom {
                room_id: "r-1".into(),
            })
            .await;
        session
            .handle_action(Action::SelectRoom {
                room_id: "r-2".into(),
            })
            .await;
        pump_until(&mut session, &mut event_rx, |state| {
            state.live_status == LiveStatus::Live
        })
        .await;

        assert_eq!(session.state.active_room, Some(Room::new("r-2", "random")));
        assert_eq!(session.state.messages, vec![Message::from("from random")]);
        assert_eq!(service.open_channels.load(Ordering::SeqCst), 1);
        assert_eq!(service.max_open_channels.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_results_of_a_superseded_selection_are_dropped() {
        let service = Arc::new(FakeService::with_rooms(general_and_random()));
        service.set_history("r-1", vec!["old".into()]);
        service.set_history("r-2", vec!["new".into()]);
        service.hold_history("r-1");
        service.hold_history("r-2");
        let (mut session, mut event_rx) = new_session(&service);
        session.handle_service_event(ServiceEvent::RoomsRefreshed(Ok(general_and_random())));

        session
            .handle_action(Action::SelectRoom {
                room_id: "r-1".into(),
            })
            .await;

        // the first selection finishes its work while the store is busy elsewhere
        service.release_history("r-1");
        tokio::time::timeout(Duration::from_secs(5), async {
            while !service.subscriptions().contains(&String::from("r-1")) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("the first room never subscribed");

        session
            .handle_action(Action::SelectRoom {
                room_id: "r-2".into(),
            })
            .await;

        let mut superseded = 0;
        while let Ok(event) = event_rx.try_recv() {
            session.handle_service_event(event);
            superseded += 1;
        }

        assert!(superseded > 0);
        assert_eq!(session.state.active_room, Some(Room::new("r-2", "random")));
        assert!(session.state.messages.is_empty());
        assert_eq!(session.state.live_status, LiveStatus::Connecting);

        service.release_history("r-2");
        pump_until(&mut session, &mut event_rx, |state| {
            state.live_status == LiveStatus::Live
        })
        .await;

        assert_eq!(session.state.messages, vec![Message::from("new")]);
        assert_eq!(service.subscriptions(), vec!["r-1", "r-2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_store_publishes_nothing_until_exit() {
        let service = Arc::new(FakeService::default());
        let (store, mut state_rx) =
            StateStore::new(service, String::from("http://localhost:8080"), POLL_INTERVAL);
        let (terminator, interrupt_rx) = crate::termination::create_termination();
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let main_loop = tokio::spawn(store.main_loop(terminator, action_rx, interrupt_rx));

        assert!(state_rx.recv().await.is_some());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(state_rx.try_recv().is_err());

        action_tx.send(Action::Exit).unwrap();
        assert_eq!(main_loop.await.unwrap().unwrap(), Interrupted::UserInt);
    }

    #[tokio::test]
    async fn test_room_list_refresh_does_not_disturb_the_active_room() {
        let service = Arc::new(FakeService::with_rooms(general_and_random()));
        service.set_history("r-1", vec!["a".into()]);
        let (mut session, mut event_rx) = new_session(&service);
        session.handle_service_event(ServiceEvent::RoomsRefreshed(Ok(general_and_random())));
        session
            .handle_action(Action::SelectRoom {
                room_id: "r-1".into(),
            })
            .await;
        pump_until(&mut session, &mut event_rx, |state| {
            state.live_status == LiveStatus::Live
        })
        .await;

        session.handle_service_event(ServiceEvent::RoomsRefreshed(Ok(vec![Room::new(
            "r-3", "other",
        )])));

        assert_eq!(session.state.rooms, vec![Room::new("r-3", "other")]);
        assert_eq!(session.state.active_room, Some(Room::new("r-1", "general")));
        assert_eq!(session.state.messages, vec![Message::from("a")]);
        assert_eq!(session.state.live_status, LiveStatus::Live);
    }

    #[tokio::test]
    async fn test_push_channel_failure_disconnects_until_reselected() {
        let service = Arc::new(FakeService::with_rooms(general_and_random()));
        let (mut session, mut event_rx) = new_session(&service);
        session.handle_service_event(ServiceEvent::RoomsRefreshed(Ok(general_and_random())));
        session
            .handle_action(Action::SelectRoom {
                room_id: "r-1".into(),
            })
            .await;
        pump_until(&mut session, &mut event_rx, |state| {
            state.live_status == LiveStatus::Live
        })
        .await;

        service.fail_channel("r-1");
        pump_until(&mut session, &mut event_rx, |state| {
            state.sync_phase() == SyncPhase::RoomSelected { disconnected: true }
        })
        .await;
        assert!(!session.room_sync.has_subscription());

        session
            .handle_action(Action::SelectRoom {
                room_id: "r-1".into(),
            })
            .await;
        pump_until(&mut session, &mut event_rx, |state| {
            state.live_status == LiveStatus::Live
        })
        .await;

        assert_eq!(service.subscriptions(), vec!["r-1", "r-1"]);
    }

    #[tokio::test]
    async fn test_unknown_room_selection_is_ignored() {
        let service = Arc::new(FakeService::default());
        let (mut session, _event_rx) = new_session(&service);

        session
            .handle_action(Action::SelectRoom {
                room_id: "missing".into(),
            })
            .await;

        assert_eq!(session.state.active_room, None);
        assert!(service.subscriptions().is_empty());
    }

    #[tokio::test]
    async fn test_messages_are_sent_to_the_active_room() {
        let service = Arc::new(FakeService::with_rooms(general_and_random()));
        let (mut session, mut event_rx) = new_session(&service);
        session.handle_service_event(ServiceEvent::RoomsRefreshed(Ok(general_and_random())));

        // nothing is sent without an active room
        session
            .handle_action(Action::SendMessage {
                content: "lost".into(),
            })
            .await;

        session
            .handle_action(Action::SelectRoom {
                room_id: "r-2".into(),
            })
            .await;
        session
            .handle_action(Action::SendMessage {
                content: "   ".into(),
            })
            .await;
        session
            .handle_action(Action::SendMessage {
                content: " hello ".into(),
            })
            .await;

        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(ServiceEvent::MessageSent(result)) = event_rx.recv().await {
                    assert!(result.is_ok());
                    break;
                }
            }
        })
        .await
        .expect("timed out waiting for the message to be sent");

        assert_eq!(
            service.sent(),
            vec![SendMessageCommand {
                message: "hello".into(),
                room_id: "r-2".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_created_room_returns_to_the_chat_page_and_refreshes() {
        let service = Arc::new(FakeService::default());
        let (mut session, mut event_rx) = new_session(&service);

        session.handle_action(Action::OpenRoomCreation).await;
        assert_eq!(session.state.view, View::CreateRoom);

        session
            .handle_action(Action::CreateRoom {
                name: " team ".into(),
                usernames: vec!["alice".into(), "".into(), "bob".into()],
            })
            .await;
        pump_until(&mut session, &mut event_rx, |state| {
            state.rooms.iter().any(|room| room.name == "team")
        })
        .await;

        assert_eq!(session.state.view, View::Chat);
        assert_eq!(session.state.notice.as_deref(), Some("Room #team created"));
        assert_eq!(
            service.created(),
            vec![command::CreateRoomCommand {
                room: "team".into(),
                usernames: vec!["alice".into(), "bob".into()],
            }]
        );
    }

    #[tokio::test]
    async fn test_room_creation_needs_a_name() {
        let service = Arc::new(FakeService::default());
        let (mut session, _event_rx) = new_session(&service);
        session.handle_action(Action::OpenRoomCreation).await;

        session
            .handle_action(Action::CreateRoom {
                name: "  ".into(),
                usernames: vec!["alice".into()],
            })
            .await;

        assert_eq!(session.state.view, View::CreateRoom);
        assert!(service.created().is_empty());
    }
}
