use comms::event::{Message, Room};

use super::service::SessionRequest;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    LoggedOut,
    Pending { request: SessionRequest },
    Authenticated { login: String },
    Errored { err: String },
}

/// Status of the push channel of the active room
#[derive(Debug, Clone, PartialEq)]
pub enum LiveStatus {
    Idle,
    Connecting,
    Live,
    Disconnected { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoomCreationStatus {
    Editing,
    Pending,
    Errored { err: String },
}

/// The page the user is looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Auth,
    Chat,
    CreateRoom,
}

/// Phase of the room synchronization flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    RoomListLoaded,
    RoomSelected { disconnected: bool },
}

/// State holds the state of the application
#[derive(Debug, Clone)]
pub struct State {
    /// Base url of the chat service
    pub service_url: String,
    pub session_status: SessionStatus,
    pub view: View,
    /// Rooms of the last successful directory refresh, in the order of the service
    pub rooms: Vec<Room>,
    /// Whether the room directory has been loaded at least once
    pub rooms_loaded: bool,
    /// Currently active room
    pub active_room: Option<Room>,
    /// Messages of the active room, history first then pushed messages
    pub messages: Vec<Message>,
    pub live_status: LiveStatus,
    pub room_creation_status: RoomCreationStatus,
    /// Last informational message for the user
    pub notice: Option<String>,
}

impl State {
    pub fn new(service_url: impl Into<String>) -> Self {
        State {
            service_url: service_url.into(),
            session_status: SessionStatus::LoggedOut,
            view: View::Auth,
            rooms: Vec::new(),
            rooms_loaded: false,
            active_room: None,
            messages: Vec::new(),
            live_status: LiveStatus::Idle,
            room_creation_status: RoomCreationStatus::Editing,
            notice: None,
        }
    }

    pub fn sync_phase(&self) -> SyncPhase {
        match (&self.active_room, &self.live_status) {
            (Some(_), LiveStatus::Disconnected { .. }) => SyncPhase::RoomSelected { disconnected: true },
            (Some(_), _) => SyncPhase::RoomSelected {
                disconnected: false,
            },
            (None, _) if self.rooms_loaded => SyncPhase::RoomListLoaded,
            (None, _) => SyncPhase::Idle,
        }
    }

    pub fn mark_session_request_start(&mut self, request: SessionRequest) {
        self.session_status = SessionStatus::Pending { request };
    }

    /// Processes the result of a login or register request to change the state of the application
    pub fn process_session_result(&mut self, result: Result<String, String>) {
        match result {
            Ok(login) => {
                self.session_status = SessionStatus::Authenticated { login };
                self.view = View::Chat;
            }
            Err(err) => {
                self.session_status = SessionStatus::Errored { err };
            }
        }
    }

    /// Replaces the whole room directory, the active room and its messages are left untouched
    pub fn replace_rooms(&mut self, rooms: Vec<Room>) {
        self.rooms = rooms;
        self.rooms_loaded = true;
    }

    pub fn find_room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.iter().find(|room| room.id == room_id)
    }

    /// Switches the chat view to the given room, the messages of the previous room are dropped
    pub fn set_active_room(&mut self, room: Room) {
        self.active_room = Some(room);
        self.messages.clear();
        self.live_status = LiveStatus::Connecting;
    }

    pub fn active_room_id(&self) -> Option<&str> {
        self.active_room.as_ref().map(|room| room.id.as_str())
    }

    pub fn replace_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    pub fn append_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn mark_live(&mut self) {
        self.live_status = LiveStatus::Live;
    }

    pub fn mark_disconnected(&mut self, reason: String) {
        self.live_status = LiveStatus::Disconnected { reason };
    }

    pub fn open_room_creation(&mut self) {
        self.room_creation_status = RoomCreationStatus::Editing;
        self.view = View::CreateRoom;
    }

    pub fn close_room_creation(&mut self) {
        self.view = View::Chat;
    }

    pub fn mark_room_creation_start(&mut self) {
        self.room_creation_status = RoomCreationStatus::Pending;
    }

    /// Processes the result of a create room request, going back to the chat page on success
    pub fn process_room_creation_result(&mut self, result: Result<String, String>) {
        match result {
            Ok(name) => {
                self.room_creation_status = RoomCreationStatus::Editing;
                self.notice = Some(format!("Room #{} created", name));
                self.view = View::Chat;
            }
            Err(err) => {
                self.room_creation_status = RoomCreationStatus::Errored { err };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rooms(pairs: &[(&str, &str)]) -> Vec<Room> {
        pairs.iter().map(|(id, name)| Room::new(*id, *name)).collect()
    }

    #[test]
    fn test_replace_rooms_drops_every_previous_entry() {
        let mut state = State::new("http://localhost:8080");

        state.replace_rooms(rooms(&[("1", "general"), ("2", "random"), ("3", "old")]));
        state.replace_rooms(rooms(&[("4", "new"), ("2", "random")]));

        assert_eq!(state.rooms, rooms(&[("4", "new"), ("2", "random")]));
    }

    #[test]
    fn test_replace_rooms_keeps_the_active_room_view() {
        let mut state = State::new("http://localhost:8080");
        state.replace_rooms(rooms(&[("1", "general")]));
        state.set_active_room(Room::new("1", "general"));
        state.replace_messages(vec![Message::from("a")]);

        state.replace_rooms(rooms(&[("2", "random")]));

        assert_eq!(state.active_room, Some(Room::new("1", "general")));
        assert_eq!(state.messages, vec![Message::from("a")]);
    }

    #[test]
    fn test_append_after_history() {
        let mut state = State::new("http://localhost:8080");
        state.set_active_room(Room::new("1", "general"));
        state.replace_messages(vec!["a".into(), "b".into(), "c".into()]);

        state.append_message("d".into());

        assert_eq!(
            state.messages,
            vec![
                Message::from("a"),
                Message::from("b"),
                Message::from("c"),
                Message::from("d")
            ]
        );
    }

    #[test]
    fn test_sync_phase_transitions() {
        let mut state = State::new("http://localhost:8080");
        assert_eq!(state.sync_phase(), SyncPhase::Idle);

        state.replace_rooms(Vec::new());
        assert_eq!(state.sync_phase(), SyncPhase::RoomListLoaded);

        state.set_active_room(Room::new("1", "general"));
        state.mark_live();
        assert_eq!(
            state.sync_phase(),
            SyncPhase::RoomSelected {
                disconnected: false
            }
        );

        state.mark_disconnected("push channel transport failed".into());
        assert_eq!(
            state.sync_phase(),
            SyncPhase::RoomSelected { disconnected: true }
        );

        state.set_active_room(Room::new("2", "random"));
        assert_eq!(
            state.sync_phase(),
            SyncPhase::RoomSelected {
                disconnected: false
            }
        );
    }

    #[test]
    fn test_session_result_moves_to_the_chat_page() {
        let mut state = State::new("http://localhost:8080");

        state.mark_session_request_start(SessionRequest::Login);
        state.process_session_result(Err("login responded with status 401".into()));
        assert_eq!(state.view, View::Auth);

        state.process_session_result(Ok("alice".into()));
        assert_eq!(state.view, View::Chat);
        assert_eq!(
            state.session_status,
            SessionStatus::Authenticated {
                login: "alice".into()
            }
        );
    }
}
