/// What the UI asks the state store to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Login { login: String, password: String },
    Register { login: String, password: String },
    SelectRoom { room_id: String },
    SendMessage { content: String },
    OpenRoomCreation,
    CloseRoomCreation,
    CreateRoom {
        name: String,
        usernames: Vec<String>,
    },
    Exit,
}
