use serde::{Deserialize, Serialize};

/// Login and password pair used by both the register and the login endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }

    /// The service is only asked when both fields have something besides whitespace.
    pub fn is_complete(&self) -> bool {
        !self.login.trim().is_empty() && !self.password.trim().is_empty()
    }
}

/// Command for creating a room with an initial set of members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRoomCommand {
    /// The name of the new room.
    pub room: String,
    /// Names of the users to add to the room.
    pub usernames: Vec<String>,
}

impl CreateRoomCommand {
    /// Builds the command out of raw form input, trimming every value and
    /// dropping the user names left empty.
    pub fn from_input<'a>(room: &str, usernames: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            room: room.trim().to_string(),
            usernames: usernames
                .into_iter()
                .map(str::trim)
                .filter(|username| !username.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

/// Command for sending a message to a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendMessageCommand {
    /// The content of the message.
    pub message: String,
    /// The id of the room the message goes to.
    #[serde(rename = "UUID")]
    pub room_id: String,
}
