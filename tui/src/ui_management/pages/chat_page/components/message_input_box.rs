use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    prelude::{Backend, Rect},
    style::Color,
    Frame,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    state_store::{action::Action, State},
    ui_management::components::{
        input_box::{self, InputBox},
        usage::{HasUsageInfo, UsageInfo, UsageInfoLine},
        Component, ComponentRender, SectionActivation,
    },
};

struct Props {
    /// Name of the room the messages are sent to
    active_room: Option<String>,
}

impl From<&State> for Props {
    fn from(state: &State) -> Self {
        Self {
            active_room: state.active_room.as_ref().map(|room| room.name.clone()),
        }
    }
}

pub struct MessageInputBox {
    action_tx: UnboundedSender<Action>,
    /// State Mapped MessageInputBox Props
    props: Props,
    // Internal State for the Component
    pub input_box: InputBox,
}

impl MessageInputBox {
    fn submit_message(&mut self) {
        if self.input_box.text().trim().is_empty() {
            return;
        }

        let _ = self.action_tx.send(Action::SendMessage {
            content: String::from(self.input_box.text()),
        });

        self.input_box.reset();
    }
}

impl Component for MessageInputBox {
    fn new(state: &State, action_tx: UnboundedSender<Action>) -> Self {
        Self {
            action_tx: action_tx.clone(),
            props: Props::from(state),
            //
            input_box: InputBox::new(state, action_tx),
        }
    }

    fn move_with_state(self, state: &State) -> Self
    where
        Self: Sized,
    {
        Self {
            props: Props::from(state),
            ..self
        }
    }

    fn name(&self) -> &str {
        "Message Input"
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press || self.props.active_room.is_none() {
            return;
        }

        match key.code {
            KeyCode::Enter => self.submit_message(),
            _ => self.input_box.handle_key_event(key),
        }
    }
}

impl SectionActivation for MessageInputBox {
    fn activate(&mut self) {}

    fn deactivate(&mut self) {
        self.input_box.reset();
    }
}

pub struct RenderProps {
    pub area: Rect,
    pub border_color: Color,
    pub show_cursor: bool,
}

impl ComponentRender<RenderProps> for MessageInputBox {
    fn render<B: Backend>(&self, frame: &mut Frame<B>, props: RenderProps) {
        let title = match self.props.active_room.as_ref() {
            Some(room) => format!("Message #{}", room),
            None => "Message Input".into(),
        };

        self.input_box.render(
            frame,
            input_box::RenderProps {
                title,
                area: props.area,
                border_color: props.border_color,
                show_cursor: props.show_cursor,
            },
        )
    }
}

impl HasUsageInfo for MessageInputBox {
    fn usage_info(&self) -> UsageInfo {
        if self.props.active_room.is_none() {
            UsageInfo {
                description: Some("You can not send a message until you open a room.".into()),
                lines: vec![UsageInfoLine::new(&["Esc"], "to cancel")],
            }
        } else {
            UsageInfo {
                description: Some("Type your message to send a message to the active room".into()),
                lines: vec![
                    UsageInfoLine::new(&["Esc"], "to cancel"),
                    UsageInfoLine::new(&["Enter"], "to send your message"),
                ],
            }
        }
    }
}
