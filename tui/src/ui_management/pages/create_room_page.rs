use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{prelude::*, widgets::*, Frame};
use tokio::sync::mpsc::UnboundedSender;

use crate::state_store::{action::Action, RoomCreationStatus, State, View};
use crate::ui_management::components::{
    input_box::{self, InputBox},
    usage::{widget_usage_to_text, UsageInfo, UsageInfoLine},
    Component, ComponentRender,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Usernames,
}

struct Props {
    status: RoomCreationStatus,
}

impl From<&State> for Props {
    fn from(state: &State) -> Self {
        Props {
            status: state.room_creation_status.clone(),
        }
    }
}

/// CreateRoomPage creates a room with a name and the usernames of its members
pub struct CreateRoomPage {
    action_tx: UnboundedSender<Action>,
    props: Props,
    focused_field: Field,
    name_input: InputBox,
    /// Comma separated usernames
    usernames_input: InputBox,
}

impl CreateRoomPage {
    fn focused_input_mut(&mut self) -> &mut InputBox {
        match self.focused_field {
            Field::Name => &mut self.name_input,
            Field::Usernames => &mut self.usernames_input,
        }
    }

    fn switch_field(&mut self) {
        self.focused_field = match self.focused_field {
            Field::Name => Field::Usernames,
            Field::Usernames => Field::Name,
        };
    }

    fn submit(&mut self) {
        if self.props.status == RoomCreationStatus::Pending {
            return;
        }

        let _ = self.action_tx.send(Action::CreateRoom {
            name: String::from(self.name_input.text()),
            usernames: self
                .usernames_input
                .text()
                .split(',')
                .map(String::from)
                .collect(),
        });
    }

    fn status_line(&self) -> Line<'static> {
        match &self.props.status {
            RoomCreationStatus::Editing => Line::from(""),
            RoomCreationStatus::Pending => Line::from("Creating the room...".italic()),
            RoomCreationStatus::Errored { err } => Line::from(Span::styled(
                format!("Failed: {}", err),
                Style::default().fg(Color::Red),
            )),
        }
    }

    fn usage_info(&self) -> UsageInfo {
        UsageInfo {
            description: Some("Separate the usernames with commas".into()),
            lines: vec![
                UsageInfoLine::new(&["Tab"], "to switch fields"),
                UsageInfoLine::new(&["Enter"], "to create the room"),
                UsageInfoLine::new(&["Esc"], "to go back"),
            ],
        }
    }
}

impl Component for CreateRoomPage {
    fn new(state: &State, action_tx: UnboundedSender<Action>) -> Self
    where
        Self: Sized,
    {
        CreateRoomPage {
            action_tx: action_tx.clone(),
            props: Props::from(state),
            focused_field: Field::Name,
            name_input: InputBox::new(state, action_tx.clone()),
            usernames_input: InputBox::new(state, action_tx),
        }
        .move_with_state(state)
    }

    fn move_with_state(mut self, state: &State) -> Self
    where
        Self: Sized,
    {
        // the form starts empty every time the page is opened
        if state.view != View::CreateRoom {
            self.name_input.reset();
            self.usernames_input.reset();
            self.focused_field = Field::Name;
        }

        CreateRoomPage {
            props: Props::from(state),
            ..self
        }
    }

    fn name(&self) -> &str {
        "Create Room Page"
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        match key.code {
            KeyCode::Esc => {
                let _ = self.action_tx.send(Action::CloseRoomCreation);
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                let _ = self.action_tx.send(Action::Exit);
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => self.switch_field(),
            KeyCode::Enter => self.submit(),
            _ => self.focused_input_mut().handle_key_event(key),
        }
    }
}

impl ComponentRender<()> for CreateRoomPage {
    fn render<B: Backend>(&self, frame: &mut Frame<B>, _props: ()) {
        let [_, vertical_centered, _] = *Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                [
                    Constraint::Ratio(1, 4),
                    Constraint::Min(1),
                    Constraint::Ratio(1, 4),
                ]
                .as_ref(),
            )
            .split(frame.size())
        else {
            panic!("The main layout should have 3 chunks")
        };

        let [_, both_centered, _] = *Layout::default()
            .direction(Direction::Horizontal)
            .constraints(
                [
                    Constraint::Ratio(1, 4),
                    Constraint::Min(1),
                    Constraint::Ratio(1, 4),
                ]
                .as_ref(),
            )
            .split(vertical_centered)
        else {
            panic!("The horizontal layout should have 3 chunks")
        };

        let [container_name, container_usernames, container_status, container_help] =
            *Layout::default()
                .direction(Direction::Vertical)
                .constraints(
                    [
                        Constraint::Length(3),
                        Constraint::Length(3),
                        Constraint::Length(2),
                        Constraint::Min(1),
                    ]
                    .as_ref(),
                )
                .split(both_centered)
        else {
            panic!("The form layout should have 4 chunks")
        };

        let border_color = |field: Field| {
            if self.focused_field == field {
                Color::Yellow
            } else {
                Color::Reset
            }
        };

        self.name_input.render(
            frame,
            input_box::RenderProps {
                title: "Room Name".into(),
                area: container_name,
                border_color: border_color(Field::Name),
                show_cursor: self.focused_field == Field::Name,
            },
        );
        self.usernames_input.render(
            frame,
            input_box::RenderProps {
                title: "Members".into(),
                area: container_usernames,
                border_color: border_color(Field::Usernames),
                show_cursor: self.focused_field == Field::Usernames,
            },
        );

        frame.render_widget(Paragraph::new(self.status_line()), container_status);

        let help_text = Paragraph::new(widget_usage_to_text(self.usage_info())).wrap(Wrap { trim: true });
        frame.render_widget(help_text, container_help);
    }
}
