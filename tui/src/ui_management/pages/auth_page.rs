use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{prelude::*, widgets::*, Frame};
use tokio::sync::mpsc::UnboundedSender;

use crate::state_store::{action::Action, service::SessionRequest, SessionStatus, State};
use crate::ui_management::components::{
    input_box::{self, InputBox},
    usage::{widget_usage_to_text, UsageInfo, UsageInfoLine},
    Component, ComponentRender,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Login,
    Password,
}

struct Props {
    service_url: String,
    session_status: SessionStatus,
}

impl From<&State> for Props {
    fn from(state: &State) -> Self {
        Props {
            service_url: state.service_url.clone(),
            session_status: state.session_status.clone(),
        }
    }
}

/// AuthPage logs the user in, or registers a new account, on the chat service
pub struct AuthPage {
    action_tx: UnboundedSender<Action>,
    props: Props,
    focused_field: Field,
    login_input: InputBox,
    password_input: InputBox,
}

impl AuthPage {
    fn focused_input_mut(&mut self) -> &mut InputBox {
        match self.focused_field {
            Field::Login => &mut self.login_input,
            Field::Password => &mut self.password_input,
        }
    }

    fn switch_field(&mut self) {
        self.focused_field = match self.focused_field {
            Field::Login => Field::Password,
            Field::Password => Field::Login,
        };
    }

    fn submit(&mut self, request: SessionRequest) {
        if matches!(self.props.session_status, SessionStatus::Pending { .. }) {
            return;
        }

        let login = String::from(self.login_input.text());
        let password = String::from(self.password_input.text());

        let _ = self.action_tx.send(match request {
            SessionRequest::Login => Action::Login { login, password },
            SessionRequest::Register => Action::Register { login, password },
        });
    }

    fn status_line(&self) -> Line<'static> {
        match &self.props.session_status {
            SessionStatus::LoggedOut | SessionStatus::Authenticated { .. } => Line::from(""),
            SessionStatus::Pending {
                request: SessionRequest::Login,
            } => Line::from("Logging in...".italic()),
            SessionStatus::Pending {
                request: SessionRequest::Register,
            } => Line::from("Registering...".italic()),
            SessionStatus::Errored { err } => Line::from(Span::styled(
                format!("Failed: {}", err),
                Style::default().fg(Color::Red),
            )),
        }
    }

    fn usage_info(&self) -> UsageInfo {
        UsageInfo {
            description: None,
            lines: vec![
                UsageInfoLine::new(&["Tab"], "to switch fields"),
                UsageInfoLine::new(&["Enter"], "to log in"),
                UsageInfoLine::new(&["Ctrl+r"], "to register"),
                UsageInfoLine::new(&["Esc", "Ctrl+c"], "to exit"),
            ],
        }
    }
}

impl Component for AuthPage {
    fn new(state: &State, action_tx: UnboundedSender<Action>) -> Self
    where
        Self: Sized,
    {
        AuthPage {
            action_tx: action_tx.clone(),
            props: Props::from(state),
            focused_field: Field::Login,
            login_input: InputBox::new(state, action_tx.clone()),
            password_input: InputBox::new(state, action_tx).masked(),
        }
        .move_with_state(state)
    }

    fn move_with_state(self, state: &State) -> Self
    where
        Self: Sized,
    {
        AuthPage {
            props: Props::from(state),
            ..self
        }
    }

    fn name(&self) -> &str {
        "Auth Page"
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        match key.code {
            KeyCode::Esc => {
                let _ = self.action_tx.send(Action::Exit);
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                let _ = self.action_tx.send(Action::Exit);
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.submit(SessionRequest::Register);
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => self.switch_field(),
            KeyCode::Enter => self.submit(SessionRequest::Login),
            _ => self.focused_input_mut().handle_key_event(key),
        }
    }
}

impl ComponentRender<()> for AuthPage {
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
                    Constraint::Ratio(1, 3),
                    Constraint::Min(1),
                    Constraint::Ratio(1, 3),
                ]
                .as_ref(),
            )
            .split(vertical_centered)
        else {
            panic!("The horizontal layout should have 3 chunks")
        };

        let [container_service, container_login, container_password, container_status, container_help] =
            *Layout::default()
                .direction(Direction::Vertical)
                .constraints(
                    [
                        Constraint::Length(3),
                        Constraint::Length(3),
                        Constraint::Length(3),
                        Constraint::Length(2),
                        Constraint::Min(1),
                    ]
                    .as_ref(),
                )
                .split(both_centered)
        else {
            panic!("The form layout should have 5 chunks")
        };

        let service = Paragraph::new(Text::from(self.props.service_url.as_str()))
            .block(Block::default().borders(Borders::ALL).title("Chat Service"));
        frame.render_widget(service, container_service);

        let border_color = |field: Field| {
            if self.focused_field == field {
                Color::Yellow
            } else {
                Color::Reset
            }
        };

        self.login_input.render(
            frame,
            input_box::RenderProps {
                title: "Login".into(),
                area: container_login,
                border_color: border_color(Field::Login),
                show_cursor: self.focused_field == Field::Login,
            },
        );
        self.password_input.render(
            frame,
            input_box::RenderProps {
                title: "Password".into(),
                area: container_password,
                border_color: border_color(Field::Password),
                show_cursor: self.focused_field == Field::Password,
            },
        );

        frame.render_widget(Paragraph::new(self.status_line()), container_status);

        let help_text = Paragraph::new(widget_usage_to_text(self.usage_info())).wrap(Wrap { trim: true });
        frame.render_widget(help_text, container_help);
    }
}
