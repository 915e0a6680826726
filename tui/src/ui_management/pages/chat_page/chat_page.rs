use comms::event::{Message, Room};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{prelude::*, widgets::*, Frame};
use tokio::sync::mpsc::UnboundedSender;

use crate::state_store::{action::Action, LiveStatus, SessionStatus, State, SyncPhase};
use crate::ui_management::components::{
    usage::{widget_usage_to_text, HasUsageInfo, UsageInfo, UsageInfoLine},
    Component, ComponentRender, SectionActivation,
};

use super::components::{
    message_input_box::{self, MessageInputBox},
    room_list::{self, RoomList},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Section {
    MessageInput,
    RoomList,
}

impl Section {
    fn next(self) -> Self {
        match self {
            Section::MessageInput => Section::RoomList,
            Section::RoomList => Section::MessageInput,
        }
    }
}

struct Props {
    /// The logged in user
    login: String,
    service_url: String,
    sync_phase: SyncPhase,
    active_room: Option<Room>,
    messages: Vec<Message>,
    live_status: LiveStatus,
    notice: Option<String>,
}

impl From<&State> for Props {
    fn from(state: &State) -> Self {
        Props {
            login: match &state.session_status {
                SessionStatus::Authenticated { login } => login.clone(),
                _ => String::new(),
            },
            service_url: state.service_url.clone(),
            sync_phase: state.sync_phase(),
            active_room: state.active_room.clone(),
            messages: state.messages.clone(),
            live_status: state.live_status.clone(),
            notice: state.notice.clone(),
        }
    }
}

const DEFAULT_HOVERED_SECTION: Section = Section::RoomList;

/// ChatPage shows the room directory, the messages of the active room and the message input
pub struct ChatPage {
    /// Action sender
    pub action_tx: UnboundedSender<Action>,
    /// State Mapped ChatPage Props
    props: Props,
    // Internal State
    /// Currently active section, handling input
    pub active_section: Option<Section>,
    /// Section that is currently hovered
    pub last_hovered_section: Section,
    // Child Components
    pub room_list: RoomList,
    pub message_input_box: MessageInputBox,
}

impl ChatPage {
    fn get_component_for_section(&self, section: Section) -> &dyn Component {
        match section {
            Section::MessageInput => &self.message_input_box,
            Section::RoomList => &self.room_list,
        }
    }

    fn get_component_for_section_mut(&mut self, section: Section) -> &mut dyn Component {
        match section {
            Section::MessageInput => &mut self.message_input_box,
            Section::RoomList => &mut self.room_list,
        }
    }

    fn get_section_activation_for_section(
        &mut self,
        section: Section,
    ) -> &mut dyn SectionActivation {
        match section {
            Section::MessageInput => &mut self.message_input_box,
            Section::RoomList => &mut self.room_list,
        }
    }

    fn calculate_border_color(&self, section: Section) -> Color {
        match (self.active_section, self.last_hovered_section) {
            (Some(active_section), _) if active_section == section => Color::Yellow,
            (_, last_hovered_section) if last_hovered_section == section => Color::Blue,
            _ => Color::Reset,
        }
    }

    fn disable_section(&mut self, section: Section) {
        self.get_section_activation_for_section(section)
            .deactivate();

        self.active_section = None;
    }

    fn room_title(&self) -> Line<'static> {
        let Some(room) = self.props.active_room.as_ref() else {
            return Line::from(NO_ROOM_SELECTED_MESSAGE);
        };

        let status = match &self.props.live_status {
            LiveStatus::Idle | LiveStatus::Connecting => Span::from("connecting").italic(),
            LiveStatus::Live => Span::styled("live", Style::default().fg(Color::Green)),
            LiveStatus::Disconnected { .. } => Span::styled(
                "disconnected, open the room again to reconnect",
                Style::default().fg(Color::Red),
            ),
        };

        Line::from(vec![
            "in ".into(),
            Span::from(format!("#{}", room.name)).bold(),
            " ".into(),
            status,
        ])
    }
}

impl Component for ChatPage {
    fn new(state: &State, action_tx: UnboundedSender<Action>) -> Self
    where
        Self: Sized,
    {
        ChatPage {
            action_tx: action_tx.clone(),
            // set the props
            props: Props::from(state),
            // internal component state
            active_section: Option::None,
            last_hovered_section: DEFAULT_HOVERED_SECTION,
            // child components
            room_list: RoomList::new(state, action_tx.clone()),
            message_input_box: MessageInputBox::new(state, action_tx),
        }
        .move_with_state(state)
    }

    fn move_with_state(self, state: &State) -> Self
    where
        Self: Sized,
    {
        ChatPage {
            props: Props::from(state),
            // propogate the update to the child components
            room_list: self.room_list.move_with_state(state),
            message_input_box: self.message_input_box.move_with_state(state),
            ..self
        }
    }

    fn name(&self) -> &str {
        "Chat Page"
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        match self.active_section {
            None => match key.code {
                KeyCode::Char('e') | KeyCode::Enter => {
                    let last_hovered_section = self.last_hovered_section;

                    self.active_section = Some(last_hovered_section);
                    self.get_section_activation_for_section(last_hovered_section)
                        .activate();
                }
                KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
                    self.last_hovered_section = self.last_hovered_section.next()
                }
                KeyCode::Char('n') => {
                    let _ = self.action_tx.send(Action::OpenRoomCreation);
                }
                KeyCode::Char('q') => {
                    let _ = self.action_tx.send(Action::Exit);
                }
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    let _ = self.action_tx.send(Action::Exit);
                }
                _ => {}
            },
            Some(section) => {
                self.get_component_for_section_mut(section)
                    .handle_key_event(key);

                // the room list gives the keyboard back once a room is opened
                match section {
                    Section::RoomList if key.code == KeyCode::Enter => {
                        self.disable_section(section)
                    }
                    _ if key.code == KeyCode::Esc => self.disable_section(section),
                    _ => (),
                }
            }
        }
    }
}

const NO_ROOM_SELECTED_MESSAGE: &str = "Open a room to start chatting!";

fn calculate_list_offset(height: u16, items_len: usize) -> usize {
    // go back by (container height + 2 for borders) to get the offset
    items_len.saturating_sub((height as usize).saturating_sub(2))
}

impl ComponentRender<()> for ChatPage {
    fn render<B: Backend>(&self, frame: &mut Frame<B>, _props: ()) {
        let [left, middle, right] = *Layout::default()
            .direction(Direction::Horizontal)
            .constraints(
                [
                    Constraint::Percentage(20),
                    Constraint::Percentage(60),
                    Constraint::Percentage(20),
                ]
                .as_ref(),
            )
            .split(frame.size())
        else {
            panic!("The main layout should have 3 chunks")
        };

        let [container_room_list, container_user_info] = *Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(3)].as_ref())
            .split(left)
        else {
            panic!("The left layout should have 2 chunks")
        };

        self.room_list.render(
            frame,
            room_list::RenderProps {
                border_color: self.calculate_border_color(Section::RoomList),
                area: container_room_list,
            },
        );

        let user_info = Paragraph::new(Line::from(format!("User: @{}", self.props.login)))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("User Information"),
        );
        frame.render_widget(user_info, container_user_info);

        let [container_highlight, container_messages, container_input] = *Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                [
                    Constraint::Length(3),
                    Constraint::Min(1),
                    Constraint::Length(3),
                ]
                .as_ref(),
            )
            .split(middle)
        else {
            panic!("The middle layout should have 3 chunks")
        };

        let active_room_info = Paragraph::new(Text::from(self.room_title())).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Active Room Information"),
        );
        frame.render_widget(active_room_info, container_highlight);

        let messages = if self.props.active_room.is_some() {
            let message_offset =
                calculate_list_offset(container_messages.height, self.props.messages.len());

            self.props
                .messages
                .iter()
                .skip(message_offset)
                .map(|message| ListItem::new(Line::from(Span::raw(message.to_string()))))
                .collect::<Vec<ListItem>>()
        } else {
            vec![ListItem::new(Line::from(NO_ROOM_SELECTED_MESSAGE))]
        };

        let messages =
            List::new(messages).block(Block::default().borders(Borders::ALL).title("Messages"));
        frame.render_widget(messages, container_messages);

        self.message_input_box.render(
            frame,
            message_input_box::RenderProps {
                border_color: self.calculate_border_color(Section::MessageInput),
                area: container_input,
                show_cursor: self.active_section == Some(Section::MessageInput),
            },
        );

        let [container_service_info, container_usage] = *Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(10)].as_ref())
            .split(right)
        else {
            panic!("The right layout should have 2 chunks")
        };

        let mut service_lines = vec![
            Line::from(self.props.service_url.clone()),
            Line::from(match self.props.sync_phase {
                SyncPhase::Idle => "Waiting for the room list",
                SyncPhase::RoomListLoaded => "Room list loaded",
                SyncPhase::RoomSelected {
                    disconnected: false,
                } => "Room open",
                SyncPhase::RoomSelected { disconnected: true } => "Room disconnected",
            }),
        ];
        if let LiveStatus::Disconnected { reason } = &self.props.live_status {
            service_lines.push(Line::from(Span::raw(reason.clone()).italic()));
        }
        if let Some(notice) = self.props.notice.as_ref() {
            service_lines.push(Line::from(""));
            service_lines.push(Line::from(Span::raw(notice.clone()).italic()));
        }

        let service_info = Paragraph::new(Text::from(service_lines))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Chat Service"));
        frame.render_widget(service_info, container_service_info);

        let mut usage_text: Text = widget_usage_to_text(self.usage_info());
        usage_text.patch_style(Style::default());
        let usage = Paragraph::new(usage_text)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Usage"));
        frame.render_widget(usage, container_usage);
    }
}

impl HasUsageInfo for ChatPage {
    fn usage_info(&self) -> UsageInfo {
        if let Some(section) = self.active_section {
            let handler: &dyn HasUsageInfo = match section {
                Section::RoomList => &self.room_list,
                Section::MessageInput => &self.message_input_box,
            };

            handler.usage_info()
        } else {
            UsageInfo {
                description: Some("Select a widget".into()),
                lines: vec![
                    UsageInfoLine::new(&["q"], "to exit"),
                    UsageInfoLine::new(&["←", "→"], "to hover widgets"),
                    UsageInfoLine::new(
                        &["e"],
                        format!(
                            "to activate {}",
                            self.get_component_for_section(self.last_hovered_section)
                                .name()
                        ),
                    ),
                    UsageInfoLine::new(&["n"], "to create a room"),
                ],
            }
        }
    }
}
