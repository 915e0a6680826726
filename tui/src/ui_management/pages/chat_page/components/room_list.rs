use comms::event::Room;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    prelude::{Backend, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    state_store::{action::Action, State},
    ui_management::components::{
        usage::{HasUsageInfo, UsageInfo, UsageInfoLine},
        Component, ComponentRender, SectionActivation,
    },
};

struct Props {
    /// Rooms in the order the service listed them
    rooms: Vec<Room>,
    /// Id of the current active room
    active_room_id: Option<String>,
}

impl From<&State> for Props {
    fn from(state: &State) -> Self {
        Self {
            rooms: state.rooms.clone(),
            active_room_id: state.active_room_id().map(String::from),
        }
    }
}

pub struct RoomList {
    /// Sending actions to the state store
    action_tx: UnboundedSender<Action>,
    /// State Mapped RoomList Props
    props: Props,
    // Internal Component State
    /// List with optional selection and current offset
    pub list_state: ListState,
}

impl RoomList {
    fn next(&mut self) {
        if self.props.rooms.is_empty() {
            self.list_state.select(None);
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) if i + 1 < self.props.rooms.len() => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    fn previous(&mut self) {
        if self.props.rooms.is_empty() {
            self.list_state.select(None);
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) if i > 0 && i < self.props.rooms.len() => i - 1,
            Some(_) => self.props.rooms.len() - 1,
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub(super) fn rooms(&self) -> &[Room] {
        &self.props.rooms
    }

    fn get_room_idx(&self, room_id: &str) -> Option<usize> {
        self.props.rooms.iter().position(|room| room.id == room_id)
    }
}

impl Component for RoomList {
    fn new(state: &State, action_tx: UnboundedSender<Action>) -> Self {
        Self {
            action_tx,
            props: Props::from(state),
            //
            list_state: ListState::default(),
        }
    }

    fn move_with_state(mut self, state: &State) -> Self
    where
        Self: Sized,
    {
        let props = Props::from(state);

        // a refresh may shrink the list under the cursor
        if let Some(selected) = self.list_state.selected() {
            if selected >= props.rooms.len() {
                self.list_state
                    .select(props.rooms.len().checked_sub(1));
            }
        }

        Self { props, ..self }
    }

    fn name(&self) -> &str {
        "Room List"
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        match key.code {
            KeyCode::Up => {
                self.previous();
            }
            KeyCode::Down => {
                self.next();
            }
            KeyCode::Enter => {
                let Some(room) = self
                    .list_state
                    .selected()
                    .and_then(|selected_idx| self.rooms().get(selected_idx))
                else {
                    return;
                };

                let _ = self.action_tx.send(Action::SelectRoom {
                    room_id: room.id.clone(),
                });
            }
            _ => (),
        }
    }
}

impl SectionActivation for RoomList {
    fn activate(&mut self) {
        let idx = self
            .props
            .active_room_id
            .as_deref()
            .and_then(|room_id| self.get_room_idx(room_id))
            .unwrap_or(0);

        *self.list_state.offset_mut() = 0;
        self.list_state
            .select((!self.props.rooms.is_empty()).then_some(idx));
    }

    fn deactivate(&mut self) {
        *self.list_state.offset_mut() = 0;
        self.list_state.select(None);
    }
}

pub struct RenderProps {
    pub border_color: Color,
    pub area: Rect,
}

impl ComponentRender<RenderProps> for RoomList {
    fn render<B: Backend>(&self, frame: &mut Frame<B>, props: RenderProps) {
        let active_room_id = self.props.active_room_id.as_deref();
        let room_list: Vec<ListItem> = self
            .rooms()
            .iter()
            .map(|room| {
                let content = Line::from(Span::raw(format!("#{}", room.name)));

                let style = if self.list_state.selected().is_none()
                    && active_room_id == Some(room.id.as_str())
                {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };

                ListItem::new(content).style(style.bg(Color::Reset))
            })
            .collect();

        let room_list = List::new(room_list)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::new().fg(props.border_color))
                    .title(format!("Rooms ({})", self.rooms().len())),
            )
            .highlight_style(
                Style::default()
                    // yellow that would work for both dark / light modes
                    .bg(Color::Rgb(255, 223, 102))
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(">");

        let mut app_room_list_state = self.list_state.clone();
        frame.render_stateful_widget(room_list, props.area, &mut app_room_list_state);
    }
}

impl HasUsageInfo for RoomList {
    fn usage_info(&self) -> UsageInfo {
        UsageInfo {
            description: Some("Select the room to talk in".into()),
            lines: vec![
                UsageInfoLine::new(&["Esc"], "to cancel"),
                UsageInfoLine::new(&["↑", "↓"], "to navigate"),
                UsageInfoLine::new(&["Enter"], "to open the room"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    use super::*;

    fn state_with_rooms(rooms: Vec<Room>) -> State {
        let mut state = State::new("http://localhost:8080");
        state.replace_rooms(rooms);
        state
    }

    fn new_room_list(state: &State) -> (RoomList, UnboundedReceiver<Action>) {
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        (RoomList::new(state, action_tx), action_rx)
    }

    fn press(room_list: &mut RoomList, code: KeyCode) {
        room_list.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_rooms_keep_the_service_order() {
        let rooms = vec![
            Room::new("3", "zeta"),
            Room::new("1", "alpha"),
            Room::new("2", "mid"),
        ];
        let (room_list, _action_rx) = new_room_list(&state_with_rooms(rooms.clone()));

        assert_eq!(room_list.rooms(), rooms.as_slice());
    }

    #[test]
    fn test_navigation_on_an_empty_list() {
        let (mut room_list, mut action_rx) = new_room_list(&state_with_rooms(Vec::new()));

        room_list.activate();
        press(&mut room_list, KeyCode::Down);
        press(&mut room_list, KeyCode::Up);
        press(&mut room_list, KeyCode::Enter);

        assert_eq!(room_list.list_state.selected(), None);
        assert!(action_rx.try_recv().is_err());
    }

    #[test]
    fn test_enter_selects_the_highlighted_room() {
        let (mut room_list, mut action_rx) = new_room_list(&state_with_rooms(vec![
            Room::new("r-1", "general"),
            Room::new("r-2", "random"),
        ]));

        room_list.activate();
        press(&mut room_list, KeyCode::Down);
        press(&mut room_list, KeyCode::Enter);

        assert_eq!(
            action_rx.try_recv().unwrap(),
            Action::SelectRoom {
                room_id: "r-2".into()
            }
        );
    }

    #[test]
    fn test_selection_follows_a_shrinking_list() {
        let state = state_with_rooms(vec![
            Room::new("r-1", "general"),
            Room::new("r-2", "random"),
            Room::new("r-3", "other"),
        ]);
        let (mut room_list, _action_rx) = new_room_list(&state);
        room_list.activate();
        press(&mut room_list, KeyCode::Up);
        assert_eq!(room_list.list_state.selected(), Some(2));

        let room_list = room_list.move_with_state(&state_with_rooms(vec![Room::new("r-1", "general")]));

        assert_eq!(room_list.list_state.selected(), Some(0));
    }
}
