use crossterm::event::KeyEvent;
use ratatui::{prelude::Backend, Frame};
use tokio::sync::mpsc::UnboundedSender;

use crate::state_store::{action::Action, State, View};

use self::{auth_page::AuthPage, chat_page::ChatPage, create_room_page::CreateRoomPage};

use super::components::{Component, ComponentRender};

mod auth_page;
mod chat_page;
mod create_room_page;

struct Props {
    active_page: View,
}

impl From<&State> for Props {
    fn from(state: &State) -> Self {
        Props {
            active_page: state.view,
        }
    }
}

/// Routes rendering and key presses to the page of the current [View]
pub struct AppRouter {
    props: Props,
    //
    auth_page: AuthPage,
    chat_page: ChatPage,
    create_room_page: CreateRoomPage,
}

impl AppRouter {
    fn get_active_page_component(&self) -> &dyn Component {
        match self.props.active_page {
            View::Auth => &self.auth_page,
            View::Chat => &self.chat_page,
            View::CreateRoom => &self.create_room_page,
        }
    }

    fn get_active_page_component_mut(&mut self) -> &mut dyn Component {
        match self.props.active_page {
            View::Auth => &mut self.auth_page,
            View::Chat => &mut self.chat_page,
            View::CreateRoom => &mut self.create_room_page,
        }
    }
}

impl Component for AppRouter {
    fn new(state: &State, action_tx: UnboundedSender<Action>) -> Self
    where
        Self: Sized,
    {
        AppRouter {
            props: Props::from(state),
            //
            auth_page: AuthPage::new(state, action_tx.clone()),
            chat_page: ChatPage::new(state, action_tx.clone()),
            create_room_page: CreateRoomPage::new(state, action_tx),
        }
        .move_with_state(state)
    }

    fn move_with_state(self, state: &State) -> Self
    where
        Self: Sized,
    {
        AppRouter {
            props: Props::from(state),
            //
            auth_page: self.auth_page.move_with_state(state),
            chat_page: self.chat_page.move_with_state(state),
            create_room_page: self.create_room_page.move_with_state(state),
        }
    }

    // route all functions to the active page
    fn name(&self) -> &str {
        self.get_active_page_component().name()
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        self.get_active_page_component_mut().handle_key_event(key)
    }
}

impl ComponentRender<()> for AppRouter {
    fn render<B: Backend>(&self, frame: &mut Frame<B>, props: ()) {
        match self.props.active_page {
            View::Auth => self.auth_page.render(frame, props),
            View::Chat => self.chat_page.render(frame, props),
            View::CreateRoom => self.create_room_page.render(frame, props),
        }
    }
}
