use std::io::{self, Stdout};

use anyhow::Context;
use crossterm::{
    event::{Event, EventStream, KeyEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tokio::sync::{
    broadcast,
    mpsc::{self, UnboundedReceiver},
};
use tokio_stream::StreamExt;
use tracing::{info, warn};

use crate::{
    state_store::{action::Action, State},
    Interrupted,
};

use super::{
    components::{Component, ComponentRender},
    pages::AppRouter,
};

/// What a terminal event means for the render loop
#[derive(Debug, PartialEq, Eq)]
enum TerminalInput {
    Key(KeyEvent),
    /// The screen has to be drawn again without any state change
    Resized,
    /// The terminal event stream has ended
    Closed,
    Ignored,
}

impl From<Option<io::Result<Event>>> for TerminalInput {
    fn from(maybe_event: Option<io::Result<Event>>) -> Self {
        match maybe_event {
            Some(Ok(Event::Key(key))) => TerminalInput::Key(key),
            Some(Ok(Event::Resize(..))) => TerminalInput::Resized,
            Some(Ok(_)) => TerminalInput::Ignored,
            Some(Err(err)) => {
                warn!(error = %err, "could not read the terminal events");
                TerminalInput::Ignored
            }
            None => TerminalInput::Closed,
        }
    }
}

/// Raw mode plus the alternate screen, left again when dropped so that
/// an early return or a panic still gives the shell its terminal back
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn enter() -> anyhow::Result<Self> {
        enable_raw_mode().context("could not enable raw mode")?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        Ok(Self {
            terminal: Terminal::new(CrosstermBackend::new(stdout))?,
        })
    }

    fn draw(&mut self, app_router: &AppRouter) -> anyhow::Result<()> {
        draw_router(&mut self.terminal, app_router)
    }

    fn restore(&mut self) -> io::Result<()> {
        disable_raw_mode()?;

        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;

        self.terminal.show_cursor()
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            warn!(error = %err, "could not restore the terminal");
        }
    }
}

fn draw_router<B: Backend>(terminal: &mut Terminal<B>, app_router: &AppRouter) -> anyhow::Result<()> {
    terminal
        .draw(|frame| app_router.render(frame, ()))
        .context("could not render to the terminal")?;

    Ok(())
}

pub struct UiManager {
    action_tx: mpsc::UnboundedSender<Action>,
}

impl UiManager {
    pub fn new() -> (Self, UnboundedReceiver<Action>) {
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        (Self { action_tx }, action_rx)
    }

    /// Draws the page of the latest state, redrawing only after a key press, a resize or a new state
    pub async fn main_loop(
        self,
        mut state_rx: UnboundedReceiver<State>,
        mut interrupt_rx: broadcast::Receiver<Interrupted>,
    ) -> anyhow::Result<Interrupted> {
        let mut app_router = {
            let state = state_rx
                .recv()
                .await
                .context("the state store stopped before publishing a state")?;

            AppRouter::new(&state, self.action_tx.clone())
        };

        let mut session = TerminalSession::enter()?;
        let mut terminal_events = EventStream::new();

        session.draw(&app_router)?;

        let interrupted = loop {
            tokio::select! {
                maybe_event = terminal_events.next() => match TerminalInput::from(maybe_event) {
                    TerminalInput::Key(key) => app_router.handle_key_event(key),
                    TerminalInput::Resized => (),
                    TerminalInput::Closed => break Interrupted::UserInt,
                    TerminalInput::Ignored => continue,
                },
                Some(state) = state_rx.recv() => {
                    app_router = app_router.move_with_state(&state);
                },
                Ok(interrupted) = interrupt_rx.recv() => {
                    break interrupted;
                }
            }

            session.draw(&app_router)?;
        };

        drop(session);
        info!(page = app_router.name(), ?interrupted, "ui stopped");

        Ok(interrupted)
    }
}
