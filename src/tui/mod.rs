// TUI module - the interactive configurator
//
// This module manages the terminal UI using ratatui. It handles:
// - Terminal initialization and cleanup
// - Event loop (keyboard input, timer ticks, results of background work)
// - Rendering through `views::draw`

pub mod app;
pub mod form;
pub mod layout;
pub mod overlay;
pub mod theme;
pub mod toast;
pub mod views;

use crate::api::Session;
use crate::config::Config;
use crate::logging::LogBuffer;
use anyhow::{Context, Result};
use app::{App, AppEvent};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;

/// Run the TUI until the user quits
pub async fn run(config: Config, log_buffer: LogBuffer) -> Result<()> {
    let session = Session::restore(crate::commands::token_store()?);

    let (tx, mut rx) = mpsc::channel::<AppEvent>(256);
    let mut app = App::new(&config, session, log_buffer, tx)
        .context("Failed to create backend client")?;

    // Set up terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let result = run_event_loop(&mut terminal, &mut app, &mut rx).await;
    app.shutdown();

    // Restore terminal
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to restore terminal")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

/// Main event loop
///
/// Waits on whichever comes first: terminal input, the redraw tick, or a
/// result from background work.
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    rx: &mut mpsc::Receiver<AppEvent>,
) -> Result<()> {
    let mut tick_interval = tokio::time::interval(Duration::from_millis(200));

    loop {
        terminal
            .draw(|f| views::draw(f, app))
            .context("Failed to draw terminal")?;

        tokio::select! {
            _ = async {
                if event::poll(Duration::from_millis(10)).unwrap_or(false) {
                    match event::read() {
                        Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                            app.handle_key(key)
                        }
                        Ok(Event::Mouse(mouse)) => match mouse.kind {
                            MouseEventKind::ScrollUp => app.handle_key(plain(KeyCode::Up)),
                            MouseEventKind::ScrollDown => app.handle_key(plain(KeyCode::Down)),
                            _ => {}
                        },
                        _ => {}
                    }
                }
            } => {}

            _ = tick_interval.tick() => app.tick(),

            Some(event) = rx.recv() => app.handle_event(event),
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn plain(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}
