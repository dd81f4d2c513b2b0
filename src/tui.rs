use std::io::{self, Stdout, Write};

use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::app::App;
use crate::config::AppConfig;
use crate::error::Result;
use crate::ui;

/// Terminal features switched on for a browser session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TerminalModes {
    pub mouse_capture: bool,
}

impl TerminalModes {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            mouse_capture: config.mouse_enabled(),
        }
    }

    fn enter(&self, out: &mut impl Write) -> io::Result<()> {
        execute!(out, EnterAlternateScreen)?;
        if self.mouse_capture {
            execute!(out, EnableMouseCapture)?;
        }
        Ok(())
    }

    fn leave(&self, out: &mut impl Write) -> io::Result<()> {
        if self.mouse_capture {
            execute!(out, DisableMouseCapture)?;
        }
        execute!(out, LeaveAlternateScreen, cursor::Show)
    }
}

/// The browser's terminal session: raw mode plus the alternate screen.
///
/// The terminal is put back exactly once, by [`Tui::restore`] or on drop.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    modes: TerminalModes,
    active: bool,
}

impl Tui {
    pub fn new(modes: TerminalModes) -> Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        let terminal = match modes
            .enter(&mut stdout)
            .and_then(|()| Terminal::new(CrosstermBackend::new(stdout)))
        {
            Ok(terminal) => terminal,
            Err(err) => {
                let _ = modes.leave(&mut io::stdout());
                let _ = terminal::disable_raw_mode();
                return Err(err.into());
            }
        };
        tracing::debug!(mouse = modes.mouse_capture, "terminal session started");
        Ok(Self {
            terminal,
            modes,
            active: true,
        })
    }

    /// Render one frame of the browser.
    pub fn draw(&mut self, app: &mut App) -> Result<()> {
        self.terminal.draw(|frame| ui::render(app, frame))?;
        Ok(())
    }

    /// Leave raw mode and the alternate screen. Later calls do nothing.
    pub fn restore(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        terminal::disable_raw_mode()?;
        self.modes.leave(self.terminal.backend_mut())?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            tracing::warn!(%err, "failed to restore terminal");
        }
    }
}

/// Install a panic hook that restores the terminal before printing panic info.
pub fn install_panic_hook(modes: TerminalModes) {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = terminal::disable_raw_mode();
        let _ = modes.leave(&mut io::stdout());
        original_hook(panic_info);
    }));
}
