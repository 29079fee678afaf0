use std::io::{self, Write};

use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use serde_json::json;
use thiserror::Error;

use crate::geometry::TerminalSize;
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::render::{Renderer, TerminalBackend};
use crate::runtime::{DriverConfig, DriverFlow, TerminalEvent};
use crate::LayoutError;

const LOG_TARGET: &str = "cligrid::driver";

pub type DriverResult<T> = std::result::Result<T, DriverError>;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("render error: {0}")]
    Render(#[from] LayoutError),
    #[error("terminal error: {0}")]
    Terminal(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

type KeyHook<B> = Box<dyn FnMut(&mut Renderer<B>, &KeyEvent) -> crate::Result<DriverFlow>>;

/// Terminal driver owning a [`Renderer`]: manages raw mode and the alternate
/// screen, forwards resizes and hands key presses to a caller hook.
///
/// Ctrl-C always ends the session.
pub struct CliDriver<B: TerminalBackend> {
    renderer: Renderer<B>,
    config: DriverConfig,
    on_key: Option<KeyHook<B>>,
}

impl<B: TerminalBackend> CliDriver<B> {
    pub fn new(renderer: Renderer<B>) -> Self {
        Self {
            renderer,
            config: DriverConfig::default(),
            on_key: None,
        }
    }

    pub fn with_config(mut self, config: DriverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn on_key<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut Renderer<B>, &KeyEvent) -> crate::Result<DriverFlow> + 'static,
    {
        self.on_key = Some(Box::new(hook));
        self
    }

    /// Run until the hook asks to exit; returns the renderer afterwards.
    pub fn run(mut self) -> DriverResult<Renderer<B>> {
        let mut stdout = io::stdout();
        self.enter(&mut stdout)?;
        let result = self.run_inner();
        self.exit(&mut stdout);
        result.map(|_| self.renderer)
    }

    fn run_inner(&mut self) -> DriverResult<()> {
        let (width, height) = terminal::size()?;
        self.renderer.resize(TerminalSize::new(width, height))?;
        self.log(
            LogLevel::Info,
            "driver_started",
            [
                json_kv("width", json!(width)),
                json_kv("height", json!(height)),
            ],
        );

        loop {
            if !event::poll(self.config.tick_interval)? {
                self.renderer.handle_event(&TerminalEvent::Tick)?;
                continue;
            }

            match event::read()? {
                Event::Resize(width, height) => {
                    self.renderer
                        .handle_event(&TerminalEvent::Resize(TerminalSize::new(width, height)))?;
                }
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    if is_interrupt(&key) {
                        break;
                    }
                    if let Some(hook) = self.on_key.as_mut() {
                        if hook(&mut self.renderer, &key)? == DriverFlow::Exit {
                            break;
                        }
                    }
                    self.renderer.handle_event(&TerminalEvent::Key(key))?;
                }
                _ => {}
            }
        }

        self.log(LogLevel::Info, "driver_stopped", std::iter::empty());
        Ok(())
    }

    fn enter(&self, stdout: &mut impl Write) -> DriverResult<()> {
        terminal::enable_raw_mode().map_err(|err| DriverError::Terminal(err.to_string()))?;
        execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        Ok(())
    }

    fn exit(&self, stdout: &mut impl Write) {
        execute!(stdout, Show, LeaveAlternateScreen).ok();
        terminal::disable_raw_mode().ok();
    }

    fn logger(&self) -> Option<&Logger> {
        self.renderer.config().logger.as_ref()
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.logger() {
            let _ = logger.log_event(event_with_fields(level, LOG_TARGET, message, fields));
        }
    }
}

fn is_interrupt(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}
