//! Event plumbing between a host terminal and the [`Renderer`].

use std::time::Duration;

use crossterm::event::KeyEvent;

use crate::error::Result;
use crate::geometry::TerminalSize;
use crate::render::{Renderer, TerminalBackend};

pub mod driver;

/// Signals delivered to a renderer by its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    /// The terminal now has this size; triggers a full render.
    Resize(TerminalSize),
    Key(KeyEvent),
    /// Idle tick; drains any queued prop changes.
    Tick,
}

/// Whether a session keeps running after an event hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverFlow {
    Continue,
    Exit,
}

/// Configuration knobs for the event loop.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Longest wait for a terminal event before a tick is delivered.
    pub tick_interval: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(200),
        }
    }
}

/// Run a session from a fixed list of events, without a terminal.
///
/// Performs the first full render, then feeds each event to the renderer.
/// Key events go to `on_key` first; returning [`DriverFlow::Exit`] stops the
/// session.
pub fn run_scripted<B, I, F>(renderer: &mut Renderer<B>, events: I, mut on_key: F) -> Result<()>
where
    B: TerminalBackend,
    I: IntoIterator<Item = TerminalEvent>,
    F: FnMut(&mut Renderer<B>, &KeyEvent) -> Result<DriverFlow>,
{
    renderer.render()?;
    for event in events {
        if let TerminalEvent::Key(key) = &event {
            if on_key(renderer, key)? == DriverFlow::Exit {
                break;
            }
        }
        renderer.handle_event(&event)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use crate::dimensions::{FixedDimensions, TerminalDimensions};
    use crate::layout::{ComponentSpec, Dimension, Template, XPosition};
    use crate::render::MemoryBackend;
    use crossterm::event::{KeyCode, KeyModifiers};
    use serde::Serialize;

    #[derive(Debug, Clone, Serialize)]
    struct Turn {
        number: u32,
    }

    fn key(code: KeyCode) -> TerminalEvent {
        TerminalEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn scripted_session_updates_and_exits() {
        let dims = FixedDimensions::new(60, 10);
        let mut template = Template::new(&dims);
        template
            .add_component(Component::from_fn(
                ComponentSpec::new("title").width(Dimension::Cells(10)),
                (),
                |_: &(), _| Ok("KINGDOM".to_string()),
            ))
            .unwrap();
        let turn = template
            .add_component(Component::from_fn(
                ComponentSpec::new("turn")
                    .x(XPosition::Right("title".into()))
                    .width(Dimension::Percent(50.0)),
                Turn { number: 0 },
                |turn: &Turn, _| Ok(format!("Turn: {}", turn.number)),
            ))
            .unwrap();
        let mut renderer = Renderer::new(template, &dims, MemoryBackend::new(dims.size()));

        let script = vec![
            key(KeyCode::Char('n')),
            key(KeyCode::Char('n')),
            TerminalEvent::Resize(TerminalSize::new(40, 10)),
            key(KeyCode::Char('q')),
            key(KeyCode::Char('n')),
        ];
        run_scripted(&mut renderer, script, |renderer, key| match key.code {
            KeyCode::Char('q') => Ok(DriverFlow::Exit),
            _ => {
                renderer.modify(&turn, |turn| turn.number += 1)?;
                Ok(DriverFlow::Continue)
            }
        })
        .unwrap();

        assert_eq!(renderer.backend().row(0), "KINGDOM   Turn: 2");
        assert_eq!(renderer.backend().clear_count(), 2);
        let position = renderer
            .template()
            .component(&turn)
            .unwrap()
            .absolute_position()
            .unwrap();
        assert_eq!(position.width, 20);
    }
}
