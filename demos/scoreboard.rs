//! Scoreboard Demo
//!
//! A title bar, a turn counter and two player panels laid out with relative
//! positions. Each key press changes one component's props and only that
//! component is redrawn.
//!
//! Keys:
//! - `n`: next turn (switches the active player)
//! - `s`: score a point for the active player
//! - `q` / Ctrl-C: quit
//!
//! ```bash
//! cargo run --example scoreboard
//! ```
//!
//! Resize the terminal to watch the percentage-sized panels re-flow.

use cligrid::{
    AnsiBackend, CliDriver, Component, ComponentSpec, Dimension, DriverFlow, FileSink, Logger,
    RenderArea, RenderResult, Renderer, RendererConfig, Template, View, XPosition, YPosition,
    default_dimensions,
};
use crossterm::event::KeyCode;
use serde::Serialize;

struct TitleView;

impl View for TitleView {
    type Props = &'static str;

    fn render(&self, title: &&'static str, area: &RenderArea) -> RenderResult {
        let width = area.inner_width() as usize;
        let rule = "=".repeat(width);
        let pad = width.saturating_sub(title.len()) / 2;
        Ok(format!("{rule}\n{}{title}\n{rule}", " ".repeat(pad)))
    }
}

#[derive(Debug, Clone, Serialize)]
struct TurnInfo {
    turn: u32,
    message: String,
}

struct TurnView;

impl View for TurnView {
    type Props = TurnInfo;

    fn render(&self, info: &TurnInfo, _area: &RenderArea) -> RenderResult {
        Ok(format!("Turn: {}\n{}", info.turn, info.message))
    }
}

#[derive(Debug, Clone, Serialize)]
struct Player {
    name: String,
    score: u32,
    active: bool,
}

struct PlayerView;

impl View for PlayerView {
    type Props = Player;

    fn render(&self, player: &Player, _area: &RenderArea) -> RenderResult {
        let marker = if player.active { " * ACTIVE *" } else { "" };
        Ok(format!(
            "Player: {}{marker}\nScore: {}",
            player.name, player.score
        ))
    }
}

fn player(name: &str, active: bool) -> Player {
    Player {
        name: name.to_string(),
        score: 0,
        active,
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let dims = default_dimensions();
    let mut template = Template::new(&dims);

    template.add_component(Component::new(
        ComponentSpec::new("title")
            .name("Title")
            .width(Dimension::Percent(100.0))
            .height(Dimension::Cells(3)),
        TitleView,
        "SCOREBOARD",
    ))?;
    let turn = template.add_component(Component::new(
        ComponentSpec::new("turn")
            .name("Turn")
            .y(YPosition::Bottom("title".into()))
            .width(Dimension::Percent(100.0))
            .height(Dimension::Cells(2))
            .margin(1),
        TurnView,
        TurnInfo {
            turn: 1,
            message: "Press n for the next turn, s to score".to_string(),
        },
    ))?;
    let left = template.add_component(Component::new(
        ComponentSpec::new("player-1")
            .name("Player 1")
            .y(YPosition::Bottom("turn".into()))
            .width(Dimension::Percent(50.0))
            .height(Dimension::Cells(2))
            .margin(1),
        PlayerView,
        player("Ada", true),
    ))?;
    let right = template.add_component(Component::new(
        ComponentSpec::new("player-2")
            .name("Player 2")
            .x(XPosition::Right("player-1".into()))
            .y(YPosition::Bottom("turn".into()))
            .width(Dimension::Percent(50.0))
            .height(Dimension::Cells(2))
            .margin(1),
        PlayerView,
        player("Grace", false),
    ))?;
    template.validate()?;

    let mut config = RendererConfig::default();
    config.enable_metrics();
    if let Ok(path) = std::env::var("CLIGRID_LOG") {
        config.logger = Some(Logger::new(FileSink::new(path, 1 << 20)?));
    }
    let renderer = Renderer::with_config(template, &dims, AnsiBackend::stdout(), config);

    let renderer = CliDriver::new(renderer)
        .on_key(move |renderer, key| {
            match key.code {
                KeyCode::Char('q') => return Ok(DriverFlow::Exit),
                KeyCode::Char('n') => {
                    let first_active = renderer.template().component(&left)?.props().active;
                    renderer.modify(&left, |p| p.active = !first_active)?;
                    renderer.modify(&right, |p| p.active = first_active)?;
                    renderer.modify(&turn, |info| {
                        info.turn += 1;
                        info.message = "New turn".to_string();
                    })?;
                }
                KeyCode::Char('s') => {
                    for handle in [&left, &right] {
                        renderer.modify(handle, |p| {
                            if p.active {
                                p.score += 1;
                            }
                        })?;
                    }
                }
                _ => {}
            }
            Ok(DriverFlow::Continue)
        })
        .run()?;

    renderer.emit_metrics();
    Ok(())
}
