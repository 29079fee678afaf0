use serde::{Deserialize, Serialize};

/// Terminal grid size measured in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalSize {
    pub width: u16,
    pub height: u16,
}

impl TerminalSize {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Width and height of a component footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u16,
    pub height: u16,
}

impl Dimensions {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Resolved rectangle of a component in terminal cells.
///
/// `x`/`y` are signed: a component anchored to the left of (or above) another
/// one can start before the origin. Drawing clips whatever falls off-screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbsolutePosition {
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

impl AbsolutePosition {
    pub const fn new(x: i32, y: i32, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + i32::from(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y + i32::from(self.height)
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }
}
