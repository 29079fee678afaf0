//! Terminal dimension providers.
//!
//! Layout and rendering only need the current grid size. Providers are passed
//! explicitly so tests can pin the size with [`FixedDimensions`].

use std::cell::Cell;

use crossterm::terminal;

use crate::geometry::TerminalSize;

/// Size used when no terminal is attached.
pub const FALLBACK_SIZE: TerminalSize = TerminalSize::new(80, 24);

/// Reports the terminal's size in character cells.
pub trait TerminalDimensions {
    fn width(&self) -> u16;
    fn height(&self) -> u16;

    fn size(&self) -> TerminalSize {
        TerminalSize::new(self.width(), self.height())
    }
}

/// Provider backed by the real terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrosstermDimensions;

impl CrosstermDimensions {
    fn query(&self) -> TerminalSize {
        terminal::size()
            .map(|(width, height)| TerminalSize::new(width, height))
            .unwrap_or(FALLBACK_SIZE)
    }
}

impl TerminalDimensions for CrosstermDimensions {
    fn width(&self) -> u16 {
        self.query().width
    }

    fn height(&self) -> u16 {
        self.query().height
    }

    fn size(&self) -> TerminalSize {
        self.query()
    }
}

/// Provider with a caller-controlled size.
#[derive(Debug, Clone)]
pub struct FixedDimensions {
    size: Cell<TerminalSize>,
}

impl FixedDimensions {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            size: Cell::new(TerminalSize::new(width, height)),
        }
    }

    pub fn set(&self, width: u16, height: u16) {
        self.size.set(TerminalSize::new(width, height));
    }
}

impl TerminalDimensions for FixedDimensions {
    fn width(&self) -> u16 {
        self.size.get().width
    }

    fn height(&self) -> u16 {
        self.size.get().height
    }
}

/// The provider used when the caller has no preference.
pub fn default_dimensions() -> CrosstermDimensions {
    CrosstermDimensions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_dimensions_can_be_moved() {
        let dims = FixedDimensions::new(100, 50);
        assert_eq!(dims.size(), TerminalSize::new(100, 50));
        dims.set(120, 40);
        assert_eq!(dims.width(), 120);
        assert_eq!(dims.height(), 40);
    }
}
