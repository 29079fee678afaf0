use serde::{Deserialize, Serialize};

/// Identifier of a component, unique within one template.
pub type ComponentId = String;

/// Requested extent along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Absolute size in terminal cells.
    Cells(u16),
    /// Share of the terminal's width (horizontal) or height (vertical).
    Percent(f64),
}

impl Dimension {
    /// Resolve against a container length, rounding percentages up.
    pub fn resolve(&self, container: u16) -> u16 {
        match *self {
            Dimension::Cells(cells) => cells,
            Dimension::Percent(percent) => {
                // Multiply before dividing so whole percentages stay exact.
                let raw = (percent * f64::from(container) / 100.0).ceil();
                // Float-to-int casts saturate and map NaN to zero.
                raw as u16
            }
        }
    }
}

/// Horizontal placement of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XPosition {
    /// Cells from the left edge of the terminal.
    At(u16),
    /// Immediately to the left of the referenced component.
    Left(ComponentId),
    /// Immediately to the right of the referenced component.
    Right(ComponentId),
}

impl XPosition {
    pub fn reference(&self) -> Option<&ComponentId> {
        match self {
            XPosition::At(_) => None,
            XPosition::Left(id) | XPosition::Right(id) => Some(id),
        }
    }
}

/// Vertical placement of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YPosition {
    /// Cells from the top edge of the terminal.
    At(u16),
    /// Immediately above the referenced component.
    Top(ComponentId),
    /// Immediately below the referenced component.
    Bottom(ComponentId),
}

impl YPosition {
    pub fn reference(&self) -> Option<&ComponentId> {
        match self {
            YPosition::At(_) => None,
            YPosition::Top(id) | YPosition::Bottom(id) => Some(id),
        }
    }
}

/// Independent axis placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: XPosition,
    pub y: YPosition,
}

impl Position {
    pub const fn at(x: u16, y: u16) -> Self {
        Self {
            x: XPosition::At(x),
            y: YPosition::At(y),
        }
    }

    pub fn new(x: XPosition, y: YPosition) -> Self {
        Self { x, y }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::at(0, 0)
    }
}

/// Static description of a component: identity, placement and size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    pub id: ComponentId,
    pub name: String,
    pub position: Position,
    pub width: Dimension,
    pub height: Dimension,
    /// Cells applied on every side when computing offsets.
    pub margin: u16,
}

impl ComponentSpec {
    pub fn new(id: impl Into<ComponentId>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            position: Position::default(),
            width: Dimension::Percent(100.0),
            height: Dimension::Cells(1),
            margin: 0,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn at(mut self, x: u16, y: u16) -> Self {
        self.position = Position::at(x, y);
        self
    }

    pub fn x(mut self, x: XPosition) -> Self {
        self.position.x = x;
        self
    }

    pub fn y(mut self, y: YPosition) -> Self {
        self.position.y = y;
        self
    }

    pub fn width(mut self, width: Dimension) -> Self {
        self.width = width;
        self
    }

    pub fn height(mut self, height: Dimension) -> Self {
        self.height = height;
        self
    }

    pub fn margin(mut self, margin: u16) -> Self {
        self.margin = margin;
        self
    }

    /// Ids of the components this one is positioned against.
    pub fn references(&self) -> impl Iterator<Item = &ComponentId> {
        self.position
            .x
            .reference()
            .into_iter()
            .chain(self.position.y.reference())
    }
}
