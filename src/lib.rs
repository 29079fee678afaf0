//! Layout resolution and incremental redraw for rectangular text components
//! printed to a character terminal.
//!
//! Callers describe each component's size and position (in cells, as a
//! percentage of the terminal, or relative to another component) and give it
//! a [`View`] that renders props to text. A [`Template`] resolves absolute
//! coordinates; a [`Renderer`] clears and redraws everything on resize, and
//! redraws a single component when its props change.

pub mod component;
pub mod cursor;
pub mod dimensions;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod render;
pub mod runtime;
pub mod width;

pub use component::{AnyComponent, ChangeNotifier, Component, FnView, RenderArea, View};
pub use dimensions::{
    CrosstermDimensions, FixedDimensions, TerminalDimensions, default_dimensions,
};
pub use error::{LayoutError, RenderError, RenderResult, Result};
pub use geometry::{AbsolutePosition, Dimensions, TerminalSize};
pub use layout::{
    ComponentId, ComponentSpec, Dimension, Handle, Position, Template, XPosition, YPosition,
};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use metrics::{MetricSnapshot, RenderMetrics};
pub use render::{
    AnsiBackend, BackendOp, ClearMode, MemoryBackend, RenderReport, Renderer, RendererConfig,
    RendererSettings, TerminalBackend,
};
pub use runtime::driver::{CliDriver, DriverError, DriverResult};
pub use runtime::{DriverConfig, DriverFlow, TerminalEvent, run_scripted};
pub use width::display_width;
