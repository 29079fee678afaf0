//! Terminal output: backends and the full/partial renderer.

mod backend;
mod core;

pub use backend::{AnsiBackend, BackendOp, MemoryBackend, TerminalBackend};
pub use self::core::{ClearMode, RenderReport, Renderer, RendererConfig, RendererSettings};
