mod types;

pub use types::{LayoutError, RenderError, RenderResult, Result};
