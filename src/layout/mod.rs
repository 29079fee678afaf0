//! Layout module orchestrator.
//!
//! Size and position descriptions live in `spec`; the `Template` resolves them
//! into absolute terminal coordinates.

mod spec;
mod template;

pub use spec::{ComponentId, ComponentSpec, Dimension, Position, XPosition, YPosition};
pub use template::{Handle, Template};
