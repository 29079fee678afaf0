//! Components: positioned, sized text regions with typed props.
//!
//! A component pairs a [`ComponentSpec`](crate::layout::ComponentSpec) with a
//! [`View`] that turns props into text. Prop changes are detected structurally
//! and announced to the renderer through a [`ChangeNotifier`].

mod core;

pub use self::core::{AnyComponent, ChangeNotifier, Component, FnView, RenderArea, View};
pub(crate) use self::core::sealed;
