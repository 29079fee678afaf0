use thiserror::Error;

use crate::layout::ComponentId;

/// Unified result type for the cligrid crate.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Output of a view's render callback.
pub type RenderResult = std::result::Result<String, RenderError>;

/// Errors surfaced by the layout resolver and renderer.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("component `{0}` is already registered")]
    DuplicateId(ComponentId),
    #[error("component `{0}` not found")]
    UnknownComponent(ComponentId),
    #[error("component `{component}` is positioned relative to unknown component `{reference}`")]
    UnknownReference {
        component: ComponentId,
        reference: ComponentId,
    },
    #[error("relative position cycle: {}", .path.join(" -> "))]
    ReferenceCycle { path: Vec<ComponentId> },
    #[error("component `{0}` has no resolved geometry; run a layout pass first")]
    StaleGeometry(ComponentId),
    #[error("handle for `{0}` does not match the registered component type")]
    HandleMismatch(ComponentId),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure reported by a component's render callback.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct RenderError {
    message: String,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_error_lists_the_path() {
        let err = LayoutError::ReferenceCycle {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "relative position cycle: a -> b -> a");
    }

    #[test]
    fn unknown_reference_names_both_components() {
        let err = LayoutError::UnknownReference {
            component: "child".into(),
            reference: "ghost".into(),
        };
        let text = err.to_string();
        assert!(text.contains("`child`"));
        assert!(text.contains("`ghost`"));
    }
}
