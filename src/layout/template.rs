use std::collections::HashMap;
use std::marker::PhantomData;

use serde_json::json;

use crate::component::{AnyComponent, Component, View};
use crate::dimensions::TerminalDimensions;
use crate::error::{LayoutError, Result};
use crate::geometry::{AbsolutePosition, TerminalSize};
use crate::layout::{ComponentId, ComponentSpec, XPosition, YPosition};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};

const LOG_TARGET: &str = "cligrid::template";

/// Typed reference to a component registered in a [`Template`].
pub struct Handle<V> {
    index: usize,
    id: ComponentId,
    _view: PhantomData<fn() -> V>,
}

impl<V> Handle<V> {
    pub fn id(&self) -> &ComponentId {
        &self.id
    }
}

impl<V> Clone for Handle<V> {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            id: self.id.clone(),
            _view: PhantomData,
        }
    }
}

impl<V> std::fmt::Debug for Handle<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("index", &self.index)
            .field("id", &self.id)
            .finish()
    }
}

/// Ordered registry of components plus the resolver for their geometry.
///
/// Registration order is paint order for full renders.
pub struct Template {
    components: Vec<Box<dyn AnyComponent>>,
    index: HashMap<ComponentId, usize>,
    terminal: TerminalSize,
    logger: Option<Logger>,
}

impl Template {
    pub fn new(dimensions: &dyn TerminalDimensions) -> Self {
        Self::with_size(dimensions.size())
    }

    pub fn with_size(terminal: TerminalSize) -> Self {
        Self {
            components: Vec::new(),
            index: HashMap::new(),
            terminal,
            logger: None,
        }
    }

    pub fn set_logger(&mut self, logger: Option<Logger>) {
        self.logger = logger;
    }

    pub fn terminal_size(&self) -> TerminalSize {
        self.terminal
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Append a component. Ids must be unique within the template.
    pub fn add_component<V>(&mut self, component: Component<V>) -> Result<Handle<V>>
    where
        V: View + 'static,
        V::Props: 'static,
    {
        let id = component.id().clone();
        if self.index.contains_key(&id) {
            return Err(LayoutError::DuplicateId(id));
        }

        let index = self.components.len();
        self.components.push(Box::new(component));
        self.index.insert(id.clone(), index);
        Ok(Handle {
            index,
            id,
            _view: PhantomData,
        })
    }

    pub fn component<V>(&self, handle: &Handle<V>) -> Result<&Component<V>>
    where
        V: View + 'static,
        V::Props: 'static,
    {
        self.components
            .get(handle.index)
            .and_then(|entry| entry.as_any().downcast_ref::<Component<V>>())
            .filter(|component| component.id() == &handle.id)
            .ok_or_else(|| LayoutError::HandleMismatch(handle.id.clone()))
    }

    pub fn component_mut<V>(&mut self, handle: &Handle<V>) -> Result<&mut Component<V>>
    where
        V: View + 'static,
        V::Props: 'static,
    {
        self.components
            .get_mut(handle.index)
            .and_then(|entry| entry.as_any_mut().downcast_mut::<Component<V>>())
            .filter(|component| component.id() == &handle.id)
            .ok_or_else(|| LayoutError::HandleMismatch(handle.id.clone()))
    }

    pub fn get(&self, id: &str) -> Option<&dyn AnyComponent> {
        self.index
            .get(id)
            .map(|&idx| self.components[idx].as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut (dyn AnyComponent + 'static)> {
        let idx = *self.index.get(id)?;
        Some(self.components[idx].as_mut())
    }

    /// Components in registration order.
    pub fn components(&self) -> impl Iterator<Item = &dyn AnyComponent> {
        self.components.iter().map(|entry| entry.as_ref())
    }

    pub(crate) fn components_mut(
        &mut self,
    ) -> impl Iterator<Item = &mut (dyn AnyComponent + 'static)> {
        self.components.iter_mut().map(|entry| entry.as_mut())
    }

    /// Recompute and cache every component's geometry, then mark all of
    /// them dirty.
    ///
    /// The whole pass is resolved before anything is stored: on error the
    /// previously cached geometry and dirty flags are left as they were.
    pub fn update_layout(&mut self, terminal_width: u16, terminal_height: u16) -> Result<()> {
        let terminal = TerminalSize::new(terminal_width, terminal_height);
        let solved = match self.solve(terminal) {
            Ok(solved) => solved,
            Err(err) => {
                self.log(
                    LogLevel::Error,
                    "layout_failed",
                    [json_kv("error", json!(err.to_string()))],
                );
                return Err(err);
            }
        };

        self.terminal = terminal;
        for (component, position) in self.components.iter_mut().zip(solved) {
            component.store_geometry(position);
            component.mark_dirty();
        }

        self.log(
            LogLevel::Debug,
            "layout_updated",
            [
                json_kv("width", json!(terminal_width)),
                json_kv("height", json!(terminal_height)),
                json_kv("components", json!(self.components.len())),
            ],
        );
        Ok(())
    }

    /// Dry layout pass against the current terminal snapshot.
    pub fn validate(&self) -> Result<()> {
        self.solve(self.terminal).map(|_| ())
    }

    /// Resolve one component's rectangle against the current snapshot.
    pub fn resolve(&self, id: &str) -> Result<AbsolutePosition> {
        let spec = self
            .spec_of(id)
            .ok_or_else(|| LayoutError::UnknownComponent(id.to_string()))?;
        let mut visiting = Vec::new();
        self.resolve_spec(spec, self.terminal, &mut visiting)
    }

    fn solve(&self, terminal: TerminalSize) -> Result<Vec<AbsolutePosition>> {
        let mut visiting = Vec::new();
        self.components
            .iter()
            .map(|component| self.resolve_spec(component.spec(), terminal, &mut visiting))
            .collect()
    }

    fn spec_of(&self, id: &str) -> Option<&ComponentSpec> {
        self.get(id).map(|component| component.spec())
    }

    fn referenced(&self, spec: &ComponentSpec, reference: &ComponentId) -> Result<&ComponentSpec> {
        self.spec_of(reference)
            .ok_or_else(|| LayoutError::UnknownReference {
                component: spec.id.clone(),
                reference: reference.clone(),
            })
    }

    // References are re-resolved every time they are reached. `visiting`
    // holds the chain currently being resolved so cycles fail instead of
    // recursing forever.
    fn resolve_spec(
        &self,
        spec: &ComponentSpec,
        terminal: TerminalSize,
        visiting: &mut Vec<ComponentId>,
    ) -> Result<AbsolutePosition> {
        if let Some(start) = visiting.iter().position(|id| id == &spec.id) {
            let mut path = visiting[start..].to_vec();
            path.push(spec.id.clone());
            return Err(LayoutError::ReferenceCycle { path });
        }
        visiting.push(spec.id.clone());
        let resolved = self.resolve_axes(spec, terminal, visiting);
        visiting.pop();
        resolved
    }

    fn resolve_axes(
        &self,
        spec: &ComponentSpec,
        terminal: TerminalSize,
        visiting: &mut Vec<ComponentId>,
    ) -> Result<AbsolutePosition> {
        let width = spec.width.resolve(terminal.width);
        let height = spec.height.resolve(terminal.height);
        let margin = i32::from(spec.margin);

        let x = match &spec.position.x {
            XPosition::At(offset) => i32::from(*offset) + margin,
            XPosition::Right(reference) => {
                let parent = self.referenced(spec, reference)?;
                let rect = self.resolve_spec(parent, terminal, visiting)?;
                rect.x - i32::from(parent.margin) + i32::from(rect.width) + margin
            }
            XPosition::Left(reference) => {
                let parent = self.referenced(spec, reference)?;
                let rect = self.resolve_spec(parent, terminal, visiting)?;
                rect.x - i32::from(parent.margin) - i32::from(width) + margin
            }
        };

        let y = match &spec.position.y {
            YPosition::At(offset) => i32::from(*offset) + margin,
            YPosition::Bottom(reference) => {
                let parent = self.referenced(spec, reference)?;
                let rect = self.resolve_spec(parent, terminal, visiting)?;
                let parent_margin = i32::from(parent.margin);
                rect.y - parent_margin + i32::from(rect.height) + margin - parent_margin
            }
            YPosition::Top(reference) => {
                let parent = self.referenced(spec, reference)?;
                let rect = self.resolve_spec(parent, terminal, visiting)?;
                rect.y - i32::from(parent.margin) - i32::from(height) + margin
            }
        };

        Ok(AbsolutePosition::new(x, y, width, height))
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.logger.as_ref() {
            let event = event_with_fields(level, LOG_TARGET, message, fields);
            let _ = logger.log_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::RenderArea;
    use crate::dimensions::FixedDimensions;
    use crate::error::RenderResult;
    use crate::layout::Dimension;

    struct MockView;

    impl View for MockView {
        type Props = ();

        fn render(&self, _props: &(), _area: &RenderArea) -> RenderResult {
            Ok("Mock Component".to_string())
        }
    }

    fn text_component(spec: ComponentSpec) -> Component<MockView> {
        Component::new(spec, MockView, ())
    }

    fn template() -> Template {
        Template::new(&FixedDimensions::new(100, 50))
    }

    fn percent(spec: ComponentSpec, width: f64, height: f64) -> ComponentSpec {
        spec.width(Dimension::Percent(width))
            .height(Dimension::Percent(height))
    }

    #[test]
    fn starts_with_provider_dimensions() {
        let template = template();
        assert_eq!(template.terminal_size(), TerminalSize::new(100, 50));
        assert!(template.is_empty());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut template = template();
        template
            .add_component(text_component(ComponentSpec::new("comp1")))
            .unwrap();
        let err = template
            .add_component(text_component(ComponentSpec::new("comp1")))
            .unwrap_err();
        assert!(matches!(err, LayoutError::DuplicateId(id) if id == "comp1"));
        assert_eq!(template.len(), 1);
    }

    #[test]
    fn absolute_components_resolve_offsets_and_sizes() {
        let mut template = template();
        let handle = template
            .add_component(text_component(percent(
                ComponentSpec::new("comp1").at(10, 20),
                50.0,
                50.0,
            )))
            .unwrap();
        template.update_layout(100, 50).unwrap();

        let position = template.component(&handle).unwrap().absolute_position();
        assert_eq!(position, Some(AbsolutePosition::new(10, 20, 50, 25)));
    }

    #[test]
    fn relative_components_follow_their_reference() {
        let mut template = template();
        let a = template
            .add_component(text_component(percent(ComponentSpec::new("A"), 50.0, 50.0)))
            .unwrap();
        let b = template
            .add_component(text_component(percent(
                ComponentSpec::new("B").x(XPosition::Right("A".into())),
                25.0,
                25.0,
            )))
            .unwrap();
        template.update_layout(100, 50).unwrap();

        assert_eq!(
            template.component(&a).unwrap().absolute_position(),
            Some(AbsolutePosition::new(0, 0, 50, 25))
        );
        assert_eq!(
            template.component(&b).unwrap().absolute_position(),
            Some(AbsolutePosition::new(50, 0, 25, 13))
        );
    }

    #[test]
    fn margins_feed_into_every_anchor() {
        let mut template = template();
        for spec in [
            ComponentSpec::new("anchor")
                .at(20, 10)
                .width(Dimension::Cells(10))
                .height(Dimension::Cells(4))
                .margin(2),
            ComponentSpec::new("right")
                .x(XPosition::Right("anchor".into()))
                .width(Dimension::Cells(5))
                .margin(1),
            ComponentSpec::new("left")
                .x(XPosition::Left("anchor".into()))
                .width(Dimension::Cells(5))
                .margin(1),
            ComponentSpec::new("below")
                .y(YPosition::Bottom("anchor".into()))
                .height(Dimension::Cells(3))
                .margin(1),
            ComponentSpec::new("above")
                .y(YPosition::Top("anchor".into()))
                .height(Dimension::Cells(3))
                .margin(1),
        ] {
            template.add_component(text_component(spec)).unwrap();
        }
        template.update_layout(100, 50).unwrap();

        // anchor: x = 22, y = 12
        assert_eq!(template.resolve("anchor").unwrap(), AbsolutePosition::new(22, 12, 10, 4));
        // 22 - 2 + 10 + 1
        assert_eq!(template.resolve("right").unwrap().x, 31);
        // 22 - 2 - 5 + 1
        assert_eq!(template.resolve("left").unwrap().x, 16);
        // 12 - 2 + 4 + 1 - 2
        assert_eq!(template.resolve("below").unwrap().y, 13);
        // 12 - 2 - 3 + 1
        assert_eq!(template.resolve("above").unwrap().y, 8);
    }

    #[test]
    fn anchors_may_resolve_before_the_origin() {
        let mut template = template();
        template
            .add_component(text_component(ComponentSpec::new("origin").width(Dimension::Cells(4))))
            .unwrap();
        template
            .add_component(text_component(
                ComponentSpec::new("ghost")
                    .x(XPosition::Left("origin".into()))
                    .width(Dimension::Cells(6)),
            ))
            .unwrap();
        assert_eq!(template.resolve("ghost").unwrap().x, -6);
    }

    #[test]
    fn chained_references_resolve_transitively() {
        let mut template = template();
        template
            .add_component(text_component(ComponentSpec::new("a").width(Dimension::Cells(10))))
            .unwrap();
        template
            .add_component(text_component(
                ComponentSpec::new("b")
                    .x(XPosition::Right("a".into()))
                    .width(Dimension::Cells(10)),
            ))
            .unwrap();
        template
            .add_component(text_component(
                ComponentSpec::new("c")
                    .x(XPosition::Right("b".into()))
                    .y(YPosition::Bottom("a".into()))
                    .width(Dimension::Cells(10)),
            ))
            .unwrap();
        assert_eq!(template.resolve("c").unwrap(), AbsolutePosition::new(20, 1, 10, 1));
    }

    #[test]
    fn update_layout_is_idempotent_and_dirties_everything() {
        let mut template = template();
        let a = template
            .add_component(text_component(percent(ComponentSpec::new("A"), 50.0, 50.0)))
            .unwrap();
        template
            .add_component(text_component(percent(
                ComponentSpec::new("B").x(XPosition::Right("A".into())),
                25.0,
                25.0,
            )))
            .unwrap();

        template.update_layout(101, 49).unwrap();
        let first: Vec<_> = template.components().map(|c| c.absolute_position()).collect();
        for component in template.components_mut() {
            component.mark_clean();
        }

        template.update_layout(101, 49).unwrap();
        let second: Vec<_> = template.components().map(|c| c.absolute_position()).collect();
        assert_eq!(first, second);
        assert!(template.components().all(|c| c.needs_render()));
        assert_eq!(template.component(&a).unwrap().absolute_position().unwrap().width, 51);
    }

    #[test]
    fn unknown_reference_is_reported() {
        let mut template = template();
        template
            .add_component(text_component(
                ComponentSpec::new("child").x(XPosition::Right("missing".into())),
            ))
            .unwrap();
        let err = template.update_layout(100, 50).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::UnknownReference { component, reference }
                if component == "child" && reference == "missing"
        ));
        assert!(template.validate().is_err());
    }

    #[test]
    fn reference_cycles_are_reported() {
        let mut template = template();
        template
            .add_component(text_component(
                ComponentSpec::new("a").x(XPosition::Right("b".into())),
            ))
            .unwrap();
        template
            .add_component(text_component(
                ComponentSpec::new("b").y(YPosition::Bottom("a".into())),
            ))
            .unwrap();

        match template.update_layout(100, 50).unwrap_err() {
            LayoutError::ReferenceCycle { path } => {
                assert_eq!(path, vec!["a".to_string(), "b".to_string(), "a".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let mut template = template();
        template
            .add_component(text_component(
                ComponentSpec::new("loop").y(YPosition::Top("loop".into())),
            ))
            .unwrap();
        assert!(matches!(
            template.resolve("loop"),
            Err(LayoutError::ReferenceCycle { .. })
        ));
    }

    #[test]
    fn failed_pass_keeps_previous_geometry() {
        let mut template = template();
        let a = template
            .add_component(text_component(ComponentSpec::new("a").at(3, 4)))
            .unwrap();
        template.update_layout(100, 50).unwrap();
        for component in template.components_mut() {
            component.mark_clean();
        }

        template
            .add_component(text_component(
                ComponentSpec::new("orphan").x(XPosition::Left("nobody".into())),
            ))
            .unwrap();
        assert!(template.update_layout(80, 24).is_err());

        let kept = template.component(&a).unwrap();
        assert_eq!(kept.absolute_position().unwrap().x, 3);
        assert!(!kept.needs_render());
        assert_eq!(template.terminal_size(), TerminalSize::new(100, 50));
    }

    #[test]
    fn handles_from_other_templates_are_rejected() {
        let mut first = template();
        let mut second = template();
        let handle = first
            .add_component(text_component(ComponentSpec::new("shared")))
            .unwrap();
        let other = Component::from_fn(ComponentSpec::new("other"), 1u32, |n: &u32, _| Ok(n.to_string()));
        second.add_component(other).unwrap();

        assert!(matches!(
            second.component(&handle),
            Err(LayoutError::HandleMismatch(id)) if id == "shared"
        ));
    }
}
