use std::any::Any;
use std::marker::PhantomData;
use std::sync::mpsc::Sender;

use blake3::Hash;
use serde::Serialize;

use crate::error::RenderResult;
use crate::geometry::{AbsolutePosition, Dimensions, TerminalSize};
use crate::layout::{ComponentId, ComponentSpec};

/// Footprint handed to a view while it renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderArea {
    pub dimensions: Dimensions,
    pub margin: u16,
}

impl RenderArea {
    pub fn width(&self) -> u16 {
        self.dimensions.width
    }

    pub fn height(&self) -> u16 {
        self.dimensions.height
    }

    /// Width left once the margin is taken off both sides.
    pub fn inner_width(&self) -> u16 {
        self.dimensions
            .width
            .saturating_sub(self.margin.saturating_mul(2))
    }
}

/// Pure conversion from props to a block of text.
///
/// Implementations must be deterministic: the same props and area always
/// produce the same text. The renderer may call `render` any number of times.
pub trait View {
    /// Compared by their JSON encoding; two values are equal when they
    /// serialise to the same document. Map keys are sorted before hashing;
    /// sets serialise as sequences, so use `BTreeSet` for set-valued props.
    type Props: Serialize;

    fn render(&self, props: &Self::Props, area: &RenderArea) -> RenderResult;
}

/// [`View`] backed by a plain function or closure.
pub struct FnView<P, F> {
    render: F,
    _props: PhantomData<fn(&P)>,
}

impl<P, F> FnView<P, F>
where
    P: Serialize,
    F: Fn(&P, &RenderArea) -> RenderResult,
{
    pub fn new(render: F) -> Self {
        Self {
            render,
            _props: PhantomData,
        }
    }
}

impl<P, F> View for FnView<P, F>
where
    P: Serialize,
    F: Fn(&P, &RenderArea) -> RenderResult,
{
    type Props = P;

    fn render(&self, props: &P, area: &RenderArea) -> RenderResult {
        (self.render)(props, area)
    }
}

/// Sending half of a renderer's change queue.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    sender: Sender<ComponentId>,
}

impl ChangeNotifier {
    pub fn new(sender: Sender<ComponentId>) -> Self {
        Self { sender }
    }

    fn notify(&self, id: &ComponentId) {
        // A dropped renderer simply stops listening.
        let _ = self.sender.send(id.clone());
    }
}

// Going through `Value` sorts object keys, so map-typed props hash the same
// regardless of their iteration order.
fn fingerprint<P: Serialize>(props: &P) -> Option<Hash> {
    let value = serde_json::to_value(props).ok()?;
    serde_json::to_vec(&value)
        .ok()
        .map(|bytes| blake3::hash(&bytes))
}

/// A positioned, sized, independently redrawable text region.
pub struct Component<V: View> {
    spec: ComponentSpec,
    view: V,
    props: V::Props,
    fingerprint: Option<Hash>,
    absolute_position: Option<AbsolutePosition>,
    is_dirty: bool,
    notifier: Option<ChangeNotifier>,
}

impl<V: View> Component<V> {
    pub fn new(spec: ComponentSpec, view: V, props: V::Props) -> Self {
        let fingerprint = fingerprint(&props);
        Self {
            spec,
            view,
            props,
            fingerprint,
            absolute_position: None,
            is_dirty: true,
            notifier: None,
        }
    }

    pub fn id(&self) -> &ComponentId {
        &self.spec.id
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn spec(&self) -> &ComponentSpec {
        &self.spec
    }

    pub fn margin(&self) -> u16 {
        self.spec.margin
    }

    pub fn props(&self) -> &V::Props {
        &self.props
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn absolute_position(&self) -> Option<AbsolutePosition> {
        self.absolute_position
    }

    /// Replace the props, returning whether anything changed.
    ///
    /// Structurally equal props leave the component untouched. A change
    /// marks the component dirty and notifies the attached renderer before
    /// this call returns.
    pub fn set_props(&mut self, next: V::Props) -> bool {
        let next_hash = fingerprint(&next);
        let changed = match (self.fingerprint, next_hash) {
            (Some(current), Some(candidate)) => current != candidate,
            _ => true,
        };
        if !changed {
            return false;
        }

        self.props = next;
        self.fingerprint = next_hash;
        self.mark_dirty();
        if let Some(notifier) = self.notifier.as_ref() {
            notifier.notify(&self.spec.id);
        }
        true
    }

    /// Apply `merge` to a copy of the current props and keep the result if
    /// it differs from what is stored.
    pub fn update_props<F>(&mut self, merge: F) -> bool
    where
        V::Props: Clone,
        F: FnOnce(&mut V::Props),
    {
        let mut candidate = self.props.clone();
        merge(&mut candidate);
        self.set_props(candidate)
    }

    pub fn needs_render(&self) -> bool {
        self.is_dirty
    }

    pub fn mark_clean(&mut self) {
        self.is_dirty = false;
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    /// Cached geometry wins; otherwise size specs resolve against the given
    /// terminal size.
    pub fn actual_dimensions(&self, terminal_width: u16, terminal_height: u16) -> Dimensions {
        match self.absolute_position {
            Some(position) => position.dimensions(),
            None => Dimensions::new(
                self.spec.width.resolve(terminal_width),
                self.spec.height.resolve(terminal_height),
            ),
        }
    }

    pub fn render(&self, terminal: TerminalSize) -> RenderResult {
        let area = RenderArea {
            dimensions: self.actual_dimensions(terminal.width, terminal.height),
            margin: self.spec.margin,
        };
        self.view.render(&self.props, &area)
    }
}

impl<P, F> Component<FnView<P, F>>
where
    P: Serialize,
    F: Fn(&P, &RenderArea) -> RenderResult,
{
    pub fn from_fn(spec: ComponentSpec, props: P, render: F) -> Self {
        Self::new(spec, FnView::new(render), props)
    }
}

pub(crate) mod sealed {
    use super::ChangeNotifier;
    use crate::geometry::AbsolutePosition;

    /// Mutations reserved for the template and renderer.
    pub trait Managed {
        fn store_geometry(&mut self, position: AbsolutePosition);
        fn attach_notifier(&mut self, notifier: ChangeNotifier);
        fn is_wired(&self) -> bool;
    }
}

impl<V: View> sealed::Managed for Component<V> {
    fn store_geometry(&mut self, position: AbsolutePosition) {
        self.absolute_position = Some(position);
    }

    fn attach_notifier(&mut self, notifier: ChangeNotifier) {
        self.notifier = Some(notifier);
    }

    fn is_wired(&self) -> bool {
        self.notifier.is_some()
    }
}

/// Type-erased access to a registered component.
pub trait AnyComponent: sealed::Managed {
    fn spec(&self) -> &ComponentSpec;
    fn absolute_position(&self) -> Option<AbsolutePosition>;
    fn needs_render(&self) -> bool;
    fn mark_clean(&mut self);
    fn mark_dirty(&mut self);
    fn actual_dimensions(&self, terminal_width: u16, terminal_height: u16) -> Dimensions;
    fn render_text(&self, terminal: TerminalSize) -> RenderResult;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn id(&self) -> &ComponentId {
        &self.spec().id
    }

    fn name(&self) -> &str {
        &self.spec().name
    }
}

impl<V> AnyComponent for Component<V>
where
    V: View + 'static,
    V::Props: 'static,
{
    fn spec(&self) -> &ComponentSpec {
        &self.spec
    }

    fn absolute_position(&self) -> Option<AbsolutePosition> {
        self.absolute_position
    }

    fn needs_render(&self) -> bool {
        self.is_dirty
    }

    fn mark_clean(&mut self) {
        self.is_dirty = false;
    }

    fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    fn actual_dimensions(&self, terminal_width: u16, terminal_height: u16) -> Dimensions {
        Component::actual_dimensions(self, terminal_width, terminal_height)
    }

    fn render_text(&self, terminal: TerminalSize) -> RenderResult {
        self.render(terminal)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::sealed::Managed;
    use super::*;
    use crate::error::RenderError;
    use crate::layout::Dimension;
    use serde::Serialize;
    use std::collections::HashMap;
    use std::sync::mpsc;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Banner {
        text: String,
    }

    struct BannerView;

    impl View for BannerView {
        type Props = Banner;

        fn render(&self, props: &Banner, _area: &RenderArea) -> RenderResult {
            Ok(format!("Rendering: {}", props.text))
        }
    }

    fn banner(text: &str) -> Component<BannerView> {
        let spec = ComponentSpec::new("banner")
            .width(Dimension::Cells(100))
            .height(Dimension::Cells(100));
        Component::new(
            spec,
            BannerView,
            Banner {
                text: text.to_string(),
            },
        )
    }

    #[test]
    fn fresh_component_is_dirty() {
        let mut component = banner("initial");
        assert!(component.needs_render());
        component.mark_clean();
        assert!(!component.needs_render());
        component.mark_dirty();
        assert!(component.needs_render());
    }

    #[test]
    fn changed_props_mark_dirty_and_notify() {
        let (tx, rx) = mpsc::channel();
        let mut component = banner("initial");
        component.attach_notifier(ChangeNotifier::new(tx));
        component.mark_clean();

        assert!(component.set_props(Banner {
            text: "updated".into()
        }));
        assert_eq!(component.props().text, "updated");
        assert!(component.needs_render());
        assert_eq!(rx.try_recv().unwrap(), "banner");
    }

    #[test]
    fn equal_props_are_ignored() {
        let (tx, rx) = mpsc::channel();
        let mut component = banner("initial");
        component.attach_notifier(ChangeNotifier::new(tx));

        assert!(!component.set_props(Banner {
            text: "initial".into()
        }));
        assert!(component.needs_render());

        component.mark_clean();
        assert!(!component.update_props(|props| props.text = "initial".into()));
        assert!(!component.needs_render());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn map_props_compare_independent_of_insertion_order() {
        let view = FnView::new(|props: &HashMap<String, u32>, _area: &RenderArea| {
            Ok(format!("{}", props.len()))
        });
        let forward: HashMap<String, u32> = (0..32).map(|n| (format!("k{n}"), n)).collect();
        let backward: HashMap<String, u32> =
            (0..32).rev().map(|n| (format!("k{n}"), n)).collect();
        let mut component = Component::new(ComponentSpec::new("scores"), view, forward);
        component.mark_clean();

        assert!(!component.set_props(backward));
        assert!(!component.needs_render());
    }

    #[test]
    fn update_props_merges_into_a_copy() {
        let mut component = banner("initial");
        component.mark_clean();
        assert!(component.update_props(|props| props.text.push_str("!")));
        assert_eq!(component.props().text, "initial!");
        assert!(component.needs_render());
    }

    #[test]
    fn dimensions_resolve_cells_and_percentages() {
        let component = banner("x");
        assert_eq!(component.actual_dimensions(200, 200), Dimensions::new(100, 100));

        let spec = ComponentSpec::new("half")
            .width(Dimension::Percent(50.0))
            .height(Dimension::Percent(50.0));
        let half = Component::from_fn(spec, (), |_: &(), _| Ok(String::new()));
        assert_eq!(half.actual_dimensions(200, 200), Dimensions::new(100, 100));
    }

    #[test]
    fn cached_geometry_wins_over_terminal_size() {
        let mut component = banner("x");
        component.store_geometry(AbsolutePosition::new(10, 10, 150, 150));
        assert_eq!(component.actual_dimensions(200, 200), Dimensions::new(150, 150));
    }

    #[test]
    fn render_sees_its_own_footprint() {
        let spec = ComponentSpec::new("rule")
            .width(Dimension::Percent(10.0))
            .margin(1);
        let rule = Component::from_fn(spec, '=', |fill: &char, area: &RenderArea| {
            Ok(fill.to_string().repeat(area.inner_width() as usize))
        });
        assert_eq!(rule.render(TerminalSize::new(80, 24)).unwrap(), "======");
    }

    #[test]
    fn render_errors_surface_to_the_caller() {
        let failing = Component::from_fn(ComponentSpec::new("broken"), 0u8, |_, _| {
            Err(RenderError::new("no data"))
        });
        let err = failing.render(TerminalSize::new(80, 24)).unwrap_err();
        assert_eq!(err.message(), "no data");
    }
}
