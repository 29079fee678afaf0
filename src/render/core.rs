use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use serde_json::json;

use crate::component::{AnyComponent, ChangeNotifier, Component, View};
use crate::dimensions::TerminalDimensions;
use crate::error::{LayoutError, Result};
use crate::geometry::TerminalSize;
use crate::layout::{ComponentId, Handle, Template};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::metrics::{MetricSnapshot, RenderMetrics};
use crate::render::TerminalBackend;
use crate::runtime::TerminalEvent;
use crate::width::{skip_columns, truncate_to_width};

const LOG_TARGET: &str = "cligrid::renderer";

/// What a partial render wipes before redrawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClearMode {
    /// The component's whole resolved rectangle.
    #[default]
    Footprint,
    /// Only the resolved width of the component's top row.
    FirstRow,
}

/// Renderer runtime parameters.
#[derive(Debug, Clone, Default)]
pub struct RendererSettings {
    pub clear_mode: ClearMode,
    /// Truncate each line to the component's resolved width.
    pub clip_to_width: bool,
    /// 0-based `(column, row)` the cursor is parked on after every render.
    pub restore_cursor: Option<(u16, u16)>,
}

/// Configuration knobs for a [`Renderer`].
#[derive(Clone)]
pub struct RendererConfig {
    pub settings: RendererSettings,
    /// Optional structured logger shared with the template.
    pub logger: Option<Logger>,
    pub metrics: Option<Arc<Mutex<RenderMetrics>>>,
    /// Target field used when emitting metrics snapshots.
    pub metrics_target: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            settings: RendererSettings::default(),
            logger: None,
            metrics: None,
            metrics_target: "cligrid::renderer.metrics".to_string(),
        }
    }
}

impl RendererConfig {
    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(RenderMetrics::new())));
        }
    }

    pub fn disable_metrics(&mut self) {
        self.metrics = None;
    }

    pub fn metrics_handle(&self) -> Option<Arc<Mutex<RenderMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

/// Outcome of a full render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    pub drawn: usize,
    /// Components whose view failed and were drawn as a placeholder.
    pub failed: Vec<ComponentId>,
}

/// Draws a [`Template`] onto a terminal backend, fully or one component at a
/// time.
pub struct Renderer<B: TerminalBackend> {
    template: Template,
    backend: B,
    terminal: TerminalSize,
    config: RendererConfig,
    notifier: Sender<ComponentId>,
    changes: Receiver<ComponentId>,
}

impl<B: TerminalBackend> Renderer<B> {
    pub fn new(template: Template, dimensions: &dyn TerminalDimensions, backend: B) -> Self {
        Self::with_config(template, dimensions, backend, RendererConfig::default())
    }

    pub fn with_config(
        mut template: Template,
        dimensions: &dyn TerminalDimensions,
        backend: B,
        config: RendererConfig,
    ) -> Self {
        let (notifier, changes) = mpsc::channel();
        template.set_logger(config.logger.clone());
        let mut renderer = Self {
            template,
            backend,
            terminal: dimensions.size(),
            config,
            notifier,
            changes,
        };
        renderer.wire_components();
        renderer
    }

    pub fn terminal_size(&self) -> TerminalSize {
        self.terminal
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Direct template access. Components added here are wired for change
    /// notifications on the next full render or [`Renderer::wire_components`].
    pub fn template_mut(&mut self) -> &mut Template {
        &mut self.template
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn into_parts(self) -> (Template, B) {
        (self.template, self.backend)
    }

    /// Register a component and subscribe to its changes straight away.
    ///
    /// The component has no geometry until the next full render.
    pub fn add_component<V>(&mut self, component: Component<V>) -> Result<Handle<V>>
    where
        V: View + 'static,
        V::Props: 'static,
    {
        let handle = self.template.add_component(component)?;
        let notifier = ChangeNotifier::new(self.notifier.clone());
        if let Some(entry) = self.template.get_mut(handle.id()) {
            entry.attach_notifier(notifier);
        }
        Ok(handle)
    }

    /// Subscribe to every component that is not yet wired. Returns how many
    /// were newly wired.
    pub fn wire_components(&mut self) -> usize {
        let mut wired = 0;
        for component in self.template.components_mut() {
            if !component.is_wired() {
                component.attach_notifier(ChangeNotifier::new(self.notifier.clone()));
                wired += 1;
            }
        }
        wired
    }

    /// Clear the screen, recompute the layout and redraw every component in
    /// registration order.
    pub fn render(&mut self) -> Result<RenderReport> {
        self.wire_components();
        // Queued changes are covered by the redraw below.
        while self.changes.try_recv().is_ok() {}

        // Resolve before clearing so a bad layout leaves the screen as it was.
        self.template
            .update_layout(self.terminal.width, self.terminal.height)?;
        self.backend.clear_all()?;

        let mut report = RenderReport::default();
        let mut failures = Vec::new();
        {
            let Self {
                template,
                backend,
                terminal,
                config,
                ..
            } = self;
            for component in template.components_mut() {
                if !component.needs_render() {
                    continue;
                }
                let failure = draw_component(backend, &config.settings, *terminal, &*component)?;
                component.mark_clean();
                report.drawn += 1;
                if let Some(error) = failure {
                    report.failed.push(component.id().clone());
                    failures.push((component.id().clone(), error));
                }
            }
        }
        self.finish_frame()?;

        for (id, error) in failures {
            self.report_failure(&id, &error);
        }
        self.with_metrics(|metrics| metrics.record_full_render(report.drawn));
        self.log(
            LogLevel::Debug,
            "full_render",
            [
                json_kv("drawn", json!(report.drawn)),
                json_kv("failed", json!(report.failed.len())),
                json_kv("width", json!(self.terminal.width)),
                json_kv("height", json!(self.terminal.height)),
            ],
        );
        Ok(report)
    }

    /// Redraw a single component in place of a full-screen clear.
    ///
    /// Requires geometry from a previous layout pass.
    pub fn partial_render(&mut self, id: &str) -> Result<()> {
        let component = self
            .template
            .get(id)
            .ok_or_else(|| LayoutError::UnknownComponent(id.to_string()))?;
        let position = component
            .absolute_position()
            .ok_or_else(|| LayoutError::StaleGeometry(id.to_string()))?;

        // Clamped to the cached rectangle.
        let (rows, columns) = match self.config.settings.clear_mode {
            ClearMode::Footprint => (position.height as usize, position.width as usize),
            ClearMode::FirstRow => (1, position.width as usize),
        };
        let blank = " ".repeat(columns);
        for row in 0..rows {
            write_at(
                &mut self.backend,
                self.terminal,
                position.x,
                position.y + row as i32,
                &blank,
            )?;
        }

        let failure = draw_component(
            &mut self.backend,
            &self.config.settings,
            self.terminal,
            component,
        )?;
        if let Some(entry) = self.template.get_mut(id) {
            entry.mark_clean();
        }
        self.finish_frame()?;

        if let Some(error) = failure {
            self.report_failure(id, &error);
        }
        self.with_metrics(|metrics| metrics.record_partial_render());
        self.log(
            LogLevel::Trace,
            "partial_render",
            [json_kv("component", json!(id))],
        );
        Ok(())
    }

    /// Drain the change queue, partially rendering once per notification in
    /// arrival order.
    ///
    /// Changes to components that have never been laid out stay dirty and are
    /// picked up by the next full render.
    pub fn process_changes(&mut self) -> Result<usize> {
        let mut processed = 0;
        while let Ok(id) = self.changes.try_recv() {
            let has_geometry = match self.template.get(&id) {
                Some(component) => component.absolute_position().is_some(),
                None => continue,
            };
            if !has_geometry {
                self.log(
                    LogLevel::Debug,
                    "change_deferred",
                    [json_kv("component", json!(id))],
                );
                continue;
            }
            self.partial_render(&id)?;
            processed += 1;
        }
        self.with_metrics(|metrics| metrics.record_changes(processed));
        Ok(processed)
    }

    /// Replace a component's props and redraw it if they changed.
    pub fn update<V>(&mut self, handle: &Handle<V>, props: V::Props) -> Result<bool>
    where
        V: View + 'static,
        V::Props: 'static,
    {
        let changed = self.template.component_mut(handle)?.set_props(props);
        self.process_changes()?;
        Ok(changed)
    }

    /// Merge into a component's props and redraw it if they changed.
    pub fn modify<V, F>(&mut self, handle: &Handle<V>, merge: F) -> Result<bool>
    where
        V: View + 'static,
        V::Props: Clone + 'static,
        F: FnOnce(&mut V::Props),
    {
        let changed = self.template.component_mut(handle)?.update_props(merge);
        self.process_changes()?;
        Ok(changed)
    }

    /// React to a new terminal size with a full render.
    pub fn resize(&mut self, size: TerminalSize) -> Result<RenderReport> {
        self.terminal = size;
        self.backend.resize(size);
        self.log(
            LogLevel::Info,
            "resized",
            [
                json_kv("width", json!(size.width)),
                json_kv("height", json!(size.height)),
            ],
        );
        self.render()
    }

    pub fn handle_event(&mut self, event: &TerminalEvent) -> Result<()> {
        match event {
            TerminalEvent::Resize(size) => self.resize(*size).map(|_| ()),
            TerminalEvent::Tick => self.process_changes().map(|_| ()),
            TerminalEvent::Key(_) => Ok(()),
        }
    }

    pub fn metrics_snapshot(&self) -> Option<MetricSnapshot> {
        self.config
            .metrics
            .as_ref()
            .and_then(|metrics| metrics.lock().ok().map(|guard| guard.snapshot()))
    }

    /// Log the current metrics snapshot, if both metrics and a logger are
    /// configured.
    pub fn emit_metrics(&self) {
        if let (Some(logger), Some(snapshot)) =
            (self.config.logger.as_ref(), self.metrics_snapshot())
        {
            let _ = logger.log_event(snapshot.to_log_event(&self.config.metrics_target));
        }
    }

    fn finish_frame(&mut self) -> Result<()> {
        if let Some((column, row)) = self.config.settings.restore_cursor {
            self.backend.move_to(column, row)?;
        }
        self.backend.flush()?;
        Ok(())
    }

    fn report_failure(&self, id: &str, error: &str) {
        self.with_metrics(|metrics| metrics.record_failure());
        self.log(
            LogLevel::Warn,
            "render_failed",
            [
                json_kv("component", json!(id)),
                json_kv("error", json!(error)),
            ],
        );
    }

    fn with_metrics(&self, record: impl FnOnce(&mut RenderMetrics)) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                record(&mut *guard);
            }
        }
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref() {
            let event = event_with_fields(level, LOG_TARGET, message, fields);
            let _ = logger.log_event(event);
        }
    }
}

fn placeholder(name: &str) -> String {
    format!("[render failed: {name}]")
}

fn draw_component<B: TerminalBackend>(
    backend: &mut B,
    settings: &RendererSettings,
    terminal: TerminalSize,
    component: &dyn AnyComponent,
) -> Result<Option<String>> {
    let position = component
        .absolute_position()
        .ok_or_else(|| LayoutError::StaleGeometry(component.id().clone()))?;

    let (text, failure) = match component.render_text(terminal) {
        Ok(text) => (text, None),
        Err(err) => (placeholder(component.name()), Some(err.to_string())),
    };

    for (offset, raw) in text.split('\n').enumerate() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let line = if settings.clip_to_width {
            truncate_to_width(raw, position.width as usize)
        } else {
            raw.to_string()
        };
        write_at(backend, terminal, position.x, position.y + offset as i32, &line)?;
    }

    Ok(failure)
}

// Cells above/below the screen or left of column 0 are dropped.
fn write_at<B: TerminalBackend>(
    backend: &mut B,
    terminal: TerminalSize,
    x: i32,
    y: i32,
    text: &str,
) -> Result<()> {
    if text.is_empty() || y < 0 || y >= i32::from(terminal.height) {
        return Ok(());
    }

    let (text, column) = if x < 0 {
        let hidden = x.unsigned_abs() as usize;
        let (rest, skipped) = skip_columns(text, hidden);
        (rest, skipped.saturating_sub(hidden))
    } else {
        (text.to_string(), x as usize)
    };
    if text.is_empty() || column > u16::MAX as usize {
        return Ok(());
    }

    backend.move_to(column as u16, y as u16)?;
    backend.write_str(&text)?;
    Ok(())
}
