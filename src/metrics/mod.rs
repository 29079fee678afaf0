use crate::logging::{LogEvent, LogFields, LogLevel};
use serde::Serialize;
use serde_json::json;

/// Counters accumulated by the renderer.
#[derive(Debug, Default, Clone)]
pub struct RenderMetrics {
    full_renders: u64,
    partial_renders: u64,
    components_drawn: u64,
    render_failures: u64,
    changes_processed: u64,
}

impl RenderMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_full_render(&mut self, drawn: usize) {
        self.full_renders = self.full_renders.saturating_add(1);
        self.components_drawn = self.components_drawn.saturating_add(drawn as u64);
    }

    pub fn record_partial_render(&mut self) {
        self.partial_renders = self.partial_renders.saturating_add(1);
        self.components_drawn = self.components_drawn.saturating_add(1);
    }

    pub fn record_failure(&mut self) {
        self.render_failures = self.render_failures.saturating_add(1);
    }

    pub fn record_changes(&mut self, count: usize) {
        if count > 0 {
            self.changes_processed = self.changes_processed.saturating_add(count as u64);
        }
    }

    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            full_renders: self.full_renders,
            partial_renders: self.partial_renders,
            components_drawn: self.components_drawn,
            render_failures: self.render_failures,
            changes_processed: self.changes_processed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricSnapshot {
    pub full_renders: u64,
    pub partial_renders: u64,
    pub components_drawn: u64,
    pub render_failures: u64,
    pub changes_processed: u64,
}

impl MetricSnapshot {
    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("full_renders".to_string(), json!(self.full_renders));
        map.insert("partial_renders".to_string(), json!(self.partial_renders));
        map.insert("components_drawn".to_string(), json!(self.components_drawn));
        map.insert("render_failures".to_string(), json!(self.render_failures));
        map.insert("changes_processed".to_string(), json!(self.changes_processed));
        map
    }

    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "render_metrics", self.as_fields())
    }
}
