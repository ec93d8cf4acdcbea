use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;

/// Counters accumulated by a layout host.
#[derive(Debug, Default, Clone)]
pub struct HostMetrics {
    layout_passes: u64,
    cache_hits: u64,
    warnings: u64,
    widget_faults: u64,
    registry_changes: u64,
}

impl HostMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_layout_pass(&mut self, warning_count: usize) {
        self.layout_passes = self.layout_passes.saturating_add(1);
        self.warnings = self.warnings.saturating_add(warning_count as u64);
    }

    pub fn record_cache_hit(&mut self) {
        self.cache_hits = self.cache_hits.saturating_add(1);
    }

    pub fn record_fault(&mut self) {
        self.widget_faults = self.widget_faults.saturating_add(1);
    }

    pub fn record_registry_change(&mut self) {
        self.registry_changes = self.registry_changes.saturating_add(1);
    }

    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            layout_passes: self.layout_passes,
            cache_hits: self.cache_hits,
            warnings: self.warnings,
            widget_faults: self.widget_faults,
            registry_changes: self.registry_changes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub layout_passes: u64,
    pub cache_hits: u64,
    pub warnings: u64,
    pub widget_faults: u64,
    pub registry_changes: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "host_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("layout_passes".to_string(), json!(self.layout_passes));
        map.insert("cache_hits".to_string(), json!(self.cache_hits));
        map.insert("warnings".to_string(), json!(self.warnings));
        map.insert("widget_faults".to_string(), json!(self.widget_faults));
        map.insert("registry_changes".to_string(), json!(self.registry_changes));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let mut metrics = HostMetrics::new();
        metrics.record_layout_pass(2);
        metrics.record_layout_pass(1);
        metrics.record_cache_hit();
        metrics.record_fault();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.layout_passes, 2);
        assert_eq!(snapshot.warnings, 3);
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.widget_faults, 1);

        let event = snapshot.to_log_event("card::host.metrics");
        assert_eq!(event.message, "host_metrics");
        assert_eq!(event.fields["layout_passes"], json!(2));
    }
}
