//! Host lifecycle audit utilities.
//!
//! Lightweight instrumentation hooks so callers can observe the major
//! transitions of a `LayoutHost`. Records capture a stage identifier plus
//! structured metadata so downstream code can log, buffer, or visualise the
//! host's progression without touching the allocation path.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use serde_json::Value;

/// Distinct lifecycle checkpoints emitted by `LayoutHost`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAuditStage {
    /// A new host instance was constructed.
    HostConstructed,
    /// The card context changed.
    ContextChanged,
    /// A fresh allocation pass ran.
    LayoutComputed,
    /// Inputs were unchanged; the previous result was kept.
    LayoutReused,
    WidgetRegistered,
    WidgetUnregistered,
    /// The effective slot set differs from the previous pass.
    ActiveSlotsChanged,
    /// A widget failed while rendering.
    WidgetFaulted,
}

/// Structured audit entry.
#[derive(Debug, Clone)]
pub struct HostAuditEvent {
    pub timestamp: SystemTime,
    pub stage: HostAuditStage,
    pub details: Vec<(String, Value)>,
}

impl HostAuditEvent {
    fn new(stage: HostAuditStage) -> Self {
        Self {
            timestamp: SystemTime::now(),
            stage,
            details: Vec::new(),
        }
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
}

/// Builder helper to append fields ergonomically.
pub struct HostAuditEventBuilder {
    event: HostAuditEvent,
}

impl HostAuditEventBuilder {
    pub fn new(stage: HostAuditStage) -> Self {
        Self {
            event: HostAuditEvent::new(stage),
        }
    }

    pub fn detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.event.details.push((key.into(), value));
        self
    }

    pub fn finish(self) -> HostAuditEvent {
        self.event
    }
}

/// Trait implemented by any audit sink.
pub trait HostAudit: Send + Sync {
    fn record(&self, event: HostAuditEvent);
}

/// Default no-op implementation used when auditing is disabled.
#[derive(Debug, Default)]
pub struct NullHostAudit;

impl HostAudit for NullHostAudit {
    fn record(&self, _event: HostAuditEvent) {}
}

/// Keeps every event in memory. Cloning shares the buffer.
#[derive(Debug, Clone, Default)]
pub struct BufferedHostAudit {
    events: Arc<Mutex<Vec<HostAuditEvent>>>,
}

impl BufferedHostAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HostAuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn stages(&self) -> Vec<HostAuditStage> {
        self.events().into_iter().map(|event| event.stage).collect()
    }
}

impl HostAudit for BufferedHostAudit {
    fn record(&self, event: HostAuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
