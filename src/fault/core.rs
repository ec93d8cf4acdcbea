use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::geometry::Size;
use crate::manifest::SlotPosition;
use crate::widget::{RenderedOutput, Widget, WidgetProps};

static FAULT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Caller-supplied sink for fault reports.
pub type ErrorCallback = Arc<dyn Fn(&FaultReport) + Send + Sync>;

/// Normalised description of one widget failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultReport {
    pub id: String,
    pub position: SlotPosition,
    pub error: String,
    pub timestamp: SystemTime,
}

impl FaultReport {
    pub(crate) fn new(position: SlotPosition, error: String) -> Self {
        let timestamp = SystemTime::now();
        let sequence = FAULT_SEQUENCE.fetch_add(1, Ordering::Relaxed) + 1;
        Self {
            id: format!("fault-{}-{}-{}", position, millis(timestamp), sequence),
            position,
            error,
            timestamp,
        }
    }

    pub fn timestamp_ms(&self) -> u128 {
        millis(self.timestamp)
    }
}

fn millis(at: SystemTime) -> u128 {
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Lifecycle of one mounted widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryState {
    Rendering,
    Ok,
    Failed(FaultReport),
    /// Dismissed after a failure; stays hidden until the slot is remounted.
    Hidden,
}

/// What the host should show for a slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotRender {
    Rendered(RenderedOutput),
    /// The widget failed. `view` is its declared fallback, if any; the host
    /// offers retry and dismiss around it.
    Failed {
        view: Option<RenderedOutput>,
        report: FaultReport,
    },
    /// Deferred widget still loading; holds the space it was allocated.
    Placeholder { footprint: Size },
    Hidden,
}

impl SlotRender {
    pub fn output(&self) -> Option<&RenderedOutput> {
        match self {
            Self::Rendered(output) => Some(output),
            Self::Failed { view, .. } => view.as_ref(),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Wraps exactly one widget's render call.
#[derive(Debug, Clone)]
pub struct FaultBoundary {
    position: SlotPosition,
    state: BoundaryState,
    failures: u64,
}

impl FaultBoundary {
    pub fn new(position: SlotPosition) -> Self {
        Self {
            position,
            state: BoundaryState::Rendering,
            failures: 0,
        }
    }

    pub fn position(&self) -> SlotPosition {
        self.position
    }

    pub fn state(&self) -> &BoundaryState {
        &self.state
    }

    /// Number of failures caught over the lifetime of this mount.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Render `widget`, catching returned errors and panics. A failed boundary
    /// keeps showing its failure view without re-running the widget until
    /// [`FaultBoundary::retry`] is called.
    pub fn render(
        &mut self,
        widget: &dyn Widget,
        props: &WidgetProps,
        on_error: Option<&ErrorCallback>,
    ) -> SlotRender {
        match &self.state {
            BoundaryState::Hidden => return SlotRender::Hidden,
            BoundaryState::Failed(report) => {
                let report = report.clone();
                return failure_view(widget, report, props);
            }
            BoundaryState::Rendering | BoundaryState::Ok => {}
        }

        self.state = BoundaryState::Rendering;
        let error = match panic::catch_unwind(AssertUnwindSafe(|| widget.render(props))) {
            Ok(Ok(output)) => {
                self.state = BoundaryState::Ok;
                return SlotRender::Rendered(output);
            }
            Ok(Err(err)) => err.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };

        let report = FaultReport::new(self.position, error);
        self.failures += 1;
        self.state = BoundaryState::Failed(report.clone());

        if let Some(callback) = on_error {
            // a panicking reporter must not escape the boundary either
            let _ = panic::catch_unwind(AssertUnwindSafe(|| callback(&report)));
        }

        failure_view(widget, report, props)
    }

    /// `failed -> rendering`. Returns `false` in any other state.
    pub fn retry(&mut self) -> bool {
        if matches!(self.state, BoundaryState::Failed(_)) {
            self.state = BoundaryState::Rendering;
            return true;
        }
        false
    }

    /// `failed -> hidden`. Returns `false` in any other state.
    pub fn dismiss(&mut self) -> bool {
        if matches!(self.state, BoundaryState::Failed(_)) {
            self.state = BoundaryState::Hidden;
            return true;
        }
        false
    }
}

fn failure_view(widget: &dyn Widget, report: FaultReport, props: &WidgetProps) -> SlotRender {
    let view = panic::catch_unwind(AssertUnwindSafe(|| widget.fallback(&report, props)))
        .ok()
        .flatten();
    SlotRender::Failed { view, report }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "widget panicked".to_string()
    }
}
