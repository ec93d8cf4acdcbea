//! Slot allocation for card complications.
//!
//! Small widgets ("complications") attach to the perimeter of a card. Each
//! declares where it wants to live, how much room it needs and how it degrades
//! when room runs out. [`LayoutEngine`] resolves those claims against the
//! card's zones in one deterministic pass; [`LayoutHost`] keeps the inputs
//! current and renders every placed widget behind a [`FaultBoundary`].

pub mod error;
pub mod fault;
pub mod geometry;
pub mod host;
pub mod layout;
pub mod logging;
pub mod manifest;
pub mod metrics;
pub mod registry;
pub mod settings;
pub mod visibility;
pub mod widget;
pub mod width;

pub use error::{CardError, Result};
pub use fault::{BoundaryState, ErrorCallback, FaultBoundary, FaultReport, SlotRender};
pub use geometry::{Edges, Size};
pub use host::audit::{
    BufferedHostAudit, HostAudit, HostAuditEvent, HostAuditEventBuilder, HostAuditStage,
    NullHostAudit,
};
pub use host::{CardUpdate, HostConfig, LayoutHost, SlotFrame};
pub use layout::{
    Degradation, LayoutEngine, LayoutResult, LayoutZone, Placement, PlacementOutcome,
    calculate_layout, reserved_space,
};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use manifest::{
    CardContext, CardSizeTier, CardState, FallbackPolicy, FeatureFlags, Occupancy,
    PerformanceHints, SlotConfig, SlotMap, SlotPosition, WidgetManifest, ZoneId,
};
pub use metrics::{HostMetrics, MetricSnapshot};
pub use registry::{Registration, SharedRegistry, SlotRegistry};
pub use settings::{LayoutSettings, TierMetrics};
pub use visibility::{ActiveSlotsCallback, ActiveSlotsTracker, is_slot_visible, resolve_slots};
pub use widget::{CardInfo, RenderedOutput, StaticWidget, Widget, WidgetError, WidgetProps};
pub use width::{clip_to_width, display_width};
