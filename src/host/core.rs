use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use blake3::Hash;
use serde_json::json;

use crate::error::Result;
use crate::fault::{BoundaryState, ErrorCallback, FaultBoundary, SlotRender};
use crate::geometry::Size;
use crate::layout::{LayoutEngine, LayoutResult, LayoutZone, PlacementOutcome};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::manifest::{
    CardContext, CardSizeTier, CardState, FeatureFlags, Occupancy, SlotConfig, SlotMap,
    SlotPosition, WidgetManifest, ZoneId,
};
use crate::metrics::{HostMetrics, MetricSnapshot};
use crate::registry::{Registration, SharedRegistry};
use crate::settings::LayoutSettings;
use crate::visibility::{ActiveSlotsCallback, ActiveSlotsTracker, resolve_slots};
use crate::widget::{CardInfo, Widget, WidgetProps};

use super::audit::{HostAudit, HostAuditEventBuilder, HostAuditStage, NullHostAudit};
use super::cache::{RenderCache, layout_key, render_key};

const LAYOUT_TARGET: &str = "card::layout";
const HOST_TARGET: &str = "card::host";

/// Configuration knobs for a layout host.
#[derive(Clone)]
pub struct HostConfig {
    /// Global switch; when false no widget is ever effective.
    pub enabled: bool,
    /// Expose the full zone and warning breakdown through
    /// [`LayoutHost::debug_breakdown`].
    pub debug: bool,
    pub settings: LayoutSettings,
    /// Optional diagnostic sink. Layout warnings are forwarded here.
    pub logger: Option<Logger>,
    pub metrics: Option<Arc<Mutex<HostMetrics>>>,
    pub audit: Arc<dyn HostAudit>,
    /// Receives every widget fault report.
    pub on_error: Option<ErrorCallback>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debug: false,
            settings: LayoutSettings::default(),
            logger: None,
            metrics: None,
            audit: Arc::new(NullHostAudit),
            on_error: None,
        }
    }
}

impl HostConfig {
    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(HostMetrics::new())));
        }
    }

    /// Access the shared metrics handle if metrics are enabled.
    pub fn metrics_handle(&self) -> Option<Arc<Mutex<HostMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

/// Single-field change to the card context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CardUpdate {
    /// Switch tier; dimensions follow the configured tier footprint.
    Size(CardSizeTier),
    State(CardState),
    Dimensions(Size),
    Flags(FeatureFlags),
    Description(bool),
    /// Positions the card shell requests regardless of configured widgets.
    Requested(Occupancy),
}

/// Render output for one effective slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotFrame {
    pub position: SlotPosition,
    pub widget_id: String,
    pub placement: Option<PlacementOutcome>,
    pub render: SlotRender,
}

struct Mounted {
    widget: Arc<dyn Widget>,
    boundary: FaultBoundary,
}

pub struct LayoutHost {
    config: HostConfig,
    engine: LayoutEngine,
    registry: SharedRegistry,
    context: CardContext,
    card: CardInfo,
    inline_slots: SlotMap,
    effective: SlotMap,
    manifest_ids: BTreeMap<SlotPosition, String>,
    result: LayoutResult,
    layout_key: Option<Hash>,
    seen_version: u64,
    tracker: ActiveSlotsTracker,
    mounted: BTreeMap<SlotPosition, Mounted>,
    render_cache: RenderCache,
}

impl LayoutHost {
    /// Build a host and run the first allocation pass. Fails only on a
    /// malformed context or invalid settings.
    pub fn new(registry: SharedRegistry, config: HostConfig, context: CardContext) -> Result<Self> {
        config.settings.validate()?;
        context.validate()?;

        let engine = LayoutEngine::new(config.settings.clone());
        let result = engine.calculate(&context, &[]);
        let seen_version = registry.version();
        let mut host = Self {
            config,
            engine,
            registry,
            context,
            card: CardInfo::default(),
            inline_slots: SlotMap::new(),
            effective: SlotMap::new(),
            manifest_ids: BTreeMap::new(),
            result,
            layout_key: None,
            seen_version,
            tracker: ActiveSlotsTracker::new(),
            mounted: BTreeMap::new(),
            render_cache: RenderCache::default(),
        };

        host.audit(
            HostAuditEventBuilder::new(HostAuditStage::HostConstructed)
                .detail("size", json!(context.size.as_str()))
                .detail("registry_version", json!(seen_version)),
        );
        host.recompute()?;
        Ok(host)
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn context(&self) -> &CardContext {
        &self.context
    }

    pub fn card(&self) -> &CardInfo {
        &self.card
    }

    pub fn set_card(&mut self, card: CardInfo) {
        self.card = card;
    }

    /// Register the callback fired with sorted position names whenever the
    /// effective slot set changes.
    pub fn on_active_slots_change(&mut self, callback: ActiveSlotsCallback) {
        self.tracker.set_callback(callback);
    }

    /// Replace the whole context. Returns whether a new pass ran.
    pub fn set_context(&mut self, context: CardContext) -> Result<bool> {
        context.validate()?;
        if context.state != self.context.state {
            self.card.last_state_change = Some(SystemTime::now());
        }
        self.commit_context(context)
    }

    /// Apply one field change. Returns whether a new pass ran.
    pub fn apply(&mut self, update: CardUpdate) -> Result<bool> {
        let mut next = self.context;
        match update {
            CardUpdate::Size(size) => {
                next.size = size;
                next.dimensions = self.config.settings.tier(size).dimensions;
            }
            CardUpdate::State(state) => next.state = state,
            CardUpdate::Dimensions(dimensions) => next.dimensions = dimensions,
            CardUpdate::Flags(flags) => next.flags = flags,
            CardUpdate::Description(present) => next.has_description = present,
            CardUpdate::Requested(occupancy) => next.occupancy = occupancy,
        }
        self.set_context(next)
    }

    /// Replace the caller-supplied slots. Inline slots win over registry
    /// entries for the same position.
    pub fn set_slots(&mut self, slots: SlotMap) -> Result<bool> {
        self.inline_slots = slots;
        self.recompute()
    }

    pub fn register_widget(
        &mut self,
        position: SlotPosition,
        config: SlotConfig,
    ) -> Result<Registration> {
        let registration = self.registry.register(position, config);
        self.audit(
            HostAuditEventBuilder::new(HostAuditStage::WidgetRegistered)
                .detail("position", json!(position.as_str()))
                .detail("registry_version", json!(self.registry.version())),
        );
        self.recompute()?;
        Ok(registration)
    }

    pub fn register_default_widget(
        &mut self,
        position: SlotPosition,
        config: SlotConfig,
    ) -> Result<bool> {
        self.registry.register_default(position, config);
        self.audit(
            HostAuditEventBuilder::new(HostAuditStage::WidgetRegistered)
                .detail("position", json!(position.as_str()))
                .detail("default", json!(true)),
        );
        self.recompute()
    }

    /// Remove a registration made through this host or directly on the
    /// registry. Returns whether a new pass ran.
    pub fn unregister_widget(&mut self, registration: Registration) -> Result<bool> {
        let position = registration.position();
        let removed = registration.unregister();
        self.audit(
            HostAuditEventBuilder::new(HostAuditStage::WidgetUnregistered)
                .detail("position", json!(position.as_str()))
                .detail("removed", json!(removed)),
        );
        self.recompute()
    }

    /// Pick up registry changes made elsewhere. A one-pass-late pickup is
    /// expected; callers poll this before rendering.
    pub fn refresh(&mut self) -> Result<bool> {
        if self.registry.version() == self.seen_version {
            return Ok(false);
        }
        self.recompute()
    }

    pub fn result(&self) -> &LayoutResult {
        &self.result
    }

    pub fn zone(&self, id: ZoneId) -> Option<&LayoutZone> {
        self.result.zone(id)
    }

    pub fn zone_by_name(&self, name: &str) -> Result<Option<&LayoutZone>> {
        let id: ZoneId = name.parse()?;
        Ok(self.result.zone(id))
    }

    pub fn is_placed(&self, widget_id: &str) -> bool {
        self.result.is_placed(widget_id)
    }

    pub fn is_position_placed(&self, position: SlotPosition) -> bool {
        self.manifest_ids
            .get(&position)
            .is_some_and(|id| self.result.is_placed(id))
    }

    pub fn style_vars(&self) -> &BTreeMap<String, String> {
        &self.result.style
    }

    pub fn warnings(&self) -> &[String] {
        &self.result.warnings
    }

    /// Positions that survived visibility filtering, in declaration order.
    pub fn active_positions(&self) -> Vec<SlotPosition> {
        self.effective.keys().copied().collect()
    }

    pub fn widget_id(&self, position: SlotPosition) -> Option<&str> {
        self.manifest_ids.get(&position).map(String::as_str)
    }

    /// Full zone, placement and warning breakdown. `None` unless the debug
    /// flag is set.
    pub fn debug_breakdown(&self) -> Option<serde_json::Value> {
        if !self.config.debug {
            return None;
        }
        let active: Vec<&str> = self.effective.keys().map(SlotPosition::as_str).collect();
        Some(json!({
            "context": self.context,
            "active": active,
            "layout": self.result,
            "registry_version": self.seen_version,
        }))
    }

    pub fn metrics_snapshot(&self) -> Option<MetricSnapshot> {
        let metrics = self.config.metrics.as_ref()?;
        metrics.lock().ok().map(|guard| guard.snapshot())
    }

    /// Write the current metrics snapshot to the logger, if both are configured.
    pub fn emit_metrics(&self) {
        if let (Some(logger), Some(snapshot)) = (self.config.logger.as_ref(), self.metrics_snapshot())
        {
            let _ = logger.log_event(snapshot.to_log_event("card::host.metrics"));
        }
    }

    /// Render every effective slot through its fault boundary.
    pub fn render_slots(&mut self) -> Vec<SlotFrame> {
        let slots: Vec<(SlotPosition, SlotConfig)> = self
            .effective
            .iter()
            .map(|(position, config)| (*position, config.clone()))
            .collect();

        slots
            .into_iter()
            .map(|(position, config)| self.render_slot(position, &config))
            .collect()
    }

    /// `failed -> rendering` for the widget at `position`.
    pub fn retry(&mut self, position: SlotPosition) -> bool {
        self.render_cache.evict(position);
        self.mounted
            .get_mut(&position)
            .is_some_and(|mounted| mounted.boundary.retry())
    }

    /// `failed -> permanently hidden` for the widget at `position`.
    pub fn dismiss(&mut self, position: SlotPosition) -> bool {
        self.mounted
            .get_mut(&position)
            .is_some_and(|mounted| mounted.boundary.dismiss())
    }

    pub fn boundary_state(&self, position: SlotPosition) -> Option<&BoundaryState> {
        self.mounted
            .get(&position)
            .map(|mounted| mounted.boundary.state())
    }

    fn commit_context(&mut self, context: CardContext) -> Result<bool> {
        if context != self.context {
            self.audit(
                HostAuditEventBuilder::new(HostAuditStage::ContextChanged)
                    .detail("size", json!(context.size.as_str()))
                    .detail("state", json!(context.state.as_str())),
            );
            self.context = context;
        }
        self.recompute()
    }

    /// Context handed to the engine: requested positions plus every position
    /// with an effective widget.
    fn pass_context(&self, effective: &SlotMap) -> CardContext {
        let occupied: Occupancy = effective.keys().copied().collect();
        self.context
            .with_occupancy(self.context.occupancy.union(occupied))
    }

    fn recompute(&mut self) -> Result<bool> {
        self.context.validate()?;

        let version = self.registry.version();
        if version != self.seen_version {
            self.seen_version = version;
            self.with_metrics(HostMetrics::record_registry_change);
        }

        let mut merged = self.registry.get_all();
        for (position, config) in &self.inline_slots {
            merged.insert(*position, config.clone());
        }
        let effective = resolve_slots(self.config.enabled, &self.context, &merged);
        let pass_context = self.pass_context(&effective);
        let manifests: Vec<WidgetManifest> = effective
            .iter()
            .map(|(position, config)| {
                config.manifest_for(*position, &pass_context, &self.config.settings)
            })
            .collect();

        self.manifest_ids = effective
            .keys()
            .copied()
            .zip(manifests.iter().map(|manifest| manifest.id.clone()))
            .collect();
        self.unmount_stale(&effective);
        self.effective = effective;

        let key = layout_key(
            &self.config.settings,
            self.seen_version,
            &pass_context,
            &manifests,
        );
        let recomputed = if self.layout_key == Some(key) {
            self.with_metrics(HostMetrics::record_cache_hit);
            self.audit(HostAuditEventBuilder::new(HostAuditStage::LayoutReused));
            false
        } else {
            let result = self.engine.calculate(&pass_context, &manifests);
            self.forward_warnings(&result.warnings);
            let warning_count = result.warnings.len();
            self.with_metrics(|metrics| metrics.record_layout_pass(warning_count));
            self.log_host_event(
                LogLevel::Debug,
                "layout_computed",
                [
                    json_kv("widgets", json!(manifests.len())),
                    json_kv("placed", json!(result.placed_count())),
                    json_kv("warnings", json!(warning_count)),
                ],
            );
            self.audit(
                HostAuditEventBuilder::new(HostAuditStage::LayoutComputed)
                    .detail("placed", json!(result.placed_count()))
                    .detail("warnings", json!(warning_count)),
            );
            self.result = result;
            self.layout_key = Some(key);
            true
        };

        if self.tracker.observe(&self.effective) {
            let active: Vec<&str> = self.effective.keys().map(SlotPosition::as_str).collect();
            self.audit(
                HostAuditEventBuilder::new(HostAuditStage::ActiveSlotsChanged)
                    .detail("active", json!(active)),
            );
        }

        Ok(recomputed)
    }

    /// Drop boundaries whose slot left the effective set or now hosts a
    /// different widget instance.
    fn unmount_stale(&mut self, effective: &SlotMap) {
        let stale: Vec<SlotPosition> = self
            .mounted
            .iter()
            .filter(|(position, mounted)| match effective.get(position) {
                Some(config) => !Arc::ptr_eq(&mounted.widget, &config.widget),
                None => true,
            })
            .map(|(position, _)| *position)
            .collect();
        for position in stale {
            self.mounted.remove(&position);
            self.render_cache.evict(position);
        }
    }

    fn render_slot(&mut self, position: SlotPosition, config: &SlotConfig) -> SlotFrame {
        let widget_id = self.manifest_ids.get(&position).cloned().unwrap_or_default();
        let placement = self.result.placement(&widget_id).cloned();
        let footprint = match &placement {
            Some(PlacementOutcome::Placed { footprint, .. }) => *footprint,
            _ => Size::ZERO,
        };
        let visible = matches!(placement, Some(PlacementOutcome::Placed { .. }));
        let props = self.props_for(position, config, visible);

        let mounted = self.mounted.entry(position).or_insert_with(|| Mounted {
            widget: Arc::clone(&config.widget),
            boundary: FaultBoundary::new(position),
        });

        if config.hints.lazy_load && !mounted.widget.is_ready() {
            return SlotFrame {
                position,
                widget_id,
                placement,
                render: SlotRender::Placeholder { footprint },
            };
        }

        let key = render_key(&props);
        if config.hints.memoize && mounted.boundary.state() == &BoundaryState::Ok {
            if let Some(cached) = self.render_cache.get(position, &key) {
                return SlotFrame {
                    position,
                    widget_id,
                    placement,
                    render: SlotRender::Rendered(cached.clone()),
                };
            }
        }

        let failures_before = mounted.boundary.failures();
        let render = mounted.boundary.render(
            mounted.widget.as_ref(),
            &props,
            self.config.on_error.as_ref(),
        );
        let faulted = mounted.boundary.failures() > failures_before;

        if let SlotRender::Rendered(output) = &render {
            if config.hints.memoize {
                self.render_cache.store(position, key, output.clone());
            }
        }

        if faulted {
            if let SlotRender::Failed { report, .. } = &render {
                self.with_metrics(HostMetrics::record_fault);
                self.log_host_event(
                    LogLevel::Error,
                    "widget_faulted",
                    [
                        json_kv("position", json!(position.as_str())),
                        json_kv("fault_id", json!(report.id)),
                        json_kv("error", json!(report.error)),
                    ],
                );
                self.audit(
                    HostAuditEventBuilder::new(HostAuditStage::WidgetFaulted)
                        .detail("position", json!(position.as_str()))
                        .detail("fault_id", json!(report.id))
                        .detail("timestamp_ms", json!(report.timestamp_ms() as u64)),
                );
            }
        }

        SlotFrame {
            position,
            widget_id,
            placement,
            render,
        }
    }

    fn props_for(&self, position: SlotPosition, config: &SlotConfig, visible: bool) -> WidgetProps {
        WidgetProps {
            card_id: self.card.id.clone(),
            card_state: self.context.state,
            card_size: self.context.size,
            card_title: self.card.title.clone(),
            focused: self.card.focused,
            last_state_change: self.card.last_state_change,
            flags: self.context.flags,
            position,
            visible,
            class_name: config.class_name.clone(),
            aria_label: config.aria_label.clone(),
            on_error: self.config.on_error.clone(),
        }
    }

    fn forward_warnings(&self, warnings: &[String]) {
        if let Some(logger) = self.config.logger.as_ref() {
            for warning in warnings {
                let _ = logger.log(LogLevel::Warn, LAYOUT_TARGET, warning);
            }
        }
    }

    fn log_host_event<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref() {
            let event = event_with_fields(level, HOST_TARGET, message, fields);
            let _ = logger.log_event(event);
        }
    }

    fn audit(&self, builder: HostAuditEventBuilder) {
        self.config.audit.record(builder.finish());
    }

    fn with_metrics(&self, record: impl FnOnce(&mut HostMetrics)) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                record(&mut guard);
            }
        }
    }
}
