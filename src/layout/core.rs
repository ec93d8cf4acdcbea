use std::collections::BTreeMap;

use serde::Serialize;

use crate::geometry::{Edges, Size};
use crate::manifest::{CardContext, FallbackPolicy, WidgetManifest, ZoneId};
use crate::settings::LayoutSettings;

use super::zones::{LayoutZone, initial_zones, reserved_space};

/// How a placed widget was degraded to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Degradation {
    Truncated,
    Collapsed,
    Relocated,
}

/// Final disposition of one manifest. Every manifest gets exactly one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum PlacementOutcome {
    Placed {
        zone: ZoneId,
        footprint: Size,
        #[serde(skip_serializing_if = "Option::is_none")]
        degraded: Option<Degradation>,
    },
    Overflowed {
        zone: ZoneId,
    },
    Omitted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub widget: String,
    #[serde(flatten)]
    pub outcome: PlacementOutcome,
}

/// Output of one allocation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutResult {
    pub zones: BTreeMap<ZoneId, LayoutZone>,
    pub reserved: Edges,
    pub style: BTreeMap<String, String>,
    pub warnings: Vec<String>,
    /// One entry per manifest, in placement (priority) order.
    pub placements: Vec<Placement>,
}

impl LayoutResult {
    pub fn zone(&self, id: ZoneId) -> Option<&LayoutZone> {
        self.zones.get(&id)
    }

    pub fn placement(&self, widget_id: &str) -> Option<&PlacementOutcome> {
        self.placements
            .iter()
            .find(|placement| placement.widget == widget_id)
            .map(|placement| &placement.outcome)
    }

    pub fn is_placed(&self, widget_id: &str) -> bool {
        matches!(
            self.placement(widget_id),
            Some(PlacementOutcome::Placed { .. })
        )
    }

    pub fn has_overflow(&self) -> bool {
        self.zones.values().any(LayoutZone::has_overflow)
    }

    pub fn placed_count(&self) -> usize {
        self.zones.values().map(|zone| zone.widgets.len()).sum()
    }
}

/// Slot allocation engine. Stateless apart from its settings; every call
/// recomputes from scratch.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    settings: LayoutSettings,
}

/// Allocate `widgets` with the default settings.
pub fn calculate_layout(context: &CardContext, widgets: &[WidgetManifest]) -> LayoutResult {
    LayoutEngine::default().calculate(context, widgets)
}

impl LayoutEngine {
    pub fn new(settings: LayoutSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    pub fn calculate(&self, context: &CardContext, widgets: &[WidgetManifest]) -> LayoutResult {
        let reserved = reserved_space(context, &self.settings);
        let mut pass = Pass {
            settings: &self.settings,
            zones: initial_zones(context, &self.settings, &reserved),
            warnings: Vec::new(),
            placements: Vec::with_capacity(widgets.len()),
        };

        let mut ordered: Vec<&WidgetManifest> = widgets.iter().collect();
        // sort_by is stable: equal priorities keep their input order
        ordered.sort_by(|a, b| b.priority.cmp(&a.priority));

        for manifest in ordered {
            let outcome = pass.place(manifest);
            pass.placements.push(Placement {
                widget: manifest.id.clone(),
                outcome,
            });
        }

        let style = derive_style(context, &self.settings, &pass.zones, &reserved);
        LayoutResult {
            zones: pass.zones,
            reserved,
            style,
            warnings: pass.warnings,
            placements: pass.placements,
        }
    }
}

struct Pass<'a> {
    settings: &'a LayoutSettings,
    zones: BTreeMap<ZoneId, LayoutZone>,
    warnings: Vec<String>,
    placements: Vec<Placement>,
}

impl Pass<'_> {
    fn place(&mut self, manifest: &WidgetManifest) -> PlacementOutcome {
        if !manifest.footprint.is_valid() {
            self.warn(format!(
                "widget `{}` omitted: footprint {}x{} is not finite and non-negative",
                manifest.id, manifest.footprint.width, manifest.footprint.height
            ));
            return PlacementOutcome::Omitted;
        }

        let Some(target) = self.resolve_target(manifest) else {
            return PlacementOutcome::Omitted;
        };

        let required = manifest.footprint;
        if self.fits(target, required) {
            return self.commit(target, manifest, required, None);
        }

        match &manifest.fallback {
            FallbackPolicy::Hide => {
                self.warn(format!(
                    "widget `{}` hidden: no space in {} zone",
                    manifest.id, target
                ));
                PlacementOutcome::Omitted
            }
            FallbackPolicy::Truncate => {
                let remaining = self.zone(target).remaining_width();
                let truncated = required.with_width(required.width.min(remaining));
                if remaining > 0.0 && self.fits(target, truncated) {
                    self.warn(format!(
                        "widget `{}` truncated to {}px in {} zone",
                        manifest.id, truncated.width, target
                    ));
                    self.commit(target, manifest, truncated, Some(Degradation::Truncated))
                } else {
                    self.overflow(target, manifest, "truncation")
                }
            }
            FallbackPolicy::Collapse => {
                let collapsed =
                    required.with_height(required.height.min(self.settings.collapsed_height));
                if self.fits(target, collapsed) {
                    self.warn(format!(
                        "widget `{}` collapsed to {}px in {} zone",
                        manifest.id, collapsed.height, target
                    ));
                    self.commit(target, manifest, collapsed, Some(Degradation::Collapsed))
                } else {
                    self.overflow(target, manifest, "collapse")
                }
            }
            FallbackPolicy::Relocate => match manifest.fallback_zone {
                Some(destination) if destination != target && self.fits(destination, required) => {
                    self.warn(format!(
                        "widget `{}` relocated from {} to {} zone",
                        manifest.id, target, destination
                    ));
                    self.commit(
                        destination,
                        manifest,
                        required,
                        Some(Degradation::Relocated),
                    )
                }
                _ => {
                    self.warn(format!(
                        "widget `{}` could not be relocated from {} zone; moved to overflow",
                        manifest.id, target
                    ));
                    self.zone_mut(ZoneId::Overflow).push_overflow(&manifest.id);
                    PlacementOutcome::Overflowed {
                        zone: ZoneId::Overflow,
                    }
                }
            },
            FallbackPolicy::Other(policy) => {
                self.warn(format!(
                    "widget `{}` has unrecognised fallback policy `{}`; treated as overflow",
                    manifest.id, policy
                ));
                self.zone_mut(target).push_overflow(&manifest.id);
                PlacementOutcome::Overflowed { zone: target }
            }
        }
    }

    /// The manifest's zone if visible, else its visible fallback zone.
    fn resolve_target(&mut self, manifest: &WidgetManifest) -> Option<ZoneId> {
        if self.zone(manifest.zone).visible {
            return Some(manifest.zone);
        }

        match manifest.fallback_zone {
            Some(fallback) if self.zone(fallback).visible => Some(fallback),
            _ => {
                self.warn(format!(
                    "widget `{}` skipped: {} zone is not visible at this size",
                    manifest.id, manifest.zone
                ));
                None
            }
        }
    }

    fn fits(&self, zone: ZoneId, required: Size) -> bool {
        self.zone(zone).can_fit(required)
    }

    fn commit(
        &mut self,
        zone: ZoneId,
        manifest: &WidgetManifest,
        footprint: Size,
        degraded: Option<Degradation>,
    ) -> PlacementOutcome {
        self.zone_mut(zone).place(&manifest.id, footprint);
        PlacementOutcome::Placed {
            zone,
            footprint,
            degraded,
        }
    }

    fn overflow(&mut self, zone: ZoneId, manifest: &WidgetManifest, step: &str) -> PlacementOutcome {
        self.warn(format!(
            "widget `{}` overflowed {} zone after {}",
            manifest.id, zone, step
        ));
        self.zone_mut(zone).push_overflow(&manifest.id);
        PlacementOutcome::Overflowed { zone }
    }

    fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }

    fn zone(&self, id: ZoneId) -> &LayoutZone {
        &self.zones[&id]
    }

    fn zone_mut(&mut self, id: ZoneId) -> &mut LayoutZone {
        self.zones
            .get_mut(&id)
            .unwrap_or_else(|| unreachable!("zone {id} is always initialised"))
    }
}

fn px(value: f32) -> String {
    format!("{value}px")
}

fn derive_style(
    context: &CardContext,
    settings: &LayoutSettings,
    zones: &BTreeMap<ZoneId, LayoutZone>,
    reserved: &Edges,
) -> BTreeMap<String, String> {
    let mut style = BTreeMap::new();
    style.insert("--card-reserve-top".to_string(), px(reserved.top));
    style.insert("--card-reserve-right".to_string(), px(reserved.right));
    style.insert("--card-reserve-bottom".to_string(), px(reserved.bottom));
    style.insert("--card-reserve-left".to_string(), px(reserved.left));

    for zone in zones.values() {
        let (width, height) = if zone.visible {
            (zone.available.width, zone.available.height)
        } else {
            (0.0, 0.0)
        };
        style.insert(format!("--zone-{}-width", zone.id), px(width));
        style.insert(format!("--zone-{}-height", zone.id), px(height));
    }

    let has_overflow = zones.values().any(LayoutZone::has_overflow);
    style.insert("--card-has-overflow".to_string(), has_overflow.to_string());

    let show_description =
        context.has_description && context.size >= settings.description_min_tier;
    style.insert(
        "--card-show-description".to_string(),
        show_description.to_string(),
    );
    style
}
