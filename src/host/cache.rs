use std::collections::BTreeMap;
use std::time::UNIX_EPOCH;

use blake3::{Hash, Hasher};

use crate::geometry::Size;
use crate::manifest::{CardContext, SlotPosition, WidgetManifest};
use crate::settings::{LayoutSettings, TierMetrics};
use crate::widget::{RenderedOutput, WidgetProps};

// strings are length-prefixed so adjacent fields cannot run together
fn hash_str(hasher: &mut Hasher, value: &str) {
    hasher.update(&(value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn hash_size(hasher: &mut Hasher, size: Size) {
    hasher.update(&size.width.to_le_bytes());
    hasher.update(&size.height.to_le_bytes());
}

fn hash_tier(hasher: &mut Hasher, tier: &TierMetrics) {
    hash_size(hasher, tier.dimensions);
    hasher.update(&tier.peripheral_budget.to_le_bytes());
    hasher.update(&tier.metadata_height.to_le_bytes());
    hasher.update(&tier.extended_height.to_le_bytes());
}

/// Digest of every input that can change an allocation pass.
pub(crate) fn layout_key(
    settings: &LayoutSettings,
    registry_version: u64,
    context: &CardContext,
    widgets: &[WidgetManifest],
) -> Hash {
    let mut hasher = Hasher::new();

    for tier in [&settings.compact, &settings.standard, &settings.xl] {
        hash_tier(&mut hasher, tier);
    }
    hasher.update(&settings.collapsed_height.to_le_bytes());
    hasher.update(&settings.zone_padding.to_le_bytes());
    hash_str(&mut hasher, settings.description_min_tier.as_str());

    hasher.update(&registry_version.to_le_bytes());

    hash_str(&mut hasher, context.size.as_str());
    hash_str(&mut hasher, context.state.as_str());
    hash_size(&mut hasher, context.dimensions);
    hasher.update(&[
        context.occupancy.bits(),
        context.flags.animations_enabled as u8,
        context.flags.high_contrast as u8,
        context.flags.reduced_motion as u8,
        context.has_description as u8,
    ]);

    hasher.update(&(widgets.len() as u64).to_le_bytes());
    for widget in widgets {
        hash_str(&mut hasher, &widget.id);
        hash_str(&mut hasher, widget.zone.as_str());
        hasher.update(&widget.priority.to_le_bytes());
        hash_size(&mut hasher, widget.footprint);
        hash_str(&mut hasher, widget.fallback.as_str());
        match widget.fallback_zone {
            Some(zone) => {
                hasher.update(&[1]);
                hash_str(&mut hasher, zone.as_str());
            }
            None => {
                hasher.update(&[0]);
            }
        }
    }

    hasher.finalize()
}

/// Identity of one widget render: its position plus the props it can see.
pub(crate) fn render_key(props: &WidgetProps) -> Hash {
    let mut hasher = Hasher::new();
    hash_str(&mut hasher, props.position.as_str());
    hash_str(&mut hasher, &props.card_id);
    hash_str(&mut hasher, props.card_size.as_str());
    hash_str(&mut hasher, props.card_state.as_str());
    hash_str(&mut hasher, &props.card_title);
    hasher.update(&[
        props.focused as u8,
        props.visible as u8,
        props.flags.animations_enabled as u8,
        props.flags.high_contrast as u8,
        props.flags.reduced_motion as u8,
    ]);
    let changed_at = props
        .last_state_change
        .and_then(|at| at.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    hasher.update(&changed_at.to_le_bytes());
    for part in [&props.class_name, &props.aria_label] {
        match part {
            Some(value) => {
                hasher.update(&[1]);
                hash_str(&mut hasher, value);
            }
            None => {
                hasher.update(&[0]);
            }
        }
    }
    hasher.finalize()
}

/// Last successful output per memoised position.
#[derive(Debug, Default)]
pub(crate) struct RenderCache {
    entries: BTreeMap<SlotPosition, (Hash, RenderedOutput)>,
}

impl RenderCache {
    pub(crate) fn get(&self, position: SlotPosition, key: &Hash) -> Option<&RenderedOutput> {
        self.entries
            .get(&position)
            .filter(|(cached, _)| cached == key)
            .map(|(_, output)| output)
    }

    pub(crate) fn store(&mut self, position: SlotPosition, key: Hash, output: RenderedOutput) {
        self.entries.insert(position, (key, output));
    }

    pub(crate) fn evict(&mut self, position: SlotPosition) {
        self.entries.remove(&position);
    }
}
