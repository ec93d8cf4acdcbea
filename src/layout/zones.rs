use std::collections::BTreeMap;

use serde::Serialize;

use crate::geometry::{Edges, Size};
use crate::manifest::{CardContext, CardSizeTier, SlotPosition, ZoneId};
use crate::settings::LayoutSettings;

/// A computed region with its running space accounting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutZone {
    pub id: ZoneId,
    pub available: Size,
    pub consumed: Size,
    /// Widget ids placed here, in placement order.
    pub widgets: Vec<String>,
    /// Widget ids that exhausted their fallback while targeting this zone.
    pub overflow: Vec<String>,
    pub visible: bool,
}

impl LayoutZone {
    fn new(id: ZoneId, available: Size, visible: bool) -> Self {
        Self {
            id,
            available,
            consumed: Size::ZERO,
            widgets: Vec::new(),
            overflow: Vec::new(),
            visible,
        }
    }

    pub fn remaining_width(&self) -> f32 {
        (self.available.width - self.consumed.width).max(0.0)
    }

    pub fn remaining_height(&self) -> f32 {
        (self.available.height - self.consumed.height).max(0.0)
    }

    /// The required footprint must fit within `available - consumed` on
    /// both axes.
    pub fn can_fit(&self, required: Size) -> bool {
        self.visible
            && required.width <= self.remaining_width()
            && required.height <= self.remaining_height()
    }

    /// Record `widget_id` as placed. Callers must have checked [`Self::can_fit`].
    pub(crate) fn place(&mut self, widget_id: &str, required: Size) {
        self.consumed.width = (self.consumed.width + required.width).min(self.available.width);
        self.consumed.height = self.consumed.height.max(required.height);
        self.widgets.push(widget_id.to_string());
    }

    pub(crate) fn push_overflow(&mut self, widget_id: &str) {
        self.overflow.push(widget_id.to_string());
    }

    pub fn has_overflow(&self) -> bool {
        !self.overflow.is_empty()
    }
}

/// Per-edge reservation consumed by peripheral widgets, independent of the
/// per-zone budgets.
pub fn reserved_space(context: &CardContext, settings: &LayoutSettings) -> Edges {
    let budget = settings.tier(context.size).peripheral_budget;
    let occupied = |position| context.occupancy.contains(position);
    let reserve = |wanted: bool| if wanted { budget } else { 0.0 };

    Edges {
        top: reserve(occupied(SlotPosition::TopLeft) || occupied(SlotPosition::TopRight)),
        right: reserve(occupied(SlotPosition::TopRight)),
        bottom: reserve(
            occupied(SlotPosition::BottomLeft)
                || occupied(SlotPosition::BottomRight)
                || occupied(SlotPosition::Footer),
        ),
        left: reserve(occupied(SlotPosition::LeftEdge)),
    }
}

/// Derive every zone's available footprint from the card geometry.
pub(crate) fn initial_zones(
    context: &CardContext,
    settings: &LayoutSettings,
    reserved: &Edges,
) -> BTreeMap<ZoneId, LayoutZone> {
    let metrics = settings.tier(context.size);
    let budget = metrics.peripheral_budget;
    let width = context.dimensions.width.max(0.0);
    let height = context.dimensions.height.max(0.0);
    let inner_width = (width - 2.0 * settings.zone_padding).max(0.0);
    let inner_height = (height - 2.0 * settings.zone_padding).max(0.0);

    let side_reduction = [SlotPosition::LeftEdge, SlotPosition::RightEdge]
        .into_iter()
        .filter(|edge| context.occupancy.contains(*edge))
        .count() as f32
        * budget;

    let extended_visible = context.size == CardSizeTier::Xl;
    let extended_height = if extended_visible {
        metrics.extended_height
    } else {
        0.0
    };

    let primary = Size::new(
        (inner_width - side_reduction).max(0.0),
        (inner_height - reserved.vertical() - metrics.metadata_height - extended_height).max(0.0),
    );
    let metadata = Size::new(inner_width, metrics.metadata_height);
    let extended = Size::new(inner_width, extended_height);
    // one budget square per occupied corner or edge, on both axes, so every
    // occupied position can take a full-size widget
    let perimeter = context
        .occupancy
        .iter()
        .filter(|position| position.is_corner() || position.is_edge())
        .count() as f32;
    let peripheral = Size::new(budget * perimeter, budget * perimeter);
    let overflow = Size::new(inner_width, budget);

    [
        LayoutZone::new(ZoneId::Primary, primary, true),
        LayoutZone::new(ZoneId::Metadata, metadata, true),
        LayoutZone::new(
            ZoneId::Extended,
            extended,
            extended_visible && extended_height > 0.0,
        ),
        LayoutZone::new(ZoneId::Peripheral, peripheral, perimeter > 0.0),
        LayoutZone::new(ZoneId::Overflow, overflow, true),
    ]
    .into_iter()
    .map(|zone| (zone.id, zone))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Occupancy;

    fn context(size: CardSizeTier, occupancy: Occupancy) -> CardContext {
        CardContext::for_tier(size, &LayoutSettings::default()).with_occupancy(occupancy)
    }

    #[test]
    fn reservation_follows_occupied_corners() {
        let settings = LayoutSettings::default();
        let ctx = context(
            CardSizeTier::Standard,
            Occupancy::empty()
                .with(SlotPosition::TopRight)
                .with(SlotPosition::Footer),
        );
        let edges = reserved_space(&ctx, &settings);
        assert_eq!(edges, Edges::new(32.0, 32.0, 32.0, 0.0));

        let left_only = context(
            CardSizeTier::Standard,
            Occupancy::empty().with(SlotPosition::LeftEdge),
        );
        assert_eq!(
            reserved_space(&left_only, &settings),
            Edges::new(0.0, 0.0, 0.0, 32.0)
        );
    }

    #[test]
    fn extended_zone_only_visible_at_xl() {
        let settings = LayoutSettings::default();
        for size in [CardSizeTier::Compact, CardSizeTier::Standard] {
            let ctx = context(size, Occupancy::empty());
            let zones = initial_zones(&ctx, &settings, &reserved_space(&ctx, &settings));
            let extended = &zones[&ZoneId::Extended];
            assert!(!extended.visible);
            assert_eq!(extended.available.height, 0.0);
        }

        let ctx = context(CardSizeTier::Xl, Occupancy::empty());
        let zones = initial_zones(&ctx, &settings, &reserved_space(&ctx, &settings));
        assert!(zones[&ZoneId::Extended].visible);
        assert_eq!(zones[&ZoneId::Extended].available.height, 72.0);
    }

    #[test]
    fn occupied_edges_narrow_primary_zone() {
        let settings = LayoutSettings::default();
        let bare = context(CardSizeTier::Standard, Occupancy::empty());
        let edged = context(
            CardSizeTier::Standard,
            Occupancy::empty()
                .with(SlotPosition::LeftEdge)
                .with(SlotPosition::RightEdge),
        );
        let bare_zones = initial_zones(&bare, &settings, &reserved_space(&bare, &settings));
        let edged_zones = initial_zones(&edged, &settings, &reserved_space(&edged, &settings));
        assert_eq!(
            bare_zones[&ZoneId::Primary].available.width - 64.0,
            edged_zones[&ZoneId::Primary].available.width
        );
        assert!(!bare_zones[&ZoneId::Peripheral].visible);
        assert_eq!(edged_zones[&ZoneId::Peripheral].available.width, 64.0);
    }

    #[test]
    fn fit_is_checked_against_remaining_height() {
        // standard metadata strip: 304x28
        let mut zone = LayoutZone::new(ZoneId::Metadata, Size::new(304.0, 28.0), true);
        assert!(zone.can_fit(Size::new(100.0, 20.0)));
        zone.place("a", Size::new(100.0, 20.0));
        assert_eq!(zone.remaining_height(), 8.0);
        assert!(!zone.can_fit(Size::new(100.0, 20.0)));
        assert!(zone.can_fit(Size::new(100.0, 8.0)));
        zone.place("b", Size::new(100.0, 8.0));
        assert_eq!(zone.consumed, Size::new(200.0, 20.0));
    }

    #[test]
    fn every_occupied_corner_fits_a_full_budget_widget() {
        let settings = LayoutSettings::default();
        let corners = context(
            CardSizeTier::Standard,
            Occupancy::empty()
                .with(SlotPosition::TopLeft)
                .with(SlotPosition::TopRight)
                .with(SlotPosition::BottomRight),
        );
        let mut zones = initial_zones(&corners, &settings, &reserved_space(&corners, &settings));
        let zone = zones.get_mut(&ZoneId::Peripheral).unwrap();
        for id in ["a", "b", "c"] {
            assert!(zone.can_fit(Size::new(32.0, 32.0)));
            zone.place(id, Size::new(32.0, 32.0));
        }
        assert!(!zone.can_fit(Size::new(1.0, 1.0)));
    }

    #[test]
    fn footer_does_not_claim_peripheral_budget() {
        let settings = LayoutSettings::default();
        let footer_only = context(
            CardSizeTier::Standard,
            Occupancy::empty().with(SlotPosition::Footer),
        );
        let zones = initial_zones(&footer_only, &settings, &reserved_space(&footer_only, &settings));
        assert!(!zones[&ZoneId::Peripheral].visible);
        assert_eq!(zones[&ZoneId::Peripheral].available, Size::ZERO);

        let mixed = context(
            CardSizeTier::Standard,
            Occupancy::empty()
                .with(SlotPosition::Footer)
                .with(SlotPosition::LeftEdge),
        );
        let zones = initial_zones(&mixed, &settings, &reserved_space(&mixed, &settings));
        assert_eq!(zones[&ZoneId::Peripheral].available, Size::new(32.0, 32.0));
    }
}
