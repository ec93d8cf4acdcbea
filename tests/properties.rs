use std::sync::Arc;

use card_slots::{
    CardContext, CardSizeTier, FallbackPolicy, LayoutEngine, LayoutSettings, Occupancy,
    PlacementOutcome, Size, SlotConfig, SlotPosition, SlotRegistry, StaticWidget, WidgetManifest,
    ZoneId,
};
use proptest::prelude::*;

const TIERS: [CardSizeTier; 3] = [CardSizeTier::Compact, CardSizeTier::Standard, CardSizeTier::Xl];

fn policy(index: usize) -> FallbackPolicy {
    match index {
        0 => FallbackPolicy::Hide,
        1 => FallbackPolicy::Truncate,
        2 => FallbackPolicy::Collapse,
        3 => FallbackPolicy::Relocate,
        _ => FallbackPolicy::Other("shrink".into()),
    }
}

fn manifest_strategy() -> impl Strategy<Value = (usize, f32, f32, i32, usize, Option<usize>)> {
    (
        0..ZoneId::ALL.len(),
        0.0f32..240.0,
        0.0f32..90.0,
        -10i32..100,
        0..5usize,
        proptest::option::of(0..ZoneId::ALL.len()),
    )
}

fn build(
    specs: &[(usize, f32, f32, i32, usize, Option<usize>)],
) -> Vec<WidgetManifest> {
    specs
        .iter()
        .enumerate()
        .map(|(i, (zone, width, height, priority, fallback, fallback_zone))| {
            let manifest = WidgetManifest::new(
                format!("w{i}"),
                ZoneId::ALL[*zone],
                Size::new(*width, *height),
            )
            .with_priority(*priority)
            .with_fallback(policy(*fallback));
            match fallback_zone {
                Some(zone) => manifest.with_fallback_zone(ZoneId::ALL[*zone]),
                None => manifest,
            }
        })
        .collect()
}

fn context(tier: usize, bits: u8, description: bool) -> CardContext {
    let occupancy: Occupancy = SlotPosition::ALL
        .into_iter()
        .enumerate()
        .filter(|(i, _)| bits & (1 << i) != 0)
        .map(|(_, position)| position)
        .collect();
    CardContext::for_tier(TIERS[tier], &LayoutSettings::default())
        .with_occupancy(occupancy)
        .with_description(description)
}

proptest! {
    #[test]
    fn prop_zones_never_exceed_budget(
        tier in 0..3usize,
        bits in 0u8..128,
        specs in proptest::collection::vec(manifest_strategy(), 0..24),
    ) {
        let engine = LayoutEngine::default();
        let result = engine.calculate(&context(tier, bits, false), &build(&specs));

        for zone in result.zones.values() {
            prop_assert!(zone.consumed.width <= zone.available.width);
            prop_assert!(zone.consumed.height <= zone.available.height);
        }
    }

    #[test]
    fn prop_every_widget_lands_exactly_once(
        tier in 0..3usize,
        bits in 0u8..128,
        specs in proptest::collection::vec(manifest_strategy(), 0..24),
    ) {
        let manifests = build(&specs);
        let result = LayoutEngine::default().calculate(&context(tier, bits, true), &manifests);
        prop_assert_eq!(result.placements.len(), manifests.len());

        for manifest in &manifests {
            let id = &manifest.id;
            let outcomes: Vec<_> = result
                .placements
                .iter()
                .filter(|placement| &placement.widget == id)
                .collect();
            prop_assert_eq!(outcomes.len(), 1);

            let listed = result
                .zones
                .values()
                .map(|zone| {
                    zone.widgets.iter().filter(|w| *w == id).count()
                        + zone.overflow.iter().filter(|w| *w == id).count()
                })
                .sum::<usize>();

            match &outcomes[0].outcome {
                PlacementOutcome::Placed { zone, .. } => {
                    prop_assert_eq!(listed, 1);
                    prop_assert!(result.zones[zone].widgets.contains(id));
                }
                PlacementOutcome::Overflowed { zone } => {
                    prop_assert_eq!(listed, 1);
                    prop_assert!(result.zones[zone].overflow.contains(id));
                }
                PlacementOutcome::Omitted => {
                    prop_assert_eq!(listed, 0);
                    let needle = format!("`{id}`");
                    prop_assert!(result.warnings.iter().any(|w| w.contains(&needle)));
                }
            }
        }
    }

    #[test]
    fn prop_identical_inputs_give_identical_results(
        tier in 0..3usize,
        bits in 0u8..128,
        specs in proptest::collection::vec(manifest_strategy(), 0..16),
    ) {
        let manifests = build(&specs);
        let ctx = context(tier, bits, false);
        let engine = LayoutEngine::default();
        prop_assert_eq!(engine.calculate(&ctx, &manifests), engine.calculate(&ctx, &manifests));
    }

    #[test]
    fn prop_higher_priority_claims_contested_space(
        first in 160.0f32..304.0,
        second in 160.0f32..304.0,
        low in 0i32..50,
        gap in 1i32..50,
        high_first in any::<bool>(),
    ) {
        let high = WidgetManifest::new("high", ZoneId::Metadata, Size::new(first, 20.0))
            .with_priority(low + gap);
        let loser = WidgetManifest::new("low", ZoneId::Metadata, Size::new(second, 20.0))
            .with_priority(low);
        let manifests = if high_first { vec![high, loser] } else { vec![loser, high] };

        let ctx = context(1, 0, false);
        let result = LayoutEngine::default().calculate(&ctx, &manifests);

        prop_assert!(result.is_placed("high"));
        prop_assert!(!result.is_placed("low"));
    }

    #[test]
    fn prop_registry_version_strictly_increases(
        ops in proptest::collection::vec((0..SlotPosition::ALL.len(), any::<bool>()), 1..40),
    ) {
        let registry = SlotRegistry::shared();
        let mut handles = Vec::new();
        let mut last = registry.version();

        for (index, unregister) in ops {
            if unregister && !handles.is_empty() {
                let handle: card_slots::Registration = handles.remove(0);
                let _ = handle.unregister();
            } else {
                let position = SlotPosition::ALL[index];
                let config = SlotConfig::new(Arc::new(StaticWidget::new("w", "w")));
                handles.push(registry.register(position, config));
            }
            let now = registry.version();
            prop_assert!(now > last);
            last = now;
        }
    }
}
