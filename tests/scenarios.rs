use std::sync::Arc;

use card_slots::{
    CardContext, CardSizeTier, Degradation, HostConfig, LayoutHost, LayoutSettings,
    PlacementOutcome, Size, SlotConfig, SlotMap, SlotPosition, SlotRegistry, StaticWidget,
    WidgetManifest, ZoneId, calculate_layout,
};

fn widget(name: &str) -> SlotConfig {
    SlotConfig::new(Arc::new(StaticWidget::new(name, name)))
}

fn host(tier: CardSizeTier, config: HostConfig) -> LayoutHost {
    let context = CardContext::for_tier(tier, &config.settings);
    LayoutHost::new(SlotRegistry::shared(), config, context).unwrap()
}

#[test]
fn compact_corner_widget_within_budget_is_placed() {
    let mut host = host(CardSizeTier::Compact, HostConfig::default());
    let config = widget("status")
        .with_sizes([CardSizeTier::Compact])
        .with_manifest(WidgetManifest::new(
            "status",
            ZoneId::Peripheral,
            Size::new(20.0, 20.0),
        ));

    let mut slots = SlotMap::new();
    slots.insert(SlotPosition::TopLeft, config);
    host.set_slots(slots).unwrap();

    assert!(host.is_placed("status"));
    let zone = host.zone(ZoneId::Peripheral).unwrap();
    assert_eq!(zone.widgets, vec!["status".to_string()]);
    assert!(zone.overflow.is_empty());
    assert!(host.warnings().is_empty());
}

#[test]
fn size_filtered_widget_never_reaches_the_engine() {
    let mut host = host(CardSizeTier::Standard, HostConfig::default());
    let mut slots = SlotMap::new();
    slots.insert(
        SlotPosition::TopRight,
        widget("xl-only").with_sizes([CardSizeTier::Xl]),
    );
    host.set_slots(slots).unwrap();

    assert!(host.active_positions().is_empty());
    assert!(host.warnings().is_empty());
    assert!(host.result().placements.is_empty());
    for zone in host.result().zones.values() {
        assert!(zone.widgets.is_empty());
        assert!(zone.overflow.is_empty());
    }
}

#[test]
fn higher_priority_wins_and_loser_truncates_into_remaining_width() {
    // heights leave room for both in the 28px metadata strip
    let context = CardContext::for_tier(CardSizeTier::Standard, &LayoutSettings::default());
    let widgets = vec![
        WidgetManifest::new("low", ZoneId::Metadata, Size::new(150.0, 12.0))
            .with_priority(10)
            .with_fallback("truncate"),
        WidgetManifest::new("high", ZoneId::Metadata, Size::new(200.0, 12.0)).with_priority(90),
    ];

    let result = calculate_layout(&context, &widgets);

    assert_eq!(
        result.placement("high"),
        Some(&PlacementOutcome::Placed {
            zone: ZoneId::Metadata,
            footprint: Size::new(200.0, 12.0),
            degraded: None,
        })
    );
    assert_eq!(
        result.placement("low"),
        Some(&PlacementOutcome::Placed {
            zone: ZoneId::Metadata,
            footprint: Size::new(104.0, 12.0),
            degraded: Some(Degradation::Truncated),
        })
    );
    let metadata = result.zone(ZoneId::Metadata).unwrap();
    assert_eq!(metadata.widgets, vec!["high".to_string(), "low".to_string()]);
    assert!(metadata.consumed.width <= metadata.available.width);
}

#[test]
fn loser_without_remaining_width_overflows_with_named_warning() {
    let context = CardContext::for_tier(CardSizeTier::Standard, &LayoutSettings::default());
    let widgets = vec![
        WidgetManifest::new("high", ZoneId::Metadata, Size::new(304.0, 20.0)).with_priority(90),
        WidgetManifest::new("low", ZoneId::Metadata, Size::new(150.0, 20.0))
            .with_priority(10)
            .with_fallback("truncate"),
    ];

    let result = calculate_layout(&context, &widgets);

    assert!(result.is_placed("high"));
    assert_eq!(
        result.placement("low"),
        Some(&PlacementOutcome::Overflowed {
            zone: ZoneId::Metadata
        })
    );
    assert_eq!(
        result.zone(ZoneId::Metadata).unwrap().overflow,
        vec!["low".to_string()]
    );
    assert!(result.warnings.iter().any(|warning| warning.contains("`low`")));
}

#[test]
fn global_switch_off_places_nothing() {
    let mut host = host(
        CardSizeTier::Xl,
        HostConfig {
            enabled: false,
            ..HostConfig::default()
        },
    );
    let mut slots = SlotMap::new();
    slots.insert(SlotPosition::TopLeft, widget("a"));
    slots.insert(SlotPosition::RightEdge, widget("b"));
    slots.insert(SlotPosition::Footer, widget("c"));
    host.set_slots(slots).unwrap();

    assert!(host.active_positions().is_empty());
    assert_eq!(host.result().placed_count(), 0);
    assert!(
        host.result()
            .zones
            .values()
            .all(|zone| zone.widgets.is_empty())
    );
}

#[test]
fn failed_relocation_lands_in_overflow_zone() {
    let context = CardContext::for_tier(CardSizeTier::Standard, &LayoutSettings::default());
    let widgets = vec![
        WidgetManifest::new("hero", ZoneId::Primary, Size::new(304.0, 100.0)).with_priority(100),
        WidgetManifest::new("caption", ZoneId::Metadata, Size::new(304.0, 20.0)).with_priority(90),
        WidgetManifest::new("mover", ZoneId::Primary, Size::new(100.0, 20.0))
            .with_priority(50)
            .relocate_to(ZoneId::Metadata),
    ];

    let result = calculate_layout(&context, &widgets);

    assert_eq!(
        result.placement("mover"),
        Some(&PlacementOutcome::Overflowed {
            zone: ZoneId::Overflow
        })
    );
    assert_eq!(
        result.zone(ZoneId::Overflow).unwrap().overflow,
        vec!["mover".to_string()]
    );
    assert!(result.zone(ZoneId::Primary).unwrap().overflow.is_empty());
    assert!(result.zone(ZoneId::Metadata).unwrap().overflow.is_empty());
    assert!(
        result
            .warnings
            .iter()
            .any(|warning| warning.contains("`mover`") && warning.contains("could not be relocated"))
    );
}

#[test]
fn unregister_bumps_version_and_restores_default() {
    let registry = SlotRegistry::shared();
    let registration = registry.register(SlotPosition::BottomRight, widget("explicit"));
    let v1 = registry.version();
    assert!(registration.unregister());
    let v2 = registry.version();
    assert!(v2 > v1);
    assert!(!registry.get_all().contains_key(&SlotPosition::BottomRight));

    registry.register_default(SlotPosition::BottomRight, widget("default"));
    let registration = registry.register(SlotPosition::BottomRight, widget("explicit"));
    assert!(registration.unregister());
    let remaining = registry.get_all();
    assert_eq!(
        remaining[&SlotPosition::BottomRight].widget.name(),
        "default"
    );
    assert!(registry.version() > v2);
}
