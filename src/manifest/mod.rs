//! Manifest model: the data shapes the visibility resolver and layout engine
//! operate on.
//!
//! Positions, tiers, states and zones are closed enums; widget manifests and
//! slot configurations are immutable for the duration of one allocation pass.

mod core;

pub use core::{
    CardContext, CardSizeTier, CardState, FallbackPolicy, FeatureFlags, Occupancy,
    PerformanceHints, SlotConfig, SlotMap, SlotPosition, WidgetManifest, ZoneId,
};
