//! Layout module orchestrator.
//!
//! Callers import layout types from here while the allocation pass lives in
//! the private `core` module and zone derivation in `zones`.

mod core;
mod zones;

pub use core::{
    Degradation, LayoutEngine, LayoutResult, Placement, PlacementOutcome, calculate_layout,
};
pub use zones::{LayoutZone, reserved_space};
