//! Per-widget fault isolation.
//!
//! Each rendered slot is wrapped in a [`FaultBoundary`] that turns returned
//! errors and panics into a [`FaultReport`] value, so one misbehaving widget
//! never takes down its siblings or the card.

mod core;

pub use core::{BoundaryState, ErrorCallback, FaultBoundary, FaultReport, SlotRender};
