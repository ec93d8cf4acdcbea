//! Layout configuration: per-tier pixel dimensions and space budgets.

mod core;

pub use core::{LayoutSettings, TierMetrics};
