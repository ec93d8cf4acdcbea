//! Versioned store of dynamically registered slot widgets.

mod core;

pub use core::{Registration, SharedRegistry, SlotRegistry};
