//! Layout host: owns the card context, merges inline and registered slots,
//! and recomputes the layout when the inputs change.

pub mod audit;
mod cache;
mod core;

pub use core::{CardUpdate, HostConfig, LayoutHost, SlotFrame};
