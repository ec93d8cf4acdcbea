//! Visibility resolver: narrows the configured slots down to the ones that
//! apply to the current card context.

mod core;

pub use core::{ActiveSlotsCallback, ActiveSlotsTracker, is_slot_visible, resolve_slots};
