use crate::manifest::{CardContext, SlotConfig, SlotMap, SlotPosition};

/// Receives the sorted names of the active positions whenever they change.
pub type ActiveSlotsCallback = Box<dyn FnMut(&[&'static str]) + Send>;

/// Whether a single slot survives the size, state and motion filters.
pub fn is_slot_visible(context: &CardContext, config: &SlotConfig) -> bool {
    if let Some(sizes) = &config.supported_sizes {
        if !sizes.contains(&context.size) {
            return false;
        }
    }

    if let Some(states) = &config.supported_states {
        if !states.contains(&context.state) {
            return false;
        }
    }

    !(config.requires_animation && context.flags.reduced_motion)
}

/// Effective slot set for `context`. Pure; the global `enabled` switch is
/// checked before anything else.
pub fn resolve_slots(enabled: bool, context: &CardContext, slots: &SlotMap) -> SlotMap {
    if !enabled {
        return SlotMap::new();
    }

    slots
        .iter()
        .filter(|(_, config)| is_slot_visible(context, config))
        .map(|(position, config)| (*position, config.clone()))
        .collect()
}

/// Fires a callback when the set of active positions differs from the last
/// observed one. The list handed to the callback is in position declaration
/// order, independent of insertion order.
pub struct ActiveSlotsTracker {
    last: Option<Vec<SlotPosition>>,
    callback: Option<ActiveSlotsCallback>,
}

impl Default for ActiveSlotsTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ActiveSlotsTracker {
    pub fn new() -> Self {
        Self {
            last: None,
            callback: None,
        }
    }

    pub fn set_callback(&mut self, callback: ActiveSlotsCallback) {
        self.callback = Some(callback);
    }

    /// Record the current effective set. Returns `true` when it changed.
    pub fn observe(&mut self, effective: &SlotMap) -> bool {
        let mut current: Vec<SlotPosition> = effective.keys().copied().collect();
        current.sort();

        if self.last.as_ref() == Some(&current) {
            return false;
        }

        if let Some(callback) = self.callback.as_mut() {
            let names: Vec<&'static str> = current.iter().map(SlotPosition::as_str).collect();
            callback(&names);
        }
        self.last = Some(current);
        true
    }

    pub fn last(&self) -> &[SlotPosition] {
        self.last.as_deref().unwrap_or(&[])
    }
}
