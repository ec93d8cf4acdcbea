use serde::{Deserialize, Serialize};

/// Pixel footprint of a card, zone, or widget.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size::new(0.0, 0.0);

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Both dimensions are finite and non-negative.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width >= 0.0 && self.height >= 0.0
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// True when `self` fits inside `other` on both axes.
    pub fn fits_within(&self, other: Size) -> bool {
        self.width <= other.width && self.height <= other.height
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    pub fn with_height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }
}

/// Per-edge pixel values, used for the space peripheral widgets reserve around a card.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_and_nan_sizes_are_invalid() {
        assert!(Size::new(10.0, 0.0).is_valid());
        assert!(!Size::new(-1.0, 4.0).is_valid());
        assert!(!Size::new(f32::NAN, 4.0).is_valid());
        assert!(!Size::new(4.0, f32::INFINITY).is_valid());
    }

    #[test]
    fn fits_within_checks_both_axes() {
        let zone = Size::new(40.0, 20.0);
        assert!(Size::new(40.0, 20.0).fits_within(zone));
        assert!(!Size::new(41.0, 10.0).fits_within(zone));
        assert!(!Size::new(10.0, 21.0).fits_within(zone));
    }
}
