use serde::{Deserialize, Serialize};

use crate::error::{CardError, Result};
use crate::geometry::Size;
use crate::manifest::CardSizeTier;

/// Fixed geometry of one size tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierMetrics {
    /// Card footprint in pixels.
    pub dimensions: Size,
    /// Maximum footprint (square) any peripheral widget may take on one edge.
    pub peripheral_budget: f32,
    /// Height of the metadata strip, which also hosts the footer band.
    pub metadata_height: f32,
    /// Height of the extended content zone. Only honoured at the xl tier.
    pub extended_height: f32,
}

impl TierMetrics {
    pub const fn new(
        width: f32,
        height: f32,
        peripheral_budget: f32,
        metadata_height: f32,
        extended_height: f32,
    ) -> Self {
        Self {
            dimensions: Size::new(width, height),
            peripheral_budget,
            metadata_height,
            extended_height,
        }
    }

    fn validate(&self, tier: CardSizeTier) -> Result<()> {
        let values = [
            self.peripheral_budget,
            self.metadata_height,
            self.extended_height,
        ];
        if !self.dimensions.is_valid() || values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(CardError::InvalidSettings(format!(
                "tier `{}` has negative or non-finite metrics",
                tier.as_str()
            )));
        }
        Ok(())
    }
}

/// Engine-wide layout knobs. Loadable from JSON; missing fields fall back to
/// the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub compact: TierMetrics,
    pub standard: TierMetrics,
    pub xl: TierMetrics,
    /// Height a `collapse` fallback shrinks a widget to.
    pub collapsed_height: f32,
    /// Inset applied on each side before zone widths are derived.
    pub zone_padding: f32,
    /// Smallest tier at which a description block is shown.
    pub description_min_tier: CardSizeTier,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            compact: TierMetrics::new(240.0, 160.0, 24.0, 24.0, 0.0),
            standard: TierMetrics::new(320.0, 200.0, 32.0, 28.0, 0.0),
            xl: TierMetrics::new(420.0, 280.0, 40.0, 32.0, 72.0),
            collapsed_height: 16.0,
            zone_padding: 8.0,
            description_min_tier: CardSizeTier::Standard,
        }
    }
}

impl LayoutSettings {
    pub fn tier(&self, tier: CardSizeTier) -> &TierMetrics {
        match tier {
            CardSizeTier::Compact => &self.compact,
            CardSizeTier::Standard => &self.standard,
            CardSizeTier::Xl => &self.xl,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.compact.validate(CardSizeTier::Compact)?;
        self.standard.validate(CardSizeTier::Standard)?;
        self.xl.validate(CardSizeTier::Xl)?;
        for (name, value) in [
            ("collapsed_height", self.collapsed_height),
            ("zone_padding", self.zone_padding),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CardError::InvalidSettings(format!(
                    "`{name}` must be finite and non-negative"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_ordered_by_footprint() {
        let settings = LayoutSettings::default();
        let compact = settings.tier(CardSizeTier::Compact);
        let standard = settings.tier(CardSizeTier::Standard);
        let xl = settings.tier(CardSizeTier::Xl);
        assert!(compact.dimensions.width < standard.dimensions.width);
        assert!(standard.dimensions.width < xl.dimensions.width);
        assert!(compact.peripheral_budget < xl.peripheral_budget);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let settings = LayoutSettings::from_json(r#"{"collapsed_height": 12.0}"#).unwrap();
        assert_eq!(settings.collapsed_height, 12.0);
        assert_eq!(settings.xl, LayoutSettings::default().xl);
    }

    #[test]
    fn negative_budget_is_rejected() {
        let raw = r#"{"compact": {"dimensions": {"width": 240.0, "height": 160.0},
            "peripheral_budget": -1.0, "metadata_height": 24.0, "extended_height": 0.0}}"#;
        assert!(matches!(
            LayoutSettings::from_json(raw),
            Err(CardError::InvalidSettings(_))
        ));
    }

    #[test]
    fn malformed_json_surfaces_config_error() {
        assert!(matches!(
            LayoutSettings::from_json("{not json"),
            Err(CardError::Config(_))
        ));
    }
}
