use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{CardError, Result};
use crate::geometry::Size;
use crate::settings::LayoutSettings;
use crate::widget::Widget;

/// One of the seven fixed perimeter positions. Declaration order is the
/// canonical ordering used wherever positions are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    LeftEdge,
    RightEdge,
    Footer,
}

impl SlotPosition {
    pub const ALL: [SlotPosition; 7] = [
        SlotPosition::TopLeft,
        SlotPosition::TopRight,
        SlotPosition::BottomLeft,
        SlotPosition::BottomRight,
        SlotPosition::LeftEdge,
        SlotPosition::RightEdge,
        SlotPosition::Footer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
            Self::LeftEdge => "left-edge",
            Self::RightEdge => "right-edge",
            Self::Footer => "footer",
        }
    }

    /// Human readable name used in generated accessibility labels.
    pub fn label(&self) -> &'static str {
        match self {
            Self::TopLeft => "top left",
            Self::TopRight => "top right",
            Self::BottomLeft => "bottom left",
            Self::BottomRight => "bottom right",
            Self::LeftEdge => "left edge",
            Self::RightEdge => "right edge",
            Self::Footer => "footer",
        }
    }

    pub fn is_corner(&self) -> bool {
        matches!(
            self,
            Self::TopLeft | Self::TopRight | Self::BottomLeft | Self::BottomRight
        )
    }

    pub fn is_edge(&self) -> bool {
        matches!(self, Self::LeftEdge | Self::RightEdge)
    }

    fn bit(&self) -> u8 {
        1 << (*self as u8)
    }
}

impl fmt::Display for SlotPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotPosition {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self> {
        SlotPosition::ALL
            .into_iter()
            .find(|position| position.as_str() == s)
            .ok_or_else(|| CardError::UnknownPosition(s.to_string()))
    }
}

/// Card size class. Ordered: compact < standard < xl.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CardSizeTier {
    Compact,
    #[default]
    Standard,
    Xl,
}

impl CardSizeTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Standard => "standard",
            Self::Xl => "xl",
        }
    }
}

/// Card state. Only ever used as a filter predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardState {
    #[default]
    Default,
    Running,
    Error,
    Disabled,
    Selected,
}

impl CardState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Running => "running",
            Self::Error => "error",
            Self::Disabled => "disabled",
            Self::Selected => "selected",
        }
    }
}

/// Logical layout region with its own space budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneId {
    Primary,
    Metadata,
    Overflow,
    Extended,
    Peripheral,
}

impl ZoneId {
    pub const ALL: [ZoneId; 5] = [
        ZoneId::Primary,
        ZoneId::Metadata,
        ZoneId::Overflow,
        ZoneId::Extended,
        ZoneId::Peripheral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Metadata => "metadata",
            Self::Overflow => "overflow",
            Self::Extended => "extended",
            Self::Peripheral => "peripheral",
        }
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoneId {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self> {
        ZoneId::ALL
            .into_iter()
            .find(|zone| zone.as_str() == s)
            .ok_or_else(|| CardError::UnknownZone(s.to_string()))
    }
}

/// Degrade path for a widget that does not fit at full size.
///
/// Policies arriving from configuration are kept verbatim when unrecognised so
/// the engine can report them instead of rejecting the whole manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FallbackPolicy {
    Hide,
    Truncate,
    Relocate,
    Collapse,
    Other(String),
}

impl FallbackPolicy {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Hide => "hide",
            Self::Truncate => "truncate",
            Self::Relocate => "relocate",
            Self::Collapse => "collapse",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for FallbackPolicy {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "hide" => Self::Hide,
            "truncate" => Self::Truncate,
            "relocate" => Self::Relocate,
            "collapse" => Self::Collapse,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for FallbackPolicy {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<FallbackPolicy> for String {
    fn from(policy: FallbackPolicy) -> Self {
        policy.as_str().to_string()
    }
}

/// A candidate widget for one allocation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetManifest {
    pub id: String,
    pub zone: ZoneId,
    pub priority: i32,
    pub footprint: Size,
    pub fallback: FallbackPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_zone: Option<ZoneId>,
}

impl WidgetManifest {
    pub fn new(id: impl Into<String>, zone: ZoneId, footprint: Size) -> Self {
        Self {
            id: id.into(),
            zone,
            priority: 0,
            footprint,
            fallback: FallbackPolicy::Hide,
            fallback_zone: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_fallback(mut self, fallback: impl Into<FallbackPolicy>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub fn with_fallback_zone(mut self, zone: ZoneId) -> Self {
        self.fallback_zone = Some(zone);
        self
    }

    /// Shorthand for the `relocate` policy with its destination.
    pub fn relocate_to(self, zone: ZoneId) -> Self {
        self.with_fallback(FallbackPolicy::Relocate)
            .with_fallback_zone(zone)
    }
}

/// Accessibility and motion preferences carried by the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub animations_enabled: bool,
    pub high_contrast: bool,
    pub reduced_motion: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            animations_enabled: true,
            high_contrast: false,
            reduced_motion: false,
        }
    }
}

/// Set of perimeter positions that currently want a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Occupancy(u8);

impl Occupancy {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, position: SlotPosition) {
        self.0 |= position.bit();
    }

    pub fn remove(&mut self, position: SlotPosition) {
        self.0 &= !position.bit();
    }

    pub fn with(mut self, position: SlotPosition) -> Self {
        self.insert(position);
        self
    }

    pub fn contains(&self, position: SlotPosition) -> bool {
        self.0 & position.bit() != 0
    }

    pub fn union(&self, other: Occupancy) -> Occupancy {
        Occupancy(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = SlotPosition> + '_ {
        SlotPosition::ALL
            .into_iter()
            .filter(move |position| self.contains(*position))
    }

    pub fn bits(&self) -> u8 {
        self.0
    }
}

impl FromIterator<SlotPosition> for Occupancy {
    fn from_iter<I: IntoIterator<Item = SlotPosition>>(iter: I) -> Self {
        let mut occupancy = Occupancy::empty();
        for position in iter {
            occupancy.insert(position);
        }
        occupancy
    }
}

/// Snapshot of everything the allocation pass needs to know about the card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardContext {
    pub size: CardSizeTier,
    pub state: CardState,
    pub dimensions: Size,
    pub occupancy: Occupancy,
    pub flags: FeatureFlags,
    pub has_description: bool,
}

impl CardContext {
    /// Context for `size` using the pixel dimensions configured for that tier.
    pub fn for_tier(size: CardSizeTier, settings: &LayoutSettings) -> Self {
        Self {
            size,
            state: CardState::Default,
            dimensions: settings.tier(size).dimensions,
            occupancy: Occupancy::empty(),
            flags: FeatureFlags::default(),
            has_description: false,
        }
    }

    pub fn with_state(mut self, state: CardState) -> Self {
        self.state = state;
        self
    }

    pub fn with_occupancy(mut self, occupancy: Occupancy) -> Self {
        self.occupancy = occupancy;
        self
    }

    pub fn with_flags(mut self, flags: FeatureFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_description(mut self, has_description: bool) -> Self {
        self.has_description = has_description;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.dimensions.is_valid() {
            return Err(CardError::MalformedContext(format!(
                "dimensions must be finite and non-negative, got {}x{}",
                self.dimensions.width, self.dimensions.height
            )));
        }
        Ok(())
    }
}

/// Rendering hints. They never influence allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PerformanceHints {
    pub lazy_load: bool,
    pub memoize: bool,
    pub render_priority: Option<i32>,
}

/// Per-position widget configuration, supplied inline or through the registry.
#[derive(Clone)]
pub struct SlotConfig {
    pub widget: Arc<dyn Widget>,
    pub supported_sizes: Option<Vec<CardSizeTier>>,
    pub supported_states: Option<Vec<CardState>>,
    pub requires_animation: bool,
    pub hints: PerformanceHints,
    pub manifest: Option<WidgetManifest>,
    /// Style hook forwarded to the widget as `class_name`.
    pub class_name: Option<String>,
    /// Replaces the generated accessibility label.
    pub aria_label: Option<String>,
}

pub type SlotMap = BTreeMap<SlotPosition, SlotConfig>;

impl SlotConfig {
    pub fn new(widget: Arc<dyn Widget>) -> Self {
        Self {
            widget,
            supported_sizes: None,
            supported_states: None,
            requires_animation: false,
            hints: PerformanceHints::default(),
            manifest: None,
            class_name: None,
            aria_label: None,
        }
    }

    pub fn with_sizes(mut self, sizes: impl IntoIterator<Item = CardSizeTier>) -> Self {
        self.supported_sizes = Some(sizes.into_iter().collect());
        self
    }

    pub fn with_states(mut self, states: impl IntoIterator<Item = CardState>) -> Self {
        self.supported_states = Some(states.into_iter().collect());
        self
    }

    pub fn requiring_animation(mut self) -> Self {
        self.requires_animation = true;
        self
    }

    pub fn with_hints(mut self, hints: PerformanceHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_aria_label(mut self, label: impl Into<String>) -> Self {
        self.aria_label = Some(label.into());
        self
    }

    pub fn with_manifest(mut self, manifest: WidgetManifest) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Manifest used for allocation: the explicit one if configured, otherwise
    /// one derived from the position and the tier's budgets.
    pub fn manifest_for(
        &self,
        position: SlotPosition,
        context: &CardContext,
        settings: &LayoutSettings,
    ) -> WidgetManifest {
        if let Some(manifest) = &self.manifest {
            return manifest.clone();
        }

        let metrics = settings.tier(context.size);
        let budget = metrics.peripheral_budget;
        let id = format!("{}.{}", position, self.widget.name());
        let manifest = match position {
            SlotPosition::Footer => WidgetManifest::new(
                id,
                ZoneId::Metadata,
                Size::new(context.dimensions.width / 3.0, metrics.metadata_height),
            )
            .with_priority(30)
            .with_fallback(FallbackPolicy::Truncate),
            corner if corner.is_corner() => {
                WidgetManifest::new(id, ZoneId::Peripheral, Size::new(budget, budget))
                    .with_priority(60)
                    .with_fallback(FallbackPolicy::Collapse)
            }
            _ => WidgetManifest::new(id, ZoneId::Peripheral, Size::new(budget, budget))
                .with_priority(40)
                .with_fallback(FallbackPolicy::Hide),
        };

        match self.hints.render_priority {
            Some(priority) => manifest.with_priority(priority),
            None => manifest,
        }
    }
}

impl fmt::Debug for SlotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotConfig")
            .field("widget", &self.widget.name())
            .field("supported_sizes", &self.supported_sizes)
            .field("supported_states", &self.supported_states)
            .field("requires_animation", &self.requires_animation)
            .field("hints", &self.hints)
            .field("manifest", &self.manifest)
            .field("class_name", &self.class_name)
            .field("aria_label", &self.aria_label)
            .finish()
    }
}
