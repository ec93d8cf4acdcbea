use std::fmt;
use std::time::SystemTime;

use serde::Serialize;
use thiserror::Error;

use crate::fault::{ErrorCallback, FaultReport};
use crate::manifest::{CardSizeTier, CardState, FeatureFlags, SlotPosition};
use crate::width::clip_to_width;

const MAX_LABEL_WIDTH: usize = 64;

/// Failure raised by a widget's own render logic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct WidgetError(pub String);

impl From<&str> for WidgetError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

impl From<String> for WidgetError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

/// Card-level identity the host passes through to every widget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CardInfo {
    pub id: String,
    pub title: String,
    pub focused: bool,
    pub last_state_change: Option<SystemTime>,
}

impl CardInfo {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            focused: false,
            last_state_change: None,
        }
    }
}

/// Inputs handed to a widget's render call.
#[derive(Clone)]
pub struct WidgetProps {
    pub card_id: String,
    pub card_state: CardState,
    pub card_size: CardSizeTier,
    pub card_title: String,
    pub focused: bool,
    pub last_state_change: Option<SystemTime>,
    pub flags: FeatureFlags,
    pub position: SlotPosition,
    pub visible: bool,
    pub class_name: Option<String>,
    pub aria_label: Option<String>,
    /// Host error callback, for failures a widget handles itself.
    pub on_error: Option<ErrorCallback>,
}

impl WidgetProps {
    /// Report a failure the widget recovered from on its own. The report is
    /// tagged with this slot's position. Returns `false` when no callback is
    /// attached.
    pub fn report_error(&self, error: impl Into<String>) -> bool {
        match &self.on_error {
            Some(callback) => {
                callback(&FaultReport::new(self.position, error.into()));
                true
            }
            None => false,
        }
    }

    /// The override if one was supplied, otherwise a label generated from the
    /// card title and the position.
    pub fn accessible_label(&self) -> String {
        if let Some(label) = &self.aria_label {
            return label.clone();
        }
        let title = if self.card_title.is_empty() {
            "Card"
        } else {
            self.card_title.as_str()
        };
        clip_to_width(
            &format!("{title}: {} indicator", self.position.label()),
            MAX_LABEL_WIDTH,
        )
    }
}

impl fmt::Debug for WidgetProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetProps")
            .field("card_id", &self.card_id)
            .field("card_state", &self.card_state)
            .field("card_size", &self.card_size)
            .field("card_title", &self.card_title)
            .field("focused", &self.focused)
            .field("last_state_change", &self.last_state_change)
            .field("flags", &self.flags)
            .field("position", &self.position)
            .field("visible", &self.visible)
            .field("class_name", &self.class_name)
            .field("aria_label", &self.aria_label)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Visual output of one widget render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedOutput {
    pub content: String,
    pub aria_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

impl RenderedOutput {
    pub fn new(content: impl Into<String>, props: &WidgetProps) -> Self {
        Self {
            content: content.into(),
            aria_label: props.accessible_label(),
            class_name: props.class_name.clone(),
        }
    }
}

/// A placeable complication.
///
/// Implementations do not need to guard against their own failures; the
/// fault boundary around each slot catches both returned errors and panics.
pub trait Widget: Send + Sync {
    fn name(&self) -> &str {
        "widget"
    }

    fn render(&self, props: &WidgetProps) -> Result<RenderedOutput, WidgetError>;

    /// View shown in place of the widget after a failure.
    fn fallback(&self, _report: &FaultReport, _props: &WidgetProps) -> Option<RenderedOutput> {
        None
    }

    /// Deferred widgets report `false` until their content has resolved.
    fn is_ready(&self) -> bool {
        true
    }
}

/// Widget that always renders the same text.
#[derive(Debug, Clone)]
pub struct StaticWidget {
    name: String,
    content: String,
}

impl StaticWidget {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

impl Widget for StaticWidget {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, props: &WidgetProps) -> Result<RenderedOutput, WidgetError> {
        Ok(RenderedOutput::new(self.content.clone(), props))
    }
}
