//! Widget contract: what every placeable complication accepts and emits.

mod core;

pub use core::{CardInfo, RenderedOutput, StaticWidget, Widget, WidgetError, WidgetProps};
