//! Display width helpers used when generating accessibility labels.

mod utils;

pub use utils::{clip_to_width, display_width};
