//! Error module orchestrator.

mod types;

pub use types::{CardError, Result};
