use thiserror::Error;

/// Unified result type for the card slot crate.
pub type Result<T> = std::result::Result<T, CardError>;

/// Caller contract violations. Space contention and widget faults are never
/// surfaced through this type; they become warnings and fault reports.
#[derive(Debug, Error)]
pub enum CardError {
    #[error("malformed card context: {0}")]
    MalformedContext(String),
    #[error("invalid layout settings: {0}")]
    InvalidSettings(String),
    #[error("zone `{0}` not found")]
    UnknownZone(String),
    #[error("slot position `{0}` not found")]
    UnknownPosition(String),
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}
