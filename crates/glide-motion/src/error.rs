//! Error types for preset resolution and keyframe parsing.

use thiserror::Error;

/// Result type for motion operations.
pub type Result<T> = std::result::Result<T, MotionError>;

/// Errors raised while resolving motion configuration.
///
/// These are configuration errors: they surface at resolution time so a
/// misspelled preset name is caught before any timer is scheduled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MotionError {
    /// A named timing preset is not part of the built-in registry.
    #[error("unknown timing preset: {0}")]
    UnknownTimingPreset(String),

    /// A named keyframe sequence is not part of the built-in registry.
    #[error("unknown keyframe sequence: {0}")]
    UnknownKeyframes(String),

    /// A keyframe offset label is neither `from`, `to` nor a percentage.
    #[error("invalid keyframe offset label: {0}")]
    InvalidOffsetLabel(String),

    /// An easing identifier could not be parsed.
    #[error("invalid easing: {0}")]
    InvalidEasing(String),

    /// A keyframe sequence with no frames was supplied.
    #[error("keyframe sequence has no frames")]
    EmptyKeyframes,
}
