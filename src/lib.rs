//! Glide: transition lifecycle and keyframe animation engine for UI surfaces.
//!
//! This crate re-exports the engine (`glide-motion`) and its configuration
//! layer (`glide-config`).

pub use glide_config as config;
pub use glide_motion as motion;
