//! Transition and animation lifecycle engine.
//!
//! This crate provides:
//! - **Transition sessions**: the enter/exit state machine driven by a
//!   visibility intent, with one cancellable timer per session
//! - **Presence**: mount/unmount decisions and keyed enter/exit groups
//! - **Keyframe driver**: named or literal keyframe animations on a host,
//!   at most one per target
//! - **Presets**: built-in timing and keyframe tables
//! - **Effects**: fade, slide, zoom and collapse style deltas
//!
//! # Architecture
//!
//! ```text
//! TransitionSession ──schedules──> Clock (FrameClock)
//!   ├── Presence / PresenceGroup   (should it render?)
//!   └── Effect                     (what style does the state imply?)
//!
//! KeyframeDriver ──plays──> AnimationHost (Timeline)
//!   └── AnimationHandle per target
//! ```
//!
//! Everything is single-threaded: the host owns time and advances the clock
//! and timeline once per frame.

pub mod clock;
pub mod driver;
pub mod easing;
pub mod effects;
pub mod error;
pub mod events;
pub mod interpolate;
pub mod keyframes;
pub mod node_ref;
pub mod presence;
pub mod presets;
pub mod style;
pub mod timeline;
pub mod transition;
pub mod variants;

pub use clock::{Clock, FrameClock, TimerHandle};
pub use driver::{AnimationCallbacks, AnimationHandle, AnimationHost, HandleStatus, KeyframeDriver};
pub use easing::{EasingFunction, StepPosition};
pub use effects::{Collapse, Effect, Fade, Slide, SlideDirection, Zoom};
pub use error::{MotionError, Result};
pub use events::{AnimationEvent, EventQueue, MotionEvent, SharedEventQueue, TransitionEvent};
pub use interpolate::Interpolate;
pub use keyframes::{
    AnimationDirection, AnimationFillMode, AnimationId, AnimationOptions, AnimationPlayState,
    IterationCount, Playback, PlaybackState,
};
pub use node_ref::{merge_refs, MergedRef, NodeRef, TargetId};
pub use presence::{should_render, Presence, PresenceGroup, PresencePolicy, RenderTarget, Rendered};
pub use presets::{
    css_multi_transition, css_transition, resolve_keyframes, resolve_timing, Keyframe,
    KeyframeSequence, KeyframesRef, TimingPreset, TimingRef,
};
pub use style::{merge_styles, LengthUnit, StyleProperty, StyleSnapshot, StyleValue};
pub use timeline::Timeline;
pub use transition::{
    next_state, LifecycleState, SessionId, TimeoutSpec, TransitionCallbacks, TransitionConfig,
    TransitionDirection, TransitionOutput, TransitionSession,
};
pub use variants::{InteractionState, MotionVariants};
