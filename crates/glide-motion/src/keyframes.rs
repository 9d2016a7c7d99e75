//! Keyframe playback: iteration, direction, fill mode and play state.
//!
//! This module provides:
//! - `AnimationOptions`: iteration count, direction, fill mode, autoplay
//! - `Playback`: runtime state for one keyframe sequence on one target
//!
//! Playback follows CSS `animation` semantics: the timing delay precedes
//! the first iteration, the easing curve applies to each iteration's
//! directed progress, and fill mode decides what is applied before the
//! delay elapses and after the last iteration ends.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::node_ref::TargetId;
use crate::presets::{KeyframeSequence, TimingPreset};
use crate::style::StyleSnapshot;

/// Unique identifier for an animation instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnimationId(pub u64);

impl AnimationId {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for AnimationId {
    fn default() -> Self {
        Self::new()
    }
}

/// How many times an animation plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IterationCount {
    Count(NonZeroU32),
    Infinite,
}

impl Default for IterationCount {
    fn default() -> Self {
        Self::Count(NonZeroU32::MIN)
    }
}

impl IterationCount {
    /// `None` for zero.
    pub fn count(n: u32) -> Option<Self> {
        NonZeroU32::new(n).map(Self::Count)
    }

    /// Total iterations, or `None` if infinite.
    pub fn total(self) -> Option<u32> {
        match self {
            Self::Count(n) => Some(n.get()),
            Self::Infinite => None,
        }
    }
}

/// Direction of playback per iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationDirection {
    #[default]
    Normal,
    Reverse,
    Alternate,
    AlternateReverse,
}

impl AnimationDirection {
    /// Whether iteration `iteration` (0-indexed) plays backward.
    pub fn is_reversed(self, iteration: u32) -> bool {
        match self {
            Self::Normal => false,
            Self::Reverse => true,
            Self::Alternate => iteration % 2 == 1,
            Self::AlternateReverse => iteration % 2 == 0,
        }
    }
}

/// What is applied outside the active interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationFillMode {
    None,
    Forwards,
    Backwards,
    #[default]
    Both,
}

impl AnimationFillMode {
    /// First frame applied during the delay.
    pub fn applies_backwards(self) -> bool {
        matches!(self, Self::Backwards | Self::Both)
    }

    /// Final frame retained after the last iteration.
    pub fn applies_forwards(self) -> bool {
        matches!(self, Self::Forwards | Self::Both)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationPlayState {
    #[default]
    Running,
    Paused,
}

/// Playback options for one keyframe animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationOptions {
    pub iterations: IterationCount,
    pub direction: AnimationDirection,
    pub fill_mode: AnimationFillMode,
    /// Start running immediately; otherwise the animation starts paused.
    pub autoplay: bool,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            iterations: IterationCount::default(),
            direction: AnimationDirection::Normal,
            fill_mode: AnimationFillMode::Both,
            autoplay: true,
        }
    }
}

impl AnimationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iterations(mut self, iterations: IterationCount) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn direction(mut self, direction: AnimationDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn fill_mode(mut self, fill_mode: AnimationFillMode) -> Self {
        self.fill_mode = fill_mode;
        self
    }

    pub fn autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }
}

/// Lifecycle of a playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Waiting out the delay.
    #[default]
    Pending,
    Running,
    Finished,
    Cancelled,
}

/// Runtime state of one keyframe animation on one target.
#[derive(Debug, Clone)]
pub struct Playback {
    pub id: AnimationId,
    pub target: TargetId,
    pub sequence: KeyframeSequence,
    pub timing: TimingPreset,
    pub options: AnimationOptions,
    /// Time since start in milliseconds, excluding paused time.
    pub elapsed_ms: f64,
    pub state: PlaybackState,
    pub play_state: AnimationPlayState,
}

impl Playback {
    pub fn new(
        target: TargetId,
        sequence: KeyframeSequence,
        timing: TimingPreset,
        options: AnimationOptions,
    ) -> Self {
        let play_state = if options.autoplay {
            AnimationPlayState::Running
        } else {
            AnimationPlayState::Paused
        };
        let mut playback = Self {
            id: AnimationId::new(),
            target,
            sequence,
            timing,
            options,
            elapsed_ms: 0.0,
            state: PlaybackState::Pending,
            play_state,
        };
        playback.refresh_state();
        playback
    }

    fn duration(&self) -> f64 {
        f64::from(self.timing.duration_ms)
    }

    fn active_ms(&self) -> f64 {
        self.elapsed_ms - f64::from(self.timing.delay_ms)
    }

    /// Length of the active interval, `None` when infinite.
    ///
    /// A zero-length iteration gives a zero active interval even when
    /// repeating forever.
    pub fn active_duration_ms(&self) -> Option<f64> {
        if self.timing.duration_ms == 0 {
            return Some(0.0);
        }
        self.options
            .iterations
            .total()
            .map(|n| f64::from(n) * self.duration())
    }

    /// Current iteration index (0-based), clamped to the last iteration.
    pub fn current_iteration(&self) -> u32 {
        let duration = self.duration();
        if duration <= 0.0 {
            return self.last_iteration();
        }
        let iteration = (self.active_ms().max(0.0) / duration).floor() as u32;
        iteration.min(self.last_iteration())
    }

    fn last_iteration(&self) -> u32 {
        self.options.iterations.total().map_or(u32::MAX, |n| n - 1)
    }

    /// Directed, eased progress of the current iteration, or `None` when
    /// nothing applies (delay without backwards fill, end without forwards
    /// fill, cancelled).
    pub fn current_progress(&self) -> Option<f32> {
        let direction = self.options.direction;
        match self.state {
            PlaybackState::Cancelled => None,
            PlaybackState::Pending => self.options.fill_mode.applies_backwards().then(|| {
                let start = if direction.is_reversed(0) { 1.0 } else { 0.0 };
                self.timing.easing.evaluate(start)
            }),
            PlaybackState::Finished => self.options.fill_mode.applies_forwards().then(|| {
                let end = if direction.is_reversed(self.last_iteration()) { 0.0 } else { 1.0 };
                self.timing.easing.evaluate(end)
            }),
            PlaybackState::Running => {
                let duration = self.duration();
                let local = if duration <= 0.0 {
                    1.0
                } else {
                    ((self.active_ms().max(0.0) / duration).fract()) as f32
                };
                let directed = if direction.is_reversed(self.current_iteration()) {
                    1.0 - local
                } else {
                    local
                };
                Some(self.timing.easing.evaluate(directed))
            }
        }
    }

    /// Style this playback applies right now.
    pub fn current_style(&self) -> Option<StyleSnapshot> {
        self.current_progress().map(|p| self.sequence.sample(p))
    }

    /// Advance by `delta_ms`. Returns `true` while still active.
    pub fn update(&mut self, delta_ms: f64) -> bool {
        if !self.is_active() {
            return false;
        }
        if self.play_state == AnimationPlayState::Paused {
            return true;
        }
        self.elapsed_ms += delta_ms.max(0.0);
        self.refresh_state();
        self.is_active()
    }

    fn refresh_state(&mut self) {
        // A paused playback holds its state until resumed.
        if !self.is_active() || self.play_state == AnimationPlayState::Paused {
            return;
        }
        let active = self.active_ms();
        if active < 0.0 {
            self.state = PlaybackState::Pending;
            return;
        }
        self.state = match self.active_duration_ms() {
            Some(total) if active >= total => PlaybackState::Finished,
            _ => PlaybackState::Running,
        };
    }

    pub fn pause(&mut self) {
        self.play_state = AnimationPlayState::Paused;
    }

    pub fn resume(&mut self) {
        self.play_state = AnimationPlayState::Running;
    }

    pub fn cancel(&mut self) {
        self.state = PlaybackState::Cancelled;
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, PlaybackState::Pending | PlaybackState::Running)
    }

    pub fn is_finished(&self) -> bool {
        self.state == PlaybackState::Finished
    }

    pub fn is_paused(&self) -> bool {
        self.is_active() && self.play_state == AnimationPlayState::Paused
    }
}
