//! Preset registry: named timing parameters and keyframe sequences.
//!
//! Presets are immutable, built-in data. Callers refer to them by name or
//! supply a literal value; literals pass through resolution untouched while
//! unknown names are rejected with a [`MotionError`] so a typo never turns
//! into a silent default.
//!
//! ```
//! use glide_motion::presets::{resolve_timing, resolve_keyframes, TimingRef};
//!
//! let slide = resolve_timing(&TimingRef::from("slide")).unwrap();
//! assert_eq!(slide.duration_ms, 300);
//! assert!(resolve_keyframes(&"fadeIn".into()).is_ok());
//! assert!(resolve_timing(&"slidee".into()).is_err());
//! ```

use serde::{Deserialize, Serialize};

use crate::easing::EasingFunction;
use crate::error::{MotionError, Result};
use crate::interpolate::Interpolate;
use crate::style::{StyleProperty, StyleSnapshot, StyleValue};

/// Duration, curve and delay for one transition or animation iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingPreset {
    pub duration_ms: u32,
    #[serde(default)]
    pub easing: EasingFunction,
    #[serde(default)]
    pub delay_ms: u32,
}

impl Default for TimingPreset {
    fn default() -> Self {
        Self::new(300, EasingFunction::Ease)
    }
}

impl TimingPreset {
    pub const fn new(duration_ms: u32, easing: EasingFunction) -> Self {
        Self { duration_ms, easing, delay_ms: 0 }
    }

    pub const fn with_delay(mut self, delay_ms: u32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub const fn with_duration(mut self, duration_ms: u32) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Same curve, no time: what reduced-motion mode plays.
    pub const fn instant(self) -> Self {
        Self { duration_ms: 0, easing: self.easing, delay_ms: 0 }
    }

    /// Raise the duration to at least `min_ms` (photosensitivity-safe pacing).
    pub fn clamped_min(self, min_ms: u32) -> Self {
        self.with_duration(self.duration_ms.max(min_ms))
    }
}

const fn bezier(x1: f32, y1: f32, x2: f32, y2: f32) -> EasingFunction {
    EasingFunction::CubicBezier { x1, y1, x2, y2 }
}

/// Names accepted by [`resolve_timing`].
pub const TIMING_PRESET_NAMES: &[&str] = &[
    "default", "fast", "slow", "linear", "ease", "ease-in", "ease-out", "ease-in-out", "bounce",
    "spring", "fade", "slide", "zoom", "collapse",
];

/// Look up a built-in timing preset.
pub fn builtin_timing(name: &str) -> Option<TimingPreset> {
    let preset = match name {
        "default" | "ease" => TimingPreset::new(300, EasingFunction::Ease),
        "fast" => TimingPreset::new(150, EasingFunction::EaseOut),
        "slow" => TimingPreset::new(500, EasingFunction::EaseInOut),
        "linear" => TimingPreset::new(300, EasingFunction::Linear),
        "ease-in" => TimingPreset::new(300, EasingFunction::EaseIn),
        "ease-out" => TimingPreset::new(300, EasingFunction::EaseOut),
        "ease-in-out" => TimingPreset::new(300, EasingFunction::EaseInOut),
        "bounce" => TimingPreset::new(500, bezier(0.68, -0.55, 0.265, 1.55)),
        "spring" => TimingPreset::new(400, bezier(0.175, 0.885, 0.32, 1.275)),
        "fade" => TimingPreset::new(200, EasingFunction::EaseInOut),
        "slide" => TimingPreset::new(300, bezier(0.4, 0.0, 0.2, 1.0)),
        "zoom" => TimingPreset::new(250, EasingFunction::EaseOut),
        "collapse" => TimingPreset::new(300, EasingFunction::EaseInOut),
        _ => return None,
    };
    Some(preset)
}

/// A timing preset referenced by name or given literally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimingRef {
    Named(String),
    Literal(TimingPreset),
}

impl Default for TimingRef {
    fn default() -> Self {
        Self::Named("default".to_string())
    }
}

impl From<&str> for TimingRef {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<TimingPreset> for TimingRef {
    fn from(preset: TimingPreset) -> Self {
        Self::Literal(preset)
    }
}

/// Resolve a timing reference. Unknown names are a configuration error.
pub fn resolve_timing(timing: &TimingRef) -> Result<TimingPreset> {
    match timing {
        TimingRef::Literal(preset) => Ok(*preset),
        TimingRef::Named(name) => {
            builtin_timing(name).ok_or_else(|| MotionError::UnknownTimingPreset(name.clone()))
        }
    }
}

/// Render a CSS `transition` entry, e.g. `opacity 300ms ease 50ms`.
pub fn css_transition(property: &str, preset: &TimingPreset) -> String {
    let mut out = format!("{property} {}ms {}", preset.duration_ms, preset.easing);
    if preset.delay_ms > 0 {
        out.push_str(&format!(" {}ms", preset.delay_ms));
    }
    out
}

/// Render a comma-separated `transition` list for several properties.
pub fn css_multi_transition(entries: &[(&str, TimingPreset)]) -> String {
    entries
        .iter()
        .map(|(property, preset)| css_transition(property, preset))
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Keyframes
// ============================================================================

/// One step of a keyframe sequence.
///
/// `offset` is `None` when the frame was given without a position; such
/// frames are spaced evenly between their positioned neighbours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    #[serde(default)]
    pub offset: Option<f32>,
    pub style: StyleSnapshot,
    /// Curve used for the segment leading into this frame.
    #[serde(default)]
    pub easing: Option<EasingFunction>,
}

impl Keyframe {
    pub fn new(offset: Option<f32>, style: StyleSnapshot) -> Self {
        Self { offset: offset.map(|o| o.clamp(0.0, 1.0)), style, easing: None }
    }

    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = Some(easing);
        self
    }

    /// The frame's position as written in a stylesheet.
    pub fn label(&self) -> String {
        match self.offset {
            Some(o) if o == 0.0 => "from".to_string(),
            Some(o) if o == 1.0 => "to".to_string(),
            Some(o) => format!("{}%", o * 100.0),
            None => "auto".to_string(),
        }
    }
}

/// Parse `from`, `to` or `NN%` into an offset in `[0, 1]`.
pub fn parse_offset_label(label: &str) -> Result<f32> {
    let invalid = || MotionError::InvalidOffsetLabel(label.to_string());
    match label.trim() {
        "from" => Ok(0.0),
        "to" => Ok(1.0),
        other => {
            let pct = other
                .strip_suffix('%')
                .and_then(|n| n.trim().parse::<f32>().ok())
                .ok_or_else(invalid)?;
            if !(0.0..=100.0).contains(&pct) {
                return Err(invalid());
            }
            Ok(pct / 100.0)
        }
    }
}

/// An ordered list of style snapshots describing an animation path.
///
/// Frame order is kept exactly as given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyframeSequence {
    pub frames: Vec<Keyframe>,
}

impl KeyframeSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame positioned by a stylesheet label.
    pub fn frame(mut self, label: &str, style: StyleSnapshot) -> Result<Self> {
        let offset = parse_offset_label(label)?;
        self.frames.push(Keyframe::new(Some(offset), style));
        Ok(self)
    }

    /// Append a frame at a numeric offset.
    pub fn at(mut self, offset: f32, style: StyleSnapshot) -> Self {
        self.frames.push(Keyframe::new(Some(offset), style));
        self
    }

    /// Append a frame without an explicit position.
    pub fn then(mut self, style: StyleSnapshot) -> Self {
        self.frames.push(Keyframe::new(None, style));
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Every property touched by any frame.
    pub fn animated_properties(&self) -> Vec<StyleProperty> {
        let mut props: Vec<StyleProperty> =
            self.frames.iter().flat_map(|f| f.style.properties()).collect();
        props.sort();
        props.dedup();
        props
    }

    /// Offsets with unpositioned frames filled in.
    ///
    /// A missing first offset is 0, a missing last offset is 1, and runs of
    /// missing offsets in between are spread evenly across their gap.
    pub fn computed_offsets(&self) -> Vec<f32> {
        let n = self.frames.len();
        let mut offsets: Vec<Option<f32>> = self.frames.iter().map(|f| f.offset).collect();
        if n == 0 {
            return Vec::new();
        }
        if offsets[0].is_none() {
            offsets[0] = Some(if n == 1 { 1.0 } else { 0.0 });
        }
        if n > 1 && offsets[n - 1].is_none() {
            offsets[n - 1] = Some(1.0);
        }

        let mut start = 0;
        while start < n {
            let Some(end) = (start + 1..n).find(|&i| offsets[i].is_some()) else {
                break;
            };
            let (a, b) = (offsets[start].unwrap_or(0.0), offsets[end].unwrap_or(1.0));
            let gap = (end - start) as f32;
            for (k, slot) in offsets[start + 1..end].iter_mut().enumerate() {
                *slot = Some(a + (b - a) * (k as f32 + 1.0) / gap);
            }
            start = end;
        }

        offsets.into_iter().map(|o| o.unwrap_or(1.0)).collect()
    }

    /// Sample the style at iteration progress `progress` in `[0, 1]`.
    pub fn sample(&self, progress: f32) -> StyleSnapshot {
        let offsets = self.computed_offsets();
        let Some(last) = self.frames.len().checked_sub(1) else {
            return StyleSnapshot::new();
        };
        let progress = progress.clamp(0.0, 1.0);

        if progress <= offsets[0] {
            return self.frames[0].style.clone();
        }
        if progress >= offsets[last] {
            return self.frames[last].style.clone();
        }

        // The segment [i, i + 1] bracketing `progress`; ties take the later frame.
        let i = (0..last)
            .rev()
            .find(|&i| offsets[i] <= progress)
            .unwrap_or(0);
        let (from, to) = (&self.frames[i], &self.frames[i + 1]);
        let span = offsets[i + 1] - offsets[i];
        let local = if span > 0.0 { (progress - offsets[i]) / span } else { 1.0 };
        let local = to.easing.map_or(local, |e| e.evaluate(local));
        from.style.interpolate(&to.style, local)
    }
}

/// Names accepted by [`resolve_keyframes`].
pub const KEYFRAME_NAMES: &[&str] = &[
    "fadeIn", "fadeOut", "slideInUp", "slideInDown", "slideInLeft", "slideInRight", "slideOutUp",
    "slideOutDown", "zoomIn", "zoomOut", "pulse", "shake", "bounce", "spin",
];

fn opacity(v: f64) -> StyleSnapshot {
    StyleSnapshot::new().with(StyleProperty::Opacity, v)
}

fn slide(property: StyleProperty, from_pct: f64, to_pct: f64, fade_in: bool) -> KeyframeSequence {
    let (a, b) = if fade_in { (0.0, 1.0) } else { (1.0, 0.0) };
    KeyframeSequence::new()
        .at(0.0, opacity(a).with(property, StyleValue::percent(from_pct)))
        .at(1.0, opacity(b).with(property, StyleValue::percent(to_pct)))
}

fn shift_x(px: f64) -> StyleSnapshot {
    StyleSnapshot::new().with(StyleProperty::TranslateX, StyleValue::px(px))
}

fn shift_y(px: f64) -> StyleSnapshot {
    StyleSnapshot::new().with(StyleProperty::TranslateY, StyleValue::px(px))
}

/// Look up a built-in keyframe sequence.
pub fn builtin_keyframes(name: &str) -> Option<KeyframeSequence> {
    use StyleProperty::{Rotate, Scale, TranslateX, TranslateY};

    let sequence = match name {
        "fadeIn" => KeyframeSequence::new().at(0.0, opacity(0.0)).at(1.0, opacity(1.0)),
        "fadeOut" => KeyframeSequence::new().at(0.0, opacity(1.0)).at(1.0, opacity(0.0)),
        "slideInUp" => slide(TranslateY, 100.0, 0.0, true),
        "slideInDown" => slide(TranslateY, -100.0, 0.0, true),
        "slideInLeft" => slide(TranslateX, -100.0, 0.0, true),
        "slideInRight" => slide(TranslateX, 100.0, 0.0, true),
        "slideOutUp" => slide(TranslateY, 0.0, -100.0, false),
        "slideOutDown" => slide(TranslateY, 0.0, 100.0, false),
        "zoomIn" => KeyframeSequence::new()
            .at(0.0, opacity(0.0).with(Scale, 0.5))
            .at(1.0, opacity(1.0).with(Scale, 1.0)),
        "zoomOut" => KeyframeSequence::new()
            .at(0.0, opacity(1.0).with(Scale, 1.0))
            .at(1.0, opacity(0.0).with(Scale, 0.5)),
        "pulse" => KeyframeSequence::new()
            .at(0.0, StyleSnapshot::new().with(Scale, 1.0))
            .at(0.5, StyleSnapshot::new().with(Scale, 1.05))
            .at(1.0, StyleSnapshot::new().with(Scale, 1.0)),
        "shake" => KeyframeSequence::new()
            .at(0.0, shift_x(0.0))
            .at(0.25, shift_x(-10.0))
            .at(0.5, shift_x(10.0))
            .at(0.75, shift_x(-10.0))
            .at(1.0, shift_x(0.0)),
        "bounce" => KeyframeSequence::new()
            .at(0.0, shift_y(0.0))
            .at(0.4, shift_y(-20.0))
            .at(0.6, shift_y(-10.0))
            .at(1.0, shift_y(0.0)),
        "spin" => KeyframeSequence::new()
            .at(0.0, StyleSnapshot::new().with(Rotate, StyleValue::deg(0.0)))
            .at(1.0, StyleSnapshot::new().with(Rotate, StyleValue::deg(360.0))),
        _ => return None,
    };
    Some(sequence)
}

/// A keyframe sequence referenced by name or given literally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyframesRef {
    Named(String),
    Literal(KeyframeSequence),
}

impl From<&str> for KeyframesRef {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<KeyframeSequence> for KeyframesRef {
    fn from(sequence: KeyframeSequence) -> Self {
        Self::Literal(sequence)
    }
}

/// Resolve a keyframe reference. Unknown names are a configuration error;
/// literal sequences pass through unchanged.
pub fn resolve_keyframes(keyframes: &KeyframesRef) -> Result<KeyframeSequence> {
    match keyframes {
        KeyframesRef::Literal(sequence) => Ok(sequence.clone()),
        KeyframesRef::Named(name) => {
            builtin_keyframes(name).ok_or_else(|| MotionError::UnknownKeyframes(name.clone()))
        }
    }
}

static_assertions::assert_impl_all!(TimingPreset: Send, Sync, Copy);
static_assertions::assert_impl_all!(KeyframeSequence: Send, Sync);
