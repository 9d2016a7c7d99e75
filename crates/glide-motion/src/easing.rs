//! Timing curves for transitions and keyframe animations.
//!
//! Curves are addressed by their CSS identifiers so presets and config files
//! can spell them the way a stylesheet would:
//! - `linear`
//! - `ease`, `ease-in`, `ease-out`, `ease-in-out`
//! - `cubic-bezier(x1, y1, x2, y2)`
//! - `steps(n[, position])`, `step-start`, `step-end`
//!
//! # Usage
//!
//! ```
//! use glide_motion::easing::EasingFunction;
//!
//! let ease: EasingFunction = "ease-in-out".parse().unwrap();
//! assert!((ease.evaluate(0.5) - 0.5).abs() < 0.001);
//! assert_eq!(ease.to_string(), "ease-in-out");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MotionError, Result};

/// Where the jump happens inside each interval of a stepped curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepPosition {
    /// `jump-start`: jump at the start of each interval.
    Start,
    /// `jump-end`: jump at the end of each interval.
    #[default]
    End,
    /// `jump-both`: jump at both ends.
    Both,
    /// `jump-none`: hold both ends.
    None,
}

impl StepPosition {
    fn keyword(self) -> &'static str {
        match self {
            Self::Start => "jump-start",
            Self::End => "jump-end",
            Self::Both => "jump-both",
            Self::None => "jump-none",
        }
    }

    fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "jump-start" | "start" => Some(Self::Start),
            "jump-end" | "end" => Some(Self::End),
            "jump-both" => Some(Self::Both),
            "jump-none" => Some(Self::None),
            _ => None,
        }
    }
}

/// A timing curve mapping linear progress in `[0, 1]` to eased progress.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EasingFunction {
    /// No easing.
    Linear,
    /// `cubic-bezier(0.25, 0.1, 0.25, 1.0)`.
    #[default]
    Ease,
    /// `cubic-bezier(0.42, 0, 1, 1)`.
    EaseIn,
    /// `cubic-bezier(0, 0, 0.58, 1)`.
    EaseOut,
    /// `cubic-bezier(0.42, 0, 0.58, 1)`.
    EaseInOut,
    /// Custom curve; `x1` and `x2` lie in `[0, 1]`.
    CubicBezier { x1: f32, y1: f32, x2: f32, y2: f32 },
    /// Discrete jumps; `count >= 1`.
    Steps { count: u32, position: StepPosition },
}

impl EasingFunction {
    /// Evaluate the curve at `t`, clamped to `[0, 1]`.
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Self::Linear => t,
            Self::Ease => cubic_bezier(0.25, 0.1, 0.25, 1.0, t),
            Self::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            Self::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            Self::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(x1, y1, x2, y2, t),
            Self::Steps { count, position } => stepped(count, position, t),
        }
    }

    /// Build a custom bezier curve, rejecting control points whose x lies
    /// outside `[0, 1]`.
    pub fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&x1) || !(0.0..=1.0).contains(&x2) {
            return Err(MotionError::InvalidEasing(format!(
                "cubic-bezier x values must be in [0, 1], got {x1} and {x2}"
            )));
        }
        Ok(Self::CubicBezier { x1, y1, x2, y2 })
    }

    /// Build a stepped curve with at least one step.
    pub fn steps(count: u32, position: StepPosition) -> Result<Self> {
        if count == 0 {
            return Err(MotionError::InvalidEasing("steps() needs at least 1 step".into()));
        }
        Ok(Self::Steps { count, position })
    }
}

impl fmt::Display for EasingFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => f.write_str("linear"),
            Self::Ease => f.write_str("ease"),
            Self::EaseIn => f.write_str("ease-in"),
            Self::EaseOut => f.write_str("ease-out"),
            Self::EaseInOut => f.write_str("ease-in-out"),
            Self::CubicBezier { x1, y1, x2, y2 } => {
                write!(f, "cubic-bezier({x1}, {y1}, {x2}, {y2})")
            }
            Self::Steps { count, position } => write!(f, "steps({count}, {})", position.keyword()),
        }
    }
}

impl FromStr for EasingFunction {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s {
            "linear" => return Ok(Self::Linear),
            "ease" => return Ok(Self::Ease),
            "ease-in" => return Ok(Self::EaseIn),
            "ease-out" => return Ok(Self::EaseOut),
            "ease-in-out" => return Ok(Self::EaseInOut),
            "step-start" => return Self::steps(1, StepPosition::Start),
            "step-end" => return Self::steps(1, StepPosition::End),
            _ => {}
        }

        let invalid = || MotionError::InvalidEasing(s.to_string());

        if let Some(args) = function_args(s, "cubic-bezier") {
            let values = args
                .iter()
                .map(|a| a.parse::<f32>().map_err(|_| invalid()))
                .collect::<Result<Vec<_>>>()?;
            let [x1, y1, x2, y2] = values.as_slice() else {
                return Err(invalid());
            };
            return Self::cubic_bezier(*x1, *y1, *x2, *y2);
        }

        if let Some(args) = function_args(s, "steps") {
            let count = args
                .first()
                .and_then(|a| a.parse::<u32>().ok())
                .ok_or_else(invalid)?;
            let position = match args.get(1) {
                Some(keyword) => StepPosition::parse(keyword).ok_or_else(invalid)?,
                None => StepPosition::End,
            };
            if args.len() > 2 {
                return Err(invalid());
            }
            return Self::steps(count, position);
        }

        Err(invalid())
    }
}

impl TryFrom<String> for EasingFunction {
    type Error = MotionError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<EasingFunction> for String {
    fn from(easing: EasingFunction) -> Self {
        easing.to_string()
    }
}

/// Split `name(a, b, c)` into its trimmed arguments.
fn function_args<'a>(s: &'a str, name: &str) -> Option<Vec<&'a str>> {
    let inner = s.strip_prefix(name)?.trim_start().strip_prefix('(')?.strip_suffix(')')?;
    Some(inner.split(',').map(str::trim).collect())
}

/// Evaluate a cubic bezier at progress `x`: solve for the curve
/// parameter, then read y at that parameter.
fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, x: f32) -> f32 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    bezier_component(y1, y2, solve_parameter(x1, x2, x))
}

/// Find `t` with `x(t) == x` using Newton-Raphson, falling back to
/// bisection when Newton stalls on a flat or steep segment.
fn solve_parameter(x1: f32, x2: f32, x: f32) -> f32 {
    const EPSILON: f32 = 1e-6;

    let mut t = x;
    for _ in 0..8 {
        let err = bezier_component(x1, x2, t) - x;
        if err.abs() < EPSILON {
            return t;
        }
        let slope = bezier_slope(x1, x2, t);
        if slope.abs() < EPSILON {
            break;
        }
        t = (t - err / slope).clamp(0.0, 1.0);
    }

    // x(t) is monotonic because x1 and x2 lie in [0, 1].
    let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
    t = x;
    for _ in 0..64 {
        let err = bezier_component(x1, x2, t) - x;
        if err.abs() < EPSILON {
            break;
        }
        if err > 0.0 {
            hi = t;
        } else {
            lo = t;
        }
        t = 0.5 * (lo + hi);
    }
    t
}

/// One coordinate of the curve: `3(1-t)²t·p1 + 3(1-t)t²·p2 + t³`.
#[inline]
fn bezier_component(p1: f32, p2: f32, t: f32) -> f32 {
    let mt = 1.0 - t;
    3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p2 + t * t * t
}

#[inline]
fn bezier_slope(p1: f32, p2: f32, t: f32) -> f32 {
    let mt = 1.0 - t;
    3.0 * mt * mt * p1 + 6.0 * mt * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
}

fn stepped(count: u32, position: StepPosition, t: f32) -> f32 {
    if count == 0 {
        return t;
    }
    let n = count as f32;
    match position {
        StepPosition::Start => (t * n).ceil() / n,
        StepPosition::End => (t * n).floor() / n,
        StepPosition::Both => ((t * (n + 1.0)).floor() / n).min(1.0),
        StepPosition::None if count == 1 => 0.5,
        StepPosition::None => ((t * n).floor() / (n - 1.0)).min(1.0),
    }
}
