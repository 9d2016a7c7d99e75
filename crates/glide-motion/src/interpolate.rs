//! Interpolation between style values.
//!
//! Numbers and same-unit lengths interpolate linearly. Everything else
//! (keywords, mismatched units) flips discretely at the midpoint, the way
//! CSS animates non-interpolable values.

use crate::style::{StyleSnapshot, StyleValue};

/// Types that can be blended between two values.
pub trait Interpolate: Sized {
    /// `t = 0.0` yields `self`, `t = 1.0` yields `to`.
    fn interpolate(&self, to: &Self, t: f32) -> Self;
}

#[inline]
fn lerp(from: f64, to: f64, t: f32) -> f64 {
    from + (to - from) * f64::from(t)
}

impl Interpolate for f64 {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        lerp(*self, *to, t)
    }
}

impl Interpolate for StyleValue {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        match (self, to) {
            (Self::Number { value: a }, Self::Number { value: b }) => {
                Self::Number { value: lerp(*a, *b, t) }
            }
            (Self::Length { value: a, unit: ua }, Self::Length { value: b, unit: ub })
                if ua == ub =>
            {
                Self::Length { value: lerp(*a, *b, t), unit: *ua }
            }
            _ if t < 0.5 => self.clone(),
            _ => to.clone(),
        }
    }
}

impl Interpolate for StyleSnapshot {
    /// Properties present on only one side hold their value.
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        let mut out = self.clone();
        for (property, to_value) in to.iter() {
            let value = match self.get(property) {
                Some(from_value) => from_value.interpolate(to_value, t),
                None => to_value.clone(),
            };
            out.set(property, value);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleProperty;

    #[test]
    fn test_numbers_lerp() {
        let v = StyleValue::from(0.0).interpolate(&StyleValue::from(1.0), 0.25);
        assert_eq!(v.as_f64(), Some(0.25));
    }

    #[test]
    fn test_lengths_same_unit() {
        let v = StyleValue::percent(100.0).interpolate(&StyleValue::percent(0.0), 0.5);
        assert_eq!(v, StyleValue::percent(50.0));
    }

    #[test]
    fn test_discrete_values_flip_at_midpoint() {
        let from = StyleValue::px(10.0);
        let to = StyleValue::percent(50.0);
        assert_eq!(from.interpolate(&to, 0.49), from);
        assert_eq!(from.interpolate(&to, 0.5), to);

        let hidden = StyleValue::keyword("hidden");
        let visible = StyleValue::keyword("visible");
        assert_eq!(hidden.interpolate(&visible, 0.2), hidden);
        assert_eq!(hidden.interpolate(&visible, 0.8), visible);
    }

    #[test]
    fn test_snapshot_union() {
        let from = StyleSnapshot::new()
            .with(StyleProperty::Opacity, 0.0)
            .with(StyleProperty::Width, StyleValue::px(10.0));
        let to = StyleSnapshot::new()
            .with(StyleProperty::Opacity, 1.0)
            .with(StyleProperty::Scale, 2.0);

        let mid = from.interpolate(&to, 0.5);
        assert_eq!(mid.get(StyleProperty::Opacity).and_then(StyleValue::as_f64), Some(0.5));
        assert_eq!(mid.get(StyleProperty::Width), Some(&StyleValue::px(10.0)));
        assert_eq!(mid.get(StyleProperty::Scale).and_then(StyleValue::as_f64), Some(2.0));
    }
}
