//! Style snapshots: the visual output of every effect and keyframe.
//!
//! This module defines:
//! - `StyleProperty`: the visual properties the engine knows how to drive
//! - `StyleValue`: a value for one property
//! - `StyleSnapshot`: an ordered property → value mapping with layering

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Visual properties that transitions and keyframes can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleProperty {
    Opacity,
    TranslateX,
    TranslateY,
    Scale,
    Rotate,
    Width,
    Height,
    Overflow,
    Visibility,
    /// The `transition` shorthand; carried as a keyword.
    Transition,
}

impl StyleProperty {
    /// The CSS-facing name of the property.
    pub fn css_name(self) -> &'static str {
        match self {
            Self::Opacity => "opacity",
            Self::TranslateX => "translate-x",
            Self::TranslateY => "translate-y",
            Self::Scale => "scale",
            Self::Rotate => "rotate",
            Self::Width => "width",
            Self::Height => "height",
            Self::Overflow => "overflow",
            Self::Visibility => "visibility",
            Self::Transition => "transition",
        }
    }

    /// Transform components share the `transform` transition channel.
    pub fn is_transform(self) -> bool {
        matches!(
            self,
            Self::TranslateX | Self::TranslateY | Self::Scale | Self::Rotate
        )
    }
}

/// Units for length-like values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    Px,
    Percent,
    Deg,
}

impl LengthUnit {
    fn suffix(self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::Percent => "%",
            Self::Deg => "deg",
        }
    }
}

/// A value for a single style property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StyleValue {
    /// Unitless number (opacity, scale).
    Number { value: f64 },
    /// Number with a unit (translation, size, rotation).
    Length { value: f64, unit: LengthUnit },
    /// Non-interpolable keyword (`auto`, `hidden`, transition shorthands).
    Keyword { value: String },
}

impl StyleValue {
    pub fn px(value: f64) -> Self {
        Self::Length { value, unit: LengthUnit::Px }
    }

    pub fn percent(value: f64) -> Self {
        Self::Length { value, unit: LengthUnit::Percent }
    }

    pub fn deg(value: f64) -> Self {
        Self::Length { value, unit: LengthUnit::Deg }
    }

    pub fn keyword(value: impl Into<String>) -> Self {
        Self::Keyword { value: value.into() }
    }

    /// The numeric part of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number { value } | Self::Length { value, .. } => Some(*value),
            Self::Keyword { .. } => None,
        }
    }

    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            Self::Keyword { value } => Some(value),
            _ => None,
        }
    }
}

impl From<f64> for StyleValue {
    fn from(value: f64) -> Self {
        Self::Number { value }
    }
}

impl From<&str> for StyleValue {
    fn from(value: &str) -> Self {
        Self::keyword(value)
    }
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number { value } => write!(f, "{value}"),
            Self::Length { value, unit } => write!(f, "{value}{}", unit.suffix()),
            Self::Keyword { value } => f.write_str(value),
        }
    }
}

/// An ordered mapping of style properties to values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleSnapshot {
    values: BTreeMap<StyleProperty, StyleValue>,
}

impl StyleSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, property: StyleProperty, value: impl Into<StyleValue>) -> Self {
        self.values.insert(property, value.into());
        self
    }

    pub fn set(&mut self, property: StyleProperty, value: impl Into<StyleValue>) {
        self.values.insert(property, value.into());
    }

    pub fn get(&self, property: StyleProperty) -> Option<&StyleValue> {
        self.values.get(&property)
    }

    pub fn remove(&mut self, property: StyleProperty) -> Option<StyleValue> {
        self.values.remove(&property)
    }

    pub fn contains(&self, property: StyleProperty) -> bool {
        self.values.contains_key(&property)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StyleProperty, &StyleValue)> {
        self.values.iter().map(|(p, v)| (*p, v))
    }

    pub fn properties(&self) -> impl Iterator<Item = StyleProperty> + '_ {
        self.values.keys().copied()
    }

    /// Layer `other` on top of `self`; properties in `other` win.
    pub fn merge(&mut self, other: &StyleSnapshot) {
        for (property, value) in &other.values {
            self.values.insert(*property, value.clone());
        }
    }

    /// A copy of `self` with `other` layered on top.
    pub fn merged(&self, other: &StyleSnapshot) -> StyleSnapshot {
        let mut out = self.clone();
        out.merge(other);
        out
    }
}

impl FromIterator<(StyleProperty, StyleValue)> for StyleSnapshot {
    fn from_iter<I: IntoIterator<Item = (StyleProperty, StyleValue)>>(iter: I) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}

/// Layer snapshots in order; later layers win.
pub fn merge_styles<'a>(layers: impl IntoIterator<Item = &'a StyleSnapshot>) -> StyleSnapshot {
    layers.into_iter().fold(StyleSnapshot::new(), |mut acc, layer| {
        acc.merge(layer);
        acc
    })
}
