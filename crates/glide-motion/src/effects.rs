//! Directional effects: lifecycle state to style.
//!
//! Effects are stateless maps from a [`LifecycleState`] to the style delta
//! the element should carry in that state. The host pairs the delta with the
//! effect's `transition` string so the change between states animates.

use serde::{Deserialize, Serialize};

use crate::presets::{css_multi_transition, css_transition, TimingPreset};
use crate::style::{StyleProperty, StyleSnapshot, StyleValue};
use crate::transition::LifecycleState;

/// Maps lifecycle states to style.
pub trait Effect {
    fn style(&self, state: LifecycleState) -> StyleSnapshot;

    /// CSS property name the effect animates.
    fn transition_property(&self) -> &'static str;

    fn css_transition(&self, timing: &TimingPreset) -> String {
        css_transition(self.transition_property(), timing)
    }
}

fn shown(state: LifecycleState) -> bool {
    matches!(state, LifecycleState::Entering | LifecycleState::Entered)
}

/// Opacity fade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fade {
    pub from_opacity: f64,
}

impl Default for Fade {
    fn default() -> Self {
        Self { from_opacity: 0.0 }
    }
}

impl Effect for Fade {
    fn style(&self, state: LifecycleState) -> StyleSnapshot {
        let opacity = if shown(state) { 1.0 } else { self.from_opacity };
        StyleSnapshot::new().with(StyleProperty::Opacity, opacity)
    }

    fn transition_property(&self) -> &'static str {
        "opacity"
    }
}

/// Direction an element slides *toward* when entering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideDirection {
    #[default]
    Up,
    Down,
    Left,
    Right,
}

impl SlideDirection {
    fn axis(self) -> StyleProperty {
        match self {
            Self::Up | Self::Down => StyleProperty::TranslateY,
            Self::Left | Self::Right => StyleProperty::TranslateX,
        }
    }

    /// Offset (percent of own size) before entering.
    fn enter_offset(self) -> f64 {
        match self {
            Self::Up | Self::Left => 100.0,
            Self::Down | Self::Right => -100.0,
        }
    }

    /// Offset (percent of own size) while leaving.
    fn exit_offset(self) -> f64 {
        -self.enter_offset()
    }
}

/// Slide in from one edge, out through the opposite one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    pub direction: SlideDirection,
}

impl Slide {
    pub fn new(direction: SlideDirection) -> Self {
        Self { direction }
    }
}

impl Effect for Slide {
    fn style(&self, state: LifecycleState) -> StyleSnapshot {
        let offset = match state {
            LifecycleState::Entering | LifecycleState::Entered => 0.0,
            LifecycleState::Exiting => self.direction.exit_offset(),
            LifecycleState::Exited => self.direction.enter_offset(),
        };
        StyleSnapshot::new().with(self.direction.axis(), StyleValue::percent(offset))
    }

    fn transition_property(&self) -> &'static str {
        "transform"
    }
}

/// Scale up from `scale` to full size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zoom {
    pub scale: f64,
}

impl Default for Zoom {
    fn default() -> Self {
        Self { scale: 0.75 }
    }
}

impl Effect for Zoom {
    fn style(&self, state: LifecycleState) -> StyleSnapshot {
        let scale = if shown(state) { 1.0 } else { self.scale };
        StyleSnapshot::new().with(StyleProperty::Scale, scale)
    }

    fn transition_property(&self) -> &'static str {
        "transform"
    }
}

/// Expand to the content's measured height.
///
/// The content height has to be measured before the enter can target it;
/// until then `Entering` holds the starting height.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Collapse {
    /// Collapsed height in pixels.
    pub starting_height: f64,
    pub animate_opacity: bool,
    #[serde(skip)]
    measured_height: Option<f64>,
}

impl Collapse {
    pub fn new(starting_height: f64) -> Self {
        Self { starting_height, ..Self::default() }
    }

    pub fn with_opacity(mut self, animate_opacity: bool) -> Self {
        self.animate_opacity = animate_opacity;
        self
    }

    pub fn with_measured_height(mut self, height: f64) -> Self {
        self.measure(height);
        self
    }

    /// Record the content height reported by the host.
    pub fn measure(&mut self, height: f64) {
        self.measured_height = Some(height.max(0.0));
    }

    pub fn measured_height(&self) -> Option<f64> {
        self.measured_height
    }

    /// Whether the enter has a height to animate to.
    pub fn can_enter(&self) -> bool {
        self.measured_height.is_some()
    }
}

impl Effect for Collapse {
    fn style(&self, state: LifecycleState) -> StyleSnapshot {
        let collapsed = StyleValue::px(self.starting_height);
        let (height, overflow) = match state {
            LifecycleState::Entered => (StyleValue::keyword("auto"), "visible"),
            LifecycleState::Entering => (
                self.measured_height.map_or(collapsed, StyleValue::px),
                "hidden",
            ),
            LifecycleState::Exiting | LifecycleState::Exited => (collapsed, "hidden"),
        };

        let mut style = StyleSnapshot::new()
            .with(StyleProperty::Height, height)
            .with(StyleProperty::Overflow, overflow);
        if self.animate_opacity {
            style.set(StyleProperty::Opacity, if shown(state) { 1.0 } else { 0.0 });
        }
        style
    }

    fn transition_property(&self) -> &'static str {
        "height"
    }

    fn css_transition(&self, timing: &TimingPreset) -> String {
        if self.animate_opacity {
            css_multi_transition(&[("height", *timing), ("opacity", *timing)])
        } else {
            css_transition("height", timing)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::builtin_timing;
    use LifecycleState::*;

    fn value(style: &StyleSnapshot, property: StyleProperty) -> StyleValue {
        style.get(property).cloned().unwrap()
    }

    #[test]
    fn test_slide_direction_table() {
        let cases = [
            (SlideDirection::Up, StyleProperty::TranslateY, 100.0, -100.0),
            (SlideDirection::Down, StyleProperty::TranslateY, -100.0, 100.0),
            (SlideDirection::Left, StyleProperty::TranslateX, 100.0, -100.0),
            (SlideDirection::Right, StyleProperty::TranslateX, -100.0, 100.0),
        ];
        for (direction, axis, enter, exit) in cases {
            let slide = Slide::new(direction);
            assert_eq!(value(&slide.style(Exited), axis), StyleValue::percent(enter));
            assert_eq!(value(&slide.style(Entering), axis), StyleValue::percent(0.0));
            assert_eq!(value(&slide.style(Entered), axis), StyleValue::percent(0.0));
            assert_eq!(value(&slide.style(Exiting), axis), StyleValue::percent(exit));
        }
    }

    #[test]
    fn test_fade_and_zoom() {
        let fade = Fade { from_opacity: 0.2 };
        assert_eq!(value(&fade.style(Entering), StyleProperty::Opacity), StyleValue::from(1.0));
        assert_eq!(value(&fade.style(Exiting), StyleProperty::Opacity), StyleValue::from(0.2));

        let zoom = Zoom::default();
        assert_eq!(value(&zoom.style(Entered), StyleProperty::Scale), StyleValue::from(1.0));
        assert_eq!(value(&zoom.style(Exited), StyleProperty::Scale), StyleValue::from(0.75));
    }

    #[test]
    fn test_collapse_waits_for_measurement() {
        let mut collapse = Collapse::new(0.0).with_opacity(true);
        assert!(!collapse.can_enter());
        assert_eq!(value(&collapse.style(Entering), StyleProperty::Height), StyleValue::px(0.0));

        collapse.measure(240.0);
        assert_eq!(value(&collapse.style(Entering), StyleProperty::Height), StyleValue::px(240.0));
        assert_eq!(value(&collapse.style(Entered), StyleProperty::Height), StyleValue::keyword("auto"));
        assert_eq!(value(&collapse.style(Exited), StyleProperty::Opacity), StyleValue::from(0.0));
    }

    #[test]
    fn test_effect_transition_strings() {
        let timing = builtin_timing("collapse").unwrap();
        assert_eq!(Fade::default().css_transition(&timing), "opacity 300ms ease-in-out");
        assert_eq!(
            Collapse::new(0.0).with_opacity(true).css_transition(&timing),
            "height 300ms ease-in-out, opacity 300ms ease-in-out"
        );
        let effects: Vec<Box<dyn Effect>> = vec![Box::new(Slide::default()), Box::new(Zoom::default())];
        for effect in effects {
            assert!(effect.css_transition(&timing).starts_with("transform "));
        }
    }
}
