//! Named style variants with interaction layering.
//!
//! A [`MotionVariants`] maps variant names to style snapshots. The well-known
//! slots `initial`, `animate` and `exit` follow the lifecycle, and `hover`,
//! `focus` and `tap` are layered on top while the matching interaction is
//! active.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::presets::{css_transition, TimingPreset};
use crate::style::{StyleProperty, StyleSnapshot, StyleValue};
use crate::transition::LifecycleState;

pub const INITIAL: &str = "initial";
pub const ANIMATE: &str = "animate";
pub const EXIT: &str = "exit";
pub const HOVER: &str = "hover";
pub const FOCUS: &str = "focus";
pub const TAP: &str = "tap";

/// Pointer and focus state of an element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionState {
    pub hovered: bool,
    pub focused: bool,
    pub pressed: bool,
}

impl InteractionState {
    pub fn pointer_enter(&mut self) {
        self.hovered = true;
    }

    /// Leaving also releases a press.
    pub fn pointer_leave(&mut self) {
        self.hovered = false;
        self.pressed = false;
    }

    pub fn pointer_down(&mut self) {
        self.pressed = true;
    }

    pub fn pointer_up(&mut self) {
        self.pressed = false;
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn is_idle(&self) -> bool {
        !(self.hovered || self.focused || self.pressed)
    }
}

/// Variant name to style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MotionVariants {
    variants: BTreeMap<String, StyleSnapshot>,
}

impl MotionVariants {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, style: StyleSnapshot) -> Self {
        self.variants.insert(name.into(), style);
        self
    }

    pub fn get(&self, name: &str) -> Option<&StyleSnapshot> {
        self.variants.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variants.keys().map(String::as_str)
    }

    /// The lifecycle slot for a transition state.
    pub fn variant_for(state: LifecycleState) -> &'static str {
        match state {
            LifecycleState::Exited => INITIAL,
            LifecycleState::Entering | LifecycleState::Entered => ANIMATE,
            LifecycleState::Exiting => EXIT,
        }
    }

    /// Layer the named variant, active interaction variants and the caller's
    /// own style, in that order.
    ///
    /// A `transition` entry for `all` properties is added from `timing`
    /// unless `user_style` already carries one.
    pub fn resolve_style(
        &self,
        variant: &str,
        interaction: InteractionState,
        user_style: &StyleSnapshot,
        timing: &TimingPreset,
    ) -> StyleSnapshot {
        let layers = [
            (variant, true),
            (HOVER, interaction.hovered),
            (FOCUS, interaction.focused),
            (TAP, interaction.pressed),
        ];
        let mut style = StyleSnapshot::new();
        for (name, active) in layers {
            if let Some(layer) = self.get(name).filter(|_| active) {
                style.merge(layer);
            }
        }
        style.merge(user_style);
        if !user_style.contains(StyleProperty::Transition) {
            style.set(
                StyleProperty::Transition,
                StyleValue::keyword(css_transition("all", timing)),
            );
        }
        style
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::EasingFunction;

    fn button() -> MotionVariants {
        MotionVariants::new()
            .with(INITIAL, StyleSnapshot::new().with(StyleProperty::Opacity, 0.0))
            .with(ANIMATE, StyleSnapshot::new().with(StyleProperty::Opacity, 1.0).with(StyleProperty::Scale, 1.0))
            .with(HOVER, StyleSnapshot::new().with(StyleProperty::Scale, 1.05))
            .with(TAP, StyleSnapshot::new().with(StyleProperty::Scale, 0.95))
    }

    fn scale(style: &StyleSnapshot) -> Option<f64> {
        style.get(StyleProperty::Scale).and_then(StyleValue::as_f64)
    }

    #[test]
    fn test_interaction_layers_in_order() {
        let timing = TimingPreset::new(200, EasingFunction::EaseOut);
        let mut interaction = InteractionState::default();
        let variants = button();
        let user = StyleSnapshot::new();

        assert_eq!(scale(&variants.resolve_style(ANIMATE, interaction, &user, &timing)), Some(1.0));

        interaction.pointer_enter();
        assert_eq!(scale(&variants.resolve_style(ANIMATE, interaction, &user, &timing)), Some(1.05));

        interaction.pointer_down();
        assert_eq!(scale(&variants.resolve_style(ANIMATE, interaction, &user, &timing)), Some(0.95));

        interaction.pointer_leave();
        assert!(interaction.is_idle());
    }

    #[test]
    fn test_user_style_wins_and_transition_added() {
        let timing = TimingPreset::new(200, EasingFunction::EaseOut).with_delay(50);
        let user = StyleSnapshot::new().with(StyleProperty::Scale, 2.0);
        let style = button().resolve_style(ANIMATE, InteractionState { hovered: true, ..Default::default() }, &user, &timing);

        assert_eq!(scale(&style), Some(2.0));
        assert_eq!(
            style.get(StyleProperty::Transition).and_then(StyleValue::as_keyword),
            Some("all 200ms ease-out 50ms")
        );

        let custom = StyleSnapshot::new().with(StyleProperty::Transition, "none");
        let style = button().resolve_style(ANIMATE, InteractionState::default(), &custom, &timing);
        assert_eq!(style.get(StyleProperty::Transition).and_then(StyleValue::as_keyword), Some("none"));
    }

    #[test]
    fn test_unknown_variant_is_empty_base() {
        let timing = TimingPreset::default();
        let style = button().resolve_style("missing", InteractionState::default(), &StyleSnapshot::new(), &timing);
        assert_eq!(style.len(), 1);
        assert!(style.contains(StyleProperty::Transition));
    }

    #[test]
    fn test_lifecycle_slots() {
        assert_eq!(MotionVariants::variant_for(LifecycleState::Exited), INITIAL);
        assert_eq!(MotionVariants::variant_for(LifecycleState::Entering), ANIMATE);
        assert_eq!(MotionVariants::variant_for(LifecycleState::Exiting), EXIT);
    }
}
