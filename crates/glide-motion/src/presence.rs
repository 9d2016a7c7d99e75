//! Presence: whether an element belongs in the render tree.
//!
//! Presence is separate from visual state. An element can be mounted while
//! fully transparent (`Exited` without `unmount_on_exit`), and an exiting
//! element stays mounted until its exit finishes.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::events::SharedEventQueue;
use crate::transition::{
    LifecycleState, TransitionCallbacks, TransitionConfig, TransitionSession,
};

/// Mount/unmount flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresencePolicy {
    /// Stay out of the tree until the first enter.
    pub mount_on_enter: bool,
    /// Leave the tree once an exit completes.
    pub unmount_on_exit: bool,
}

/// Render unless exited and unmounted, or exited and never yet entered
/// under `mount_on_enter`.
pub fn should_render(state: LifecycleState, has_entered: bool, policy: PresencePolicy) -> bool {
    if state != LifecycleState::Exited {
        return true;
    }
    !(policy.unmount_on_exit || (policy.mount_on_enter && !has_entered))
}

/// Where rendered output goes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum RenderTarget {
    #[default]
    Inline,
    /// A named alternate surface (overlay layer, modal root).
    Portal(String),
}

/// A child tagged with the lifecycle state it was rendered in.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered<T> {
    pub child: T,
    pub state: LifecycleState,
    pub target: RenderTarget,
}

/// A single child under a transition session.
pub struct Presence {
    session: TransitionSession,
    target: RenderTarget,
}

impl Presence {
    pub fn new(clock: Rc<dyn Clock>, config: TransitionConfig) -> Self {
        Self::from_session(TransitionSession::new(clock, config))
    }

    pub fn from_session(session: TransitionSession) -> Self {
        Self { session, target: RenderTarget::Inline }
    }

    pub fn with_target(mut self, target: RenderTarget) -> Self {
        self.target = target;
        self
    }

    pub fn session(&self) -> &TransitionSession {
        &self.session
    }

    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    pub fn set_visible(&self, visible: bool) -> bool {
        self.session.set_visible(visible)
    }

    pub fn should_render(&self) -> bool {
        self.session.is_mounted()
    }

    /// Produce the child if it belongs in the tree.
    pub fn render<T>(&self, child: T) -> Option<Rendered<T>> {
        self.should_render().then(|| Rendered {
            child,
            state: self.session.state(),
            target: self.target.clone(),
        })
    }
}

impl fmt::Debug for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Presence")
            .field("session", &self.session)
            .field("target", &self.target)
            .finish()
    }
}

struct GroupEntry<K> {
    key: K,
    session: TransitionSession,
    removed: bool,
}

impl<K> GroupEntry<K> {
    fn is_gone(&self) -> bool {
        self.removed && self.session.state() == LifecycleState::Exited
    }
}

/// Keyed children that animate in when added and out when removed.
///
/// Removed children keep rendering until their exit completes. A key that
/// comes back while still exiting re-enters the same session.
pub struct PresenceGroup<K> {
    clock: Rc<dyn Clock>,
    template: TransitionConfig,
    animate_initial: bool,
    synced_once: bool,
    callbacks: TransitionCallbacks,
    events: Option<SharedEventQueue>,
    target: RenderTarget,
    entries: Vec<GroupEntry<K>>,
}

impl<K: Eq + Hash + Clone + fmt::Debug> PresenceGroup<K> {
    /// `template` supplies timing and reduced-motion settings for every child.
    pub fn new(clock: Rc<dyn Clock>, template: TransitionConfig) -> Self {
        Self {
            clock,
            template,
            animate_initial: true,
            synced_once: false,
            callbacks: TransitionCallbacks::default(),
            events: None,
            target: RenderTarget::Inline,
            entries: Vec::new(),
        }
    }

    /// Whether children present on the first sync animate in.
    pub fn with_initial(mut self, animate_initial: bool) -> Self {
        self.animate_initial = animate_initial;
        self
    }

    /// Hooks attached to every child session.
    pub fn with_child_callbacks(mut self, callbacks: TransitionCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn with_events(mut self, events: SharedEventQueue) -> Self {
        self.events = Some(events);
        self
    }

    /// Render every child into `target`.
    pub fn with_target(mut self, target: RenderTarget) -> Self {
        self.target = target;
        self
    }

    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    /// Update the reduced-motion signal for every child, present and future.
    pub fn set_reduced_motion(&mut self, reduced_motion: bool) {
        self.template.reduced_motion = reduced_motion;
        for entry in &self.entries {
            entry.session.set_reduced_motion(reduced_motion);
        }
    }

    /// Reconcile against the current set of keys.
    pub fn sync(&mut self, keys: impl IntoIterator<Item = K>) {
        self.prune();
        let keys: Vec<K> = keys.into_iter().collect();
        let wanted: HashSet<&K> = keys.iter().collect();

        for entry in &mut self.entries {
            match (wanted.contains(&entry.key), entry.removed) {
                (true, true) => {
                    tracing::debug!(key = ?entry.key, "presence child re-entering");
                    entry.removed = false;
                    entry.session.set_visible(true);
                }
                (false, false) => {
                    entry.removed = true;
                    entry.session.set_visible(false);
                }
                _ => {}
            }
        }

        let appear = self.synced_once || self.animate_initial;
        for key in keys {
            if self.entries.iter().any(|e| e.key == key) {
                continue;
            }
            let config = self.template.clone().with_appear(appear);
            let config = TransitionConfig { visible: true, ..config };
            let mut builder = TransitionSession::builder(self.clock.clone(), config)
                .callbacks(self.callbacks.clone());
            if let Some(events) = &self.events {
                builder = builder.events(events.clone());
            }
            tracing::trace!(?key, appear, "presence child added");
            self.entries.push(GroupEntry { key, session: builder.build(), removed: false });
        }

        self.synced_once = true;
        self.prune();
    }

    /// Drop children whose exit has completed.
    pub fn prune(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| !entry.is_gone());
        before - self.entries.len()
    }

    /// Keys that belong in the tree, in first-insertion order.
    pub fn rendered_keys(&self) -> Vec<K> {
        self.entries
            .iter()
            .filter(|e| !e.is_gone())
            .map(|e| e.key.clone())
            .collect()
    }

    pub fn state_of(&self, key: &K) -> Option<LifecycleState> {
        self.entries
            .iter()
            .find(|e| &e.key == key && !e.is_gone())
            .map(|e| e.session.state())
    }

    pub fn session(&self, key: &K) -> Option<&TransitionSession> {
        self.entries.iter().find(|e| &e.key == key).map(|e| &e.session)
    }

    /// Whether any child is still exiting.
    pub fn is_exiting(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.removed && e.session.state() == LifecycleState::Exiting)
    }

    /// Render each present child, tagged with its state.
    pub fn render<T>(&self, mut child: impl FnMut(&K) -> T) -> Vec<Rendered<T>> {
        self.entries
            .iter()
            .filter(|e| !e.is_gone())
            .map(|e| Rendered {
                child: child(&e.key),
                state: e.session.state(),
                target: self.target.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FrameClock;

    #[test]
    fn test_should_render_rules() {
        use LifecycleState::*;
        let plain = PresencePolicy::default();
        let unmount = PresencePolicy { unmount_on_exit: true, ..plain };
        let lazy = PresencePolicy { mount_on_enter: true, ..plain };

        assert!(should_render(Exited, false, plain));
        assert!(!should_render(Exited, true, unmount));
        assert!(should_render(Exiting, true, unmount));
        assert!(!should_render(Exited, false, lazy));
        assert!(should_render(Exited, true, lazy));
        assert!(should_render(Entering, false, lazy));
    }

    #[test]
    fn test_render_tags_state_and_target() {
        let clock = Rc::new(FrameClock::new());
        let presence = Presence::new(clock.clone(), TransitionConfig::new(true))
            .with_target(RenderTarget::Portal("overlay".into()));

        let rendered = presence.render("menu").unwrap();
        assert_eq!(rendered.state, LifecycleState::Entered);
        assert_eq!(rendered.target, RenderTarget::Portal("overlay".into()));
    }

    #[test]
    fn test_mount_on_enter_defers_render() {
        let clock = Rc::new(FrameClock::new());
        let presence =
            Presence::new(clock.clone(), TransitionConfig::new(false).with_mount_on_enter(true));
        assert!(presence.render(()).is_none());

        presence.set_visible(true);
        assert!(presence.render(()).is_some());
        clock.tick(300);
        presence.set_visible(false);
        clock.tick(300);
        // Entered once, so it stays mounted.
        assert_eq!(presence.session().state(), LifecycleState::Exited);
        assert!(presence.should_render());
    }

    #[test]
    fn test_group_keeps_exiting_children() {
        let clock = Rc::new(FrameClock::new());
        let mut group =
            PresenceGroup::new(clock.clone(), TransitionConfig::new(true).with_timeout(100))
                .with_initial(false);

        group.sync(["a", "b", "c"]);
        assert_eq!(group.state_of(&"b"), Some(LifecycleState::Entered));

        group.sync(["a", "c", "d"]);
        assert_eq!(group.rendered_keys(), vec!["a", "b", "c", "d"]);
        assert_eq!(group.state_of(&"b"), Some(LifecycleState::Exiting));
        assert_eq!(group.state_of(&"d"), Some(LifecycleState::Entering));
        assert!(group.is_exiting());

        clock.tick(100);
        assert_eq!(group.rendered_keys(), vec!["a", "c", "d"]);
        assert_eq!(group.prune(), 1);
        assert_eq!(group.state_of(&"b"), None);
    }

    #[test]
    fn test_group_reentry_does_not_duplicate() {
        let clock = Rc::new(FrameClock::new());
        let mut group = PresenceGroup::new(clock.clone(), TransitionConfig::new(true).with_timeout(100));

        group.sync([1, 2]);
        clock.tick(100);
        group.sync([1]);
        clock.tick(40);
        group.sync([1, 2]);

        assert_eq!(group.rendered_keys(), vec![1, 2]);
        assert_eq!(group.state_of(&2), Some(LifecycleState::Entering));
        clock.tick(100);
        assert_eq!(group.state_of(&2), Some(LifecycleState::Entered));
    }

    #[test]
    fn test_group_renders_into_portal() {
        let clock = Rc::new(FrameClock::new());
        let mut group = PresenceGroup::new(clock.clone(), TransitionConfig::new(true).with_timeout(100))
            .with_target(RenderTarget::Portal("toasts".into()));

        group.sync(["saved", "synced"]);
        let rendered = group.render(|key| key.len());
        assert_eq!(rendered.len(), 2);
        assert!(rendered.iter().all(|r| r.target == RenderTarget::Portal("toasts".into())));
        assert_eq!(rendered[0].child, 5);
        assert_eq!(rendered[0].state, LifecycleState::Entering);
    }

    #[test]
    fn test_group_reduced_motion_reaches_children() {
        let clock = Rc::new(FrameClock::new());
        let mut group = PresenceGroup::new(clock.clone(), TransitionConfig::new(true).with_timeout(100))
            .with_initial(false);
        group.sync(["a"]);

        group.set_reduced_motion(true);
        group.sync(["b"]);
        clock.flush();
        assert_eq!(group.rendered_keys(), vec!["b"]);
        assert_eq!(group.state_of(&"b"), Some(LifecycleState::Entered));
    }
}
