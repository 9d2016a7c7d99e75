//! Keyframe animation driver.
//!
//! The driver resolves named or literal keyframes and timing, hands them to
//! an [`AnimationHost`] and tracks the single current [`AnimationHandle`]
//! per target. Starting on a target that already has a handle cancels the
//! old one before the new one is created, so two animations from this
//! driver never apply to the same element at once.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::error::{MotionError, Result};
use crate::events::{self, AnimationEvent, SharedEventQueue};
use crate::keyframes::{AnimationId, AnimationOptions};
use crate::node_ref::TargetId;
use crate::presets::{
    resolve_keyframes, resolve_timing, KeyframeSequence, KeyframesRef, TimingPreset, TimingRef,
};
use crate::transition::Callback;

/// Invoked by the host once every iteration has played.
pub type FinishCallback = Box<dyn FnOnce()>;

/// The surface that actually plays keyframe animations.
///
/// Methods take `&self`; hosts are shared and use interior mutability.
pub trait AnimationHost {
    /// Whether `target` is attached to a renderable surface.
    fn is_attached(&self, target: TargetId) -> bool;

    /// Start playing. `on_finish` runs once on natural completion and is
    /// dropped without running if the animation is cancelled.
    fn play(
        &self,
        id: AnimationId,
        target: TargetId,
        sequence: KeyframeSequence,
        timing: TimingPreset,
        options: AnimationOptions,
        on_finish: FinishCallback,
    );

    /// Stop immediately and remove every style the animation applied.
    fn cancel(&self, id: AnimationId);

    fn pause(&self, id: AnimationId);

    fn resume(&self, id: AnimationId);
}

/// Where a handle is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleStatus {
    Running,
    Paused,
    Finished,
    Cancelled,
}

impl HandleStatus {
    fn is_live(self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }
}

/// Optional hooks for a keyframe animation.
#[derive(Clone, Default)]
pub struct AnimationCallbacks {
    pub on_start: Option<Callback>,
    pub on_finish: Option<Callback>,
    pub on_cancel: Option<Callback>,
}

impl AnimationCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start(mut self, f: impl Fn() + 'static) -> Self {
        self.on_start = Some(Rc::new(f));
        self
    }

    pub fn on_finish(mut self, f: impl Fn() + 'static) -> Self {
        self.on_finish = Some(Rc::new(f));
        self
    }

    pub fn on_cancel(mut self, f: impl Fn() + 'static) -> Self {
        self.on_cancel = Some(Rc::new(f));
        self
    }
}

impl fmt::Debug for AnimationCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationCallbacks")
            .field("on_start", &self.on_start.is_some())
            .field("on_finish", &self.on_finish.is_some())
            .field("on_cancel", &self.on_cancel.is_some())
            .finish()
    }
}

struct HandleState {
    id: AnimationId,
    target: TargetId,
    status: HandleStatus,
    host: Weak<dyn AnimationHost>,
    callbacks: AnimationCallbacks,
    events: Option<SharedEventQueue>,
}

/// Control surface for one running keyframe animation.
///
/// Completion and cancellation are mutually exclusive: once one happens
/// the other never fires.
#[derive(Clone)]
pub struct AnimationHandle {
    inner: Rc<RefCell<HandleState>>,
}

impl AnimationHandle {
    pub fn id(&self) -> AnimationId {
        self.inner.borrow().id
    }

    pub fn target(&self) -> TargetId {
        self.inner.borrow().target
    }

    pub fn status(&self) -> HandleStatus {
        self.inner.borrow().status
    }

    pub fn is_running(&self) -> bool {
        self.status() == HandleStatus::Running
    }

    pub fn is_paused(&self) -> bool {
        self.status() == HandleStatus::Paused
    }

    pub fn is_finished(&self) -> bool {
        self.status() == HandleStatus::Finished
    }

    pub fn is_cancelled(&self) -> bool {
        self.status() == HandleStatus::Cancelled
    }

    /// Stop and revert. Returns `false` if already cancelled.
    ///
    /// Cancelling a finished animation removes its retained fill style but
    /// fires no hook.
    pub fn cancel(&self) -> bool {
        let (hook, event, events) = {
            let mut inner = self.inner.borrow_mut();
            if inner.status == HandleStatus::Cancelled {
                return false;
            }
            let was_live = inner.status.is_live();
            inner.status = HandleStatus::Cancelled;
            if let Some(host) = inner.host.upgrade() {
                host.cancel(inner.id);
            }
            tracing::debug!(animation = inner.id.0, target = %inner.target, was_live, "animation cancelled");
            if !was_live {
                return true;
            }
            (
                inner.callbacks.on_cancel.clone(),
                AnimationEvent::Cancelled { animation_id: inner.id, target: inner.target },
                inner.events.clone(),
            )
        };
        events::emit(events.as_ref(), event);
        if let Some(hook) = hook {
            hook();
        }
        true
    }

    /// Pause a running animation. Returns `false` if it was not running.
    pub fn pause(&self) -> bool {
        self.set_paused(true)
    }

    /// Resume a paused animation. Returns `false` if it was not paused.
    pub fn resume(&self) -> bool {
        self.set_paused(false)
    }

    fn set_paused(&self, paused: bool) -> bool {
        let (event, events) = {
            let mut inner = self.inner.borrow_mut();
            let (from, to) = if paused {
                (HandleStatus::Running, HandleStatus::Paused)
            } else {
                (HandleStatus::Paused, HandleStatus::Running)
            };
            if inner.status != from {
                return false;
            }
            inner.status = to;
            let (id, target) = (inner.id, inner.target);
            if let Some(host) = inner.host.upgrade() {
                if paused {
                    host.pause(id);
                } else {
                    host.resume(id);
                }
            }
            let event = if paused {
                AnimationEvent::Paused { animation_id: id, target }
            } else {
                AnimationEvent::Resumed { animation_id: id, target }
            };
            (event, inner.events.clone())
        };
        events::emit(events.as_ref(), event);
        true
    }
}

/// Host completion path: mark finished and run the hook, unless the handle
/// was cancelled first.
fn complete(handle: &Weak<RefCell<HandleState>>) {
    let Some(handle) = handle.upgrade() else {
        return;
    };
    let (hook, event, events) = {
        let mut inner = handle.borrow_mut();
        if !inner.status.is_live() {
            tracing::debug!(animation = inner.id.0, status = ?inner.status, "ignored late completion");
            return;
        }
        inner.status = HandleStatus::Finished;
        tracing::trace!(animation = inner.id.0, target = %inner.target, "animation completed");
        (
            inner.callbacks.on_finish.clone(),
            AnimationEvent::Completed { animation_id: inner.id, target: inner.target },
            inner.events.clone(),
        )
    };
    events::emit(events.as_ref(), event);
    if let Some(hook) = hook {
        hook();
    }
}

impl fmt::Debug for AnimationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("AnimationHandle")
            .field("id", &inner.id)
            .field("target", &inner.target)
            .field("status", &inner.status)
            .finish()
    }
}

/// Inputs that, when changed, restart an animation.
#[derive(Debug, Clone, PartialEq)]
struct Dependencies {
    sequence: KeyframeSequence,
    timing: TimingPreset,
    options: AnimationOptions,
}

struct Current {
    handle: AnimationHandle,
    deps: Dependencies,
}

/// Starts keyframe animations on a host, one current handle per target.
///
/// Dropping the driver cancels every animation it started.
pub struct KeyframeDriver {
    host: Rc<dyn AnimationHost>,
    current: HashMap<TargetId, Current>,
    reduced_motion: bool,
    callbacks: AnimationCallbacks,
    events: Option<SharedEventQueue>,
}

impl KeyframeDriver {
    pub fn new(host: Rc<dyn AnimationHost>) -> Self {
        Self {
            host,
            current: HashMap::new(),
            reduced_motion: false,
            callbacks: AnimationCallbacks::default(),
            events: None,
        }
    }

    /// Play every animation with zero duration and delay.
    pub fn with_reduced_motion(mut self, reduced_motion: bool) -> Self {
        self.reduced_motion = reduced_motion;
        self
    }

    /// Update the reduced-motion signal. Applies to animations started
    /// afterwards; running ones keep their timing.
    pub fn set_reduced_motion(&mut self, reduced_motion: bool) {
        self.reduced_motion = reduced_motion;
    }

    pub fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    /// Hooks attached to every handle this driver creates.
    pub fn with_callbacks(mut self, callbacks: AnimationCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn with_events(mut self, events: SharedEventQueue) -> Self {
        self.events = Some(events);
        self
    }

    /// Start an animation on `target`, cancelling its current one first.
    ///
    /// Unknown preset names and empty sequences are errors. A detached
    /// target is not: the call does nothing and returns `Ok(None)`.
    pub fn start(
        &mut self,
        target: TargetId,
        sequence: &KeyframesRef,
        timing: &TimingRef,
        options: AnimationOptions,
    ) -> Result<Option<AnimationHandle>> {
        let deps = resolve(sequence, timing, options)?;
        Ok(self.start_resolved(target, deps))
    }

    /// Like [`start`](Self::start), but a no-op returning the current handle
    /// when nothing that affects playback has changed since the last call.
    pub fn sync(
        &mut self,
        target: TargetId,
        sequence: &KeyframesRef,
        timing: &TimingRef,
        options: AnimationOptions,
    ) -> Result<Option<AnimationHandle>> {
        let deps = resolve(sequence, timing, options)?;
        if let Some(current) = self.current.get(&target) {
            if current.deps == deps && !current.handle.is_cancelled() {
                return Ok(Some(current.handle.clone()));
            }
        }
        Ok(self.start_resolved(target, deps))
    }

    fn start_resolved(&mut self, target: TargetId, deps: Dependencies) -> Option<AnimationHandle> {
        if let Some(previous) = self.current.remove(&target) {
            previous.handle.cancel();
        }

        if !self.host.is_attached(target) {
            tracing::debug!(%target, "target not attached; animation start skipped");
            return None;
        }

        let timing = if self.reduced_motion { deps.timing.instant() } else { deps.timing };
        let id = AnimationId::new();
        let status = if deps.options.autoplay {
            HandleStatus::Running
        } else {
            HandleStatus::Paused
        };
        let handle = AnimationHandle {
            inner: Rc::new(RefCell::new(HandleState {
                id,
                target,
                status,
                host: Rc::downgrade(&self.host),
                callbacks: self.callbacks.clone(),
                events: self.events.clone(),
            })),
        };

        let weak = Rc::downgrade(&handle.inner);
        self.host.play(
            id,
            target,
            deps.sequence.clone(),
            timing,
            deps.options,
            Box::new(move || complete(&weak)),
        );
        tracing::trace!(animation = id.0, %target, duration_ms = timing.duration_ms, "animation started");

        events::emit(
            self.events.as_ref(),
            AnimationEvent::Started { animation_id: id, target },
        );
        if let Some(hook) = &self.callbacks.on_start {
            hook();
        }

        self.current.insert(target, Current { handle: handle.clone(), deps });
        Some(handle)
    }

    pub fn current(&self, target: TargetId) -> Option<&AnimationHandle> {
        self.current.get(&target).map(|c| &c.handle)
    }

    /// Cancel the current animation on `target`.
    pub fn cancel(&mut self, target: TargetId) -> bool {
        self.current
            .remove(&target)
            .is_some_and(|current| current.handle.cancel())
    }

    pub fn cancel_all(&mut self) {
        for (_, current) in self.current.drain() {
            current.handle.cancel();
        }
    }

    /// Targets with a running or paused animation.
    pub fn active_targets(&self) -> Vec<TargetId> {
        let mut targets: Vec<TargetId> = self
            .current
            .iter()
            .filter(|(_, c)| c.handle.status().is_live())
            .map(|(t, _)| *t)
            .collect();
        targets.sort();
        targets
    }
}

fn resolve(
    sequence: &KeyframesRef,
    timing: &TimingRef,
    options: AnimationOptions,
) -> Result<Dependencies> {
    let sequence = resolve_keyframes(sequence)?;
    if sequence.is_empty() {
        return Err(MotionError::EmptyKeyframes);
    }
    Ok(Dependencies { sequence, timing: resolve_timing(timing)?, options })
}

impl Drop for KeyframeDriver {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

impl fmt::Debug for KeyframeDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyframeDriver")
            .field("targets", &self.current.len())
            .field("reduced_motion", &self.reduced_motion)
            .finish()
    }
}

static_assertions::assert_not_impl_any!(AnimationHandle: Send, Sync);
static_assertions::assert_not_impl_any!(KeyframeDriver: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframes::IterationCount;
    use crate::timeline::Timeline;
    use std::cell::Cell;

    fn setup() -> (Rc<Timeline>, KeyframeDriver, TargetId) {
        let timeline = Rc::new(Timeline::new());
        let target = TargetId::new();
        timeline.attach(target);
        let driver = KeyframeDriver::new(timeline.clone());
        (timeline, driver, target)
    }

    #[test]
    fn test_unknown_names_are_errors() {
        let (_timeline, mut driver, target) = setup();
        let err = driver
            .start(target, &"fadeInn".into(), &"fast".into(), AnimationOptions::new())
            .unwrap_err();
        assert_eq!(err, MotionError::UnknownKeyframes("fadeInn".into()));

        let err = driver
            .start(target, &KeyframeSequence::new().into(), &"fast".into(), AnimationOptions::new())
            .unwrap_err();
        assert_eq!(err, MotionError::EmptyKeyframes);
    }

    #[test]
    fn test_detached_target_is_noop() {
        let timeline = Rc::new(Timeline::new());
        let mut driver = KeyframeDriver::new(timeline.clone());
        let handle = driver
            .start(TargetId::new(), &"fadeIn".into(), &"fast".into(), AnimationOptions::new())
            .unwrap();
        assert!(handle.is_none());
        assert_eq!(timeline.active_count(), 0);
    }

    #[test]
    fn test_autoplay_false_starts_paused() {
        let (timeline, mut driver, target) = setup();
        let handle = driver
            .start(target, &"fadeIn".into(), &"linear".into(), AnimationOptions::new().autoplay(false))
            .unwrap()
            .unwrap();
        assert!(handle.is_paused());
        timeline.tick(1_000.0);
        assert!(handle.is_paused());

        assert!(handle.resume());
        assert!(!handle.resume());
        timeline.tick(300.0);
        assert!(handle.is_finished());
    }

    #[test]
    fn test_sync_restarts_only_on_change() {
        let (_timeline, mut driver, target) = setup();
        let first = driver
            .sync(target, &"pulse".into(), &"slow".into(), AnimationOptions::new())
            .unwrap()
            .unwrap();
        let again = driver
            .sync(target, &"pulse".into(), &"slow".into(), AnimationOptions::new())
            .unwrap()
            .unwrap();
        assert_eq!(first.id(), again.id());

        let changed = driver
            .sync(target, &"pulse".into(), &"fast".into(), AnimationOptions::new())
            .unwrap()
            .unwrap();
        assert_ne!(first.id(), changed.id());
        assert!(first.is_cancelled());
        assert!(changed.is_running());
    }

    #[test]
    fn test_reduced_motion_finishes_next_tick() {
        let timeline = Rc::new(Timeline::new());
        let target = TargetId::new();
        timeline.attach(target);
        let finished = Rc::new(Cell::new(0));
        let f = finished.clone();
        let mut driver = KeyframeDriver::new(timeline.clone())
            .with_reduced_motion(true)
            .with_callbacks(AnimationCallbacks::new().on_finish(move || f.set(f.get() + 1)));

        let handle = driver
            .start(target, &"spin".into(), &"slow".into(), AnimationOptions::new())
            .unwrap()
            .unwrap();
        timeline.tick(0.0);
        assert!(handle.is_finished());
        assert_eq!(finished.get(), 1);
    }

    #[test]
    fn test_reduced_motion_respects_autoplay_false() {
        let timeline = Rc::new(Timeline::new());
        let target = TargetId::new();
        timeline.attach(target);
        let finished = Rc::new(Cell::new(0));
        let f = finished.clone();
        let mut driver = KeyframeDriver::new(timeline.clone())
            .with_reduced_motion(true)
            .with_callbacks(AnimationCallbacks::new().on_finish(move || f.set(f.get() + 1)));

        let handle = driver
            .start(target, &"fadeIn".into(), &"slow".into(), AnimationOptions::new().autoplay(false))
            .unwrap()
            .unwrap();
        timeline.tick(16.0);
        assert!(handle.is_paused());
        assert_eq!(finished.get(), 0);

        assert!(handle.resume());
        timeline.tick(16.0);
        assert!(handle.is_finished());
        assert_eq!(finished.get(), 1);
    }

    #[test]
    fn test_reduced_motion_infinite_settles() {
        let timeline = Rc::new(Timeline::new());
        let target = TargetId::new();
        timeline.attach(target);
        let mut driver = KeyframeDriver::new(timeline.clone()).with_reduced_motion(true);

        let handle = driver
            .start(
                target,
                &"spin".into(),
                &"slow".into(),
                AnimationOptions::new().iterations(IterationCount::Infinite),
            )
            .unwrap()
            .unwrap();
        timeline.tick(16.0);
        assert!(handle.is_finished());
        assert_eq!(timeline.active_count(), 0);
    }

    #[test]
    fn test_set_reduced_motion_applies_to_next_start() {
        let (timeline, mut driver, target) = setup();
        let slow = driver
            .start(target, &"fadeIn".into(), &"slow".into(), AnimationOptions::new())
            .unwrap()
            .unwrap();

        driver.set_reduced_motion(true);
        assert!(driver.reduced_motion());
        timeline.tick(16.0);
        assert!(slow.is_running(), "running animation keeps its timing");

        let instant = driver
            .start(target, &"fadeOut".into(), &"slow".into(), AnimationOptions::new())
            .unwrap()
            .unwrap();
        timeline.tick(0.0);
        assert!(slow.is_cancelled());
        assert!(instant.is_finished());
    }

    #[test]
    fn test_drop_cancels_everything() {
        let (timeline, mut driver, target) = setup();
        let handle = driver
            .start(target, &"shake".into(), &"default".into(), AnimationOptions::new())
            .unwrap()
            .unwrap();
        drop(driver);
        assert!(handle.is_cancelled());
        assert!(timeline.computed_style(target).is_empty());
    }
}
