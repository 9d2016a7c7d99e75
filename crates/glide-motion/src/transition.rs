//! Enter/exit lifecycle state machine.
//!
//! A [`TransitionSession`] turns a boolean visibility intent into one of four
//! lifecycle states and owns the single timer that moves a transient state
//! (`Entering`, `Exiting`) to its terminal state (`Entered`, `Exited`).
//!
//! ```text
//! Exited  --(visible)--> Entering --(timer)--> Entered
//! Entered --(hidden)---> Exiting  --(timer)--> Exited
//! Entering --(hidden)--> Exiting     interrupts the enter timer
//! Exiting --(visible)--> Entering    interrupts the exit timer
//! ```
//!
//! Every intent change cancels the outstanding timer before anything else.
//! When a timer fires it checks that it is still the session's pending
//! timer (by handle, not by flag) and that the session has not been
//! destroyed, so superseded timers never reach a callback.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, TimerHandle};
use crate::effects::Effect;
use crate::events::{self, SharedEventQueue, TransitionEvent};
use crate::presence::{self, PresencePolicy};
use crate::presets::TimingPreset;
use crate::style::StyleSnapshot;

/// Identifies one session in logs and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl SessionId {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Lifecycle phase of a transitioning element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    #[default]
    Exited,
    Entering,
    Entered,
    Exiting,
}

/// Which way a transient state is heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionDirection {
    Enter,
    Exit,
}

impl LifecycleState {
    /// `Entering` and `Exiting` always have a timer pending.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Entering | Self::Exiting)
    }

    pub fn direction(self) -> Option<TransitionDirection> {
        match self {
            Self::Entering => Some(TransitionDirection::Enter),
            Self::Exiting => Some(TransitionDirection::Exit),
            Self::Entered | Self::Exited => None,
        }
    }

    /// Whether this state already points toward visible.
    pub fn implies_visible(self) -> bool {
        matches!(self, Self::Entering | Self::Entered)
    }

    /// The state a transient state settles into.
    pub fn settled(self) -> Self {
        match self {
            Self::Entering | Self::Entered => Self::Entered,
            Self::Exiting | Self::Exited => Self::Exited,
        }
    }
}

/// The transition function: where `current` goes when the intent becomes
/// `visible`. `None` means the state already heads that way.
pub fn next_state(current: LifecycleState, visible: bool) -> Option<LifecycleState> {
    match (current.implies_visible(), visible) {
        (false, true) => Some(LifecycleState::Entering),
        (true, false) => Some(LifecycleState::Exiting),
        _ => None,
    }
}

/// Enter and exit durations.
///
/// `Split` is authoritative: a uniform value is shorthand for the same
/// duration in both directions and never overrides an explicit split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeoutSpec {
    Uniform(u32),
    Split { enter: u32, exit: u32 },
}

impl Default for TimeoutSpec {
    fn default() -> Self {
        Self::Uniform(300)
    }
}

impl TimeoutSpec {
    pub fn enter_ms(self) -> u32 {
        match self {
            Self::Uniform(ms) => ms,
            Self::Split { enter, .. } => enter,
        }
    }

    pub fn exit_ms(self) -> u32 {
        match self {
            Self::Uniform(ms) => ms,
            Self::Split { exit, .. } => exit,
        }
    }

    fn for_direction(self, direction: TransitionDirection) -> u32 {
        match direction {
            TransitionDirection::Enter => self.enter_ms(),
            TransitionDirection::Exit => self.exit_ms(),
        }
    }
}

/// Static configuration of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionConfig {
    /// Initial visibility intent.
    pub visible: bool,
    /// Animate the initial enter when mounted visible.
    pub appear: bool,
    pub mount_on_enter: bool,
    pub unmount_on_exit: bool,
    pub timeout: TimeoutSpec,
    /// Collapse both durations to zero.
    pub reduced_motion: bool,
    /// Lower bound on durations when motion is not reduced.
    pub min_duration_ms: Option<u32>,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self::new(false)
    }
}

impl TransitionConfig {
    pub fn new(visible: bool) -> Self {
        Self {
            visible,
            appear: false,
            mount_on_enter: false,
            unmount_on_exit: false,
            timeout: TimeoutSpec::default(),
            reduced_motion: false,
            min_duration_ms: None,
        }
    }

    pub fn with_appear(mut self, appear: bool) -> Self {
        self.appear = appear;
        self
    }

    pub fn with_mount_on_enter(mut self, mount_on_enter: bool) -> Self {
        self.mount_on_enter = mount_on_enter;
        self
    }

    pub fn with_unmount_on_exit(mut self, unmount_on_exit: bool) -> Self {
        self.unmount_on_exit = unmount_on_exit;
        self
    }

    /// Same duration both ways. Ignored if a split timeout is already set.
    pub fn with_timeout(mut self, ms: u32) -> Self {
        if !matches!(self.timeout, TimeoutSpec::Split { .. }) {
            self.timeout = TimeoutSpec::Uniform(ms);
        }
        self
    }

    pub fn with_split_timeout(mut self, enter: u32, exit: u32) -> Self {
        self.timeout = TimeoutSpec::Split { enter, exit };
        self
    }

    /// Uniform timeout covering the preset's delay plus duration.
    pub fn with_timing(self, timing: &TimingPreset) -> Self {
        self.with_timeout(timing.delay_ms.saturating_add(timing.duration_ms))
    }

    pub fn with_reduced_motion(mut self, reduced_motion: bool) -> Self {
        self.reduced_motion = reduced_motion;
        self
    }

    pub fn with_min_duration(mut self, min_ms: u32) -> Self {
        self.min_duration_ms = Some(min_ms);
        self
    }

    pub fn policy(&self) -> PresencePolicy {
        PresencePolicy {
            mount_on_enter: self.mount_on_enter,
            unmount_on_exit: self.unmount_on_exit,
        }
    }

    /// Duration actually scheduled for a direction.
    pub fn effective_timeout_ms(&self, direction: TransitionDirection) -> u32 {
        if self.reduced_motion {
            return 0;
        }
        let ms = self.timeout.for_direction(direction);
        self.min_duration_ms.map_or(ms, |min| ms.max(min))
    }
}

/// Shared lifecycle callback.
pub type Callback = Rc<dyn Fn()>;

/// Optional lifecycle hooks. Absent hooks are skipped.
#[derive(Clone, Default)]
pub struct TransitionCallbacks {
    pub on_enter_start: Option<Callback>,
    pub on_enter_end: Option<Callback>,
    pub on_exit_start: Option<Callback>,
    pub on_exit_end: Option<Callback>,
}

impl TransitionCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_enter_start(mut self, f: impl Fn() + 'static) -> Self {
        self.on_enter_start = Some(Rc::new(f));
        self
    }

    pub fn on_enter_end(mut self, f: impl Fn() + 'static) -> Self {
        self.on_enter_end = Some(Rc::new(f));
        self
    }

    pub fn on_exit_start(mut self, f: impl Fn() + 'static) -> Self {
        self.on_exit_start = Some(Rc::new(f));
        self
    }

    pub fn on_exit_end(mut self, f: impl Fn() + 'static) -> Self {
        self.on_exit_end = Some(Rc::new(f));
        self
    }

    fn for_state(&self, state: LifecycleState) -> Option<Callback> {
        match state {
            LifecycleState::Entering => self.on_enter_start.clone(),
            LifecycleState::Entered => self.on_enter_end.clone(),
            LifecycleState::Exiting => self.on_exit_start.clone(),
            LifecycleState::Exited => self.on_exit_end.clone(),
        }
    }
}

impl fmt::Debug for TransitionCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionCallbacks")
            .field("on_enter_start", &self.on_enter_start.is_some())
            .field("on_enter_end", &self.on_enter_end.is_some())
            .field("on_exit_start", &self.on_exit_start.is_some())
            .field("on_exit_end", &self.on_exit_end.is_some())
            .finish()
    }
}

/// What a session exposes to effects and accessibility plumbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutput {
    pub state: LifecycleState,
    pub is_mounted: bool,
    pub visible: bool,
}

struct SessionState {
    state: LifecycleState,
    visible: bool,
    pending: Option<TimerHandle>,
    has_entered: bool,
    destroyed: bool,
    phase_started_ms: u64,
    phase_duration_ms: u32,
    config: TransitionConfig,
    callbacks: TransitionCallbacks,
    events: Option<SharedEventQueue>,
}

impl SessionState {
    fn event(&self, id: SessionId, state: LifecycleState, at_ms: u64) -> TransitionEvent {
        match state {
            LifecycleState::Entering => TransitionEvent::EnterStarted { session: id, at_ms },
            LifecycleState::Entered => TransitionEvent::EnterEnded { session: id, at_ms },
            LifecycleState::Exiting => TransitionEvent::ExitStarted { session: id, at_ms },
            LifecycleState::Exited => TransitionEvent::ExitEnded { session: id, at_ms },
        }
    }
}

/// Builder for [`TransitionSession`]; the appear transition, if any, starts
/// in [`SessionBuilder::build`] so attached hooks observe it.
pub struct SessionBuilder {
    clock: Rc<dyn Clock>,
    config: TransitionConfig,
    callbacks: TransitionCallbacks,
    events: Option<SharedEventQueue>,
}

impl SessionBuilder {
    pub fn callbacks(mut self, callbacks: TransitionCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn events(mut self, events: SharedEventQueue) -> Self {
        self.events = Some(events);
        self
    }

    pub fn build(self) -> TransitionSession {
        let visible = self.config.visible;
        let appear = visible && self.config.appear;
        let state = if visible && !appear {
            LifecycleState::Entered
        } else {
            LifecycleState::Exited
        };

        let session = TransitionSession {
            id: SessionId::new(),
            inner: Rc::new(RefCell::new(SessionState {
                state,
                visible: visible && !appear,
                pending: None,
                has_entered: state == LifecycleState::Entered,
                destroyed: false,
                phase_started_ms: self.clock.now_ms(),
                phase_duration_ms: 0,
                config: self.config,
                callbacks: self.callbacks,
                events: self.events,
            })),
            clock: self.clock,
        };
        tracing::trace!(session = %session.id, ?state, appear, "transition session created");

        if appear {
            session.set_visible(true);
        }
        session
    }
}

/// Live lifecycle of one mounted element.
///
/// Owned by exactly one component instance. Dropping the session (or
/// calling [`destroy`](Self::destroy)) cancels its pending timer.
pub struct TransitionSession {
    id: SessionId,
    inner: Rc<RefCell<SessionState>>,
    clock: Rc<dyn Clock>,
}

impl TransitionSession {
    pub fn new(clock: Rc<dyn Clock>, config: TransitionConfig) -> Self {
        Self::builder(clock, config).build()
    }

    pub fn builder(clock: Rc<dyn Clock>, config: TransitionConfig) -> SessionBuilder {
        SessionBuilder {
            clock,
            config,
            callbacks: TransitionCallbacks::default(),
            events: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.borrow().state
    }

    /// Current visibility intent.
    pub fn visible(&self) -> bool {
        self.inner.borrow().visible
    }

    pub fn has_entered(&self) -> bool {
        self.inner.borrow().has_entered
    }

    pub fn has_pending_timer(&self) -> bool {
        self.inner.borrow().pending.is_some()
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.borrow().destroyed
    }

    pub fn config(&self) -> TransitionConfig {
        self.inner.borrow().config.clone()
    }

    /// Whether the element belongs in the render tree right now.
    pub fn is_mounted(&self) -> bool {
        let inner = self.inner.borrow();
        presence::should_render(inner.state, inner.has_entered, inner.config.policy())
    }

    pub fn snapshot(&self) -> TransitionOutput {
        TransitionOutput {
            state: self.state(),
            is_mounted: self.is_mounted(),
            visible: self.visible(),
        }
    }

    pub fn progress_direction(&self) -> Option<TransitionDirection> {
        self.state().direction()
    }

    /// Fraction of the current transient phase that has elapsed; 1.0 when
    /// the session is settled.
    pub fn progress(&self) -> f32 {
        let inner = self.inner.borrow();
        if !inner.state.is_transient() || inner.phase_duration_ms == 0 {
            return 1.0;
        }
        let elapsed = self.clock.now_ms().saturating_sub(inner.phase_started_ms);
        (elapsed as f32 / inner.phase_duration_ms as f32).min(1.0)
    }

    pub fn style_delta(&self, effect: &dyn Effect) -> StyleSnapshot {
        effect.style(self.state())
    }

    /// Apply a new visibility intent. Returns `false` when the intent did
    /// not change (no timer is touched and no hook fires).
    pub fn set_visible(&self, visible: bool) -> bool {
        let (started, callback, event) = {
            let mut inner = self.inner.borrow_mut();
            if inner.destroyed || inner.visible == visible {
                return false;
            }
            inner.visible = visible;

            if let Some(stale) = inner.pending.take() {
                self.clock.cancel(stale);
                tracing::debug!(session = %self.id, timer = stale.id(), "superseded pending timer");
            }

            let Some(next) = next_state(inner.state, visible) else {
                return true;
            };
            let Some(direction) = next.direction() else {
                return true;
            };

            let previous = inner.state;
            let delay = inner.config.effective_timeout_ms(direction);
            let now = self.clock.now_ms();
            inner.state = next;
            inner.phase_started_ms = now;
            inner.phase_duration_ms = delay;
            inner.pending = Some(self.schedule_settle(delay));

            tracing::trace!(session = %self.id, from = ?previous, to = ?next, delay_ms = delay, "transition started");
            (
                next,
                inner.callbacks.for_state(next),
                inner.event(self.id, next, now),
            )
        };

        self.notify(started, callback, event);
        true
    }

    /// Update the reduced-motion signal. The next scheduled timer uses it;
    /// a timer already pending keeps its original deadline.
    pub fn set_reduced_motion(&self, reduced_motion: bool) {
        let mut inner = self.inner.borrow_mut();
        if inner.config.reduced_motion != reduced_motion {
            tracing::trace!(session = %self.id, reduced_motion, "reduced motion changed");
            inner.config.reduced_motion = reduced_motion;
        }
    }

    /// Toggle the visibility intent.
    pub fn toggle(&self) -> bool {
        let visible = self.visible();
        self.set_visible(!visible)
    }

    /// Cancel the pending timer and stop reacting to intent changes.
    /// Safe to call more than once.
    pub fn destroy(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.destroyed {
            return;
        }
        inner.destroyed = true;
        if let Some(pending) = inner.pending.take() {
            self.clock.cancel(pending);
        }
        tracing::trace!(session = %self.id, state = ?inner.state, "transition session destroyed");
    }

    fn schedule_settle(&self, delay_ms: u32) -> TimerHandle {
        let session = Rc::downgrade(&self.inner);
        let clock = Rc::downgrade(&self.clock);
        let id = self.id;
        let own_handle: Rc<Cell<Option<TimerHandle>>> = Rc::new(Cell::new(None));
        let slot = own_handle.clone();

        let handle = self.clock.schedule(
            u64::from(delay_ms),
            Box::new(move || settle(id, &session, &clock, slot.get())),
        );
        own_handle.set(Some(handle));
        handle
    }

    fn notify(&self, state: LifecycleState, callback: Option<Callback>, event: TransitionEvent) {
        let events = self.inner.borrow().events.clone();
        events::emit(events.as_ref(), event);
        if let Some(callback) = callback {
            callback();
        }
        tracing::trace!(session = %self.id, ?state, "transition hook delivered");
    }
}

/// Timer body: move a transient state to its terminal state if this timer
/// is still the one the session is waiting on.
fn settle(
    id: SessionId,
    session: &Weak<RefCell<SessionState>>,
    clock: &Weak<dyn Clock>,
    handle: Option<TimerHandle>,
) {
    let (Some(session), Some(clock)) = (session.upgrade(), clock.upgrade()) else {
        return;
    };

    let (callback, event, events) = {
        let mut inner = session.borrow_mut();
        if inner.destroyed || handle.is_none() || inner.pending != handle {
            tracing::debug!(session = %id, "ignored stale transition timer");
            return;
        }
        inner.pending = None;
        if !inner.state.is_transient() {
            return;
        }

        let terminal = inner.state.settled();
        inner.state = terminal;
        if terminal == LifecycleState::Entered {
            inner.has_entered = true;
        }
        tracing::trace!(session = %id, state = ?terminal, "transition completed");
        (
            inner.callbacks.for_state(terminal),
            inner.event(id, terminal, clock.now_ms()),
            inner.events.clone(),
        )
    };

    events::emit(events.as_ref(), event);
    if let Some(callback) = callback {
        callback();
    }
}

impl Drop for TransitionSession {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for TransitionSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("TransitionSession")
            .field("id", &self.id)
            .field("state", &inner.state)
            .field("visible", &inner.visible)
            .field("pending", &inner.pending)
            .field("destroyed", &inner.destroyed)
            .finish()
    }
}

static_assertions::assert_not_impl_any!(TransitionSession: Send, Sync);
static_assertions::assert_impl_all!(LifecycleState: Send, Sync, Copy);
