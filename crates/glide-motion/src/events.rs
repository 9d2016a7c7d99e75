//! Lifecycle events for transitions and keyframe animations.
//!
//! Callbacks are the primary notification path. When an [`EventQueue`] is
//! attached, sessions and drivers also push serializable events onto it in
//! the same order the callbacks fire, so a host can poll after each frame.
//!
//! ```
//! use glide_motion::clock::FrameClock;
//! use glide_motion::events::EventQueue;
//! use glide_motion::transition::{TransitionConfig, TransitionSession};
//! use std::rc::Rc;
//!
//! let clock = Rc::new(FrameClock::new());
//! let events = EventQueue::shared();
//! let session = TransitionSession::builder(clock.clone(), TransitionConfig::new(false))
//!     .events(events.clone())
//!     .build();
//!
//! session.set_visible(true);
//! clock.tick(300);
//! let kinds: Vec<_> = events.borrow_mut().drain().map(|e| e.is_ended()).collect();
//! assert_eq!(kinds, vec![false, true]);
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::keyframes::AnimationId;
use crate::node_ref::TargetId;
use crate::transition::{LifecycleState, SessionId};

/// Emitted by a transition session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransitionEvent {
    EnterStarted { session: SessionId, at_ms: u64 },
    EnterEnded { session: SessionId, at_ms: u64 },
    ExitStarted { session: SessionId, at_ms: u64 },
    ExitEnded { session: SessionId, at_ms: u64 },
}

impl TransitionEvent {
    pub fn session(&self) -> SessionId {
        match self {
            Self::EnterStarted { session, .. }
            | Self::EnterEnded { session, .. }
            | Self::ExitStarted { session, .. }
            | Self::ExitEnded { session, .. } => *session,
        }
    }

    pub fn at_ms(&self) -> u64 {
        match self {
            Self::EnterStarted { at_ms, .. }
            | Self::EnterEnded { at_ms, .. }
            | Self::ExitStarted { at_ms, .. }
            | Self::ExitEnded { at_ms, .. } => *at_ms,
        }
    }

    /// The state the session was in when this event fired.
    pub fn state(&self) -> LifecycleState {
        match self {
            Self::EnterStarted { .. } => LifecycleState::Entering,
            Self::EnterEnded { .. } => LifecycleState::Entered,
            Self::ExitStarted { .. } => LifecycleState::Exiting,
            Self::ExitEnded { .. } => LifecycleState::Exited,
        }
    }
}

/// Emitted by a keyframe driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnimationEvent {
    Started { animation_id: AnimationId, target: TargetId },
    Completed { animation_id: AnimationId, target: TargetId },
    Cancelled { animation_id: AnimationId, target: TargetId },
    Paused { animation_id: AnimationId, target: TargetId },
    Resumed { animation_id: AnimationId, target: TargetId },
}

impl AnimationEvent {
    pub fn animation_id(&self) -> AnimationId {
        match self {
            Self::Started { animation_id, .. }
            | Self::Completed { animation_id, .. }
            | Self::Cancelled { animation_id, .. }
            | Self::Paused { animation_id, .. }
            | Self::Resumed { animation_id, .. } => *animation_id,
        }
    }

    pub fn target(&self) -> TargetId {
        match self {
            Self::Started { target, .. }
            | Self::Completed { target, .. }
            | Self::Cancelled { target, .. }
            | Self::Paused { target, .. }
            | Self::Resumed { target, .. } => *target,
        }
    }
}

/// Either kind of event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MotionEvent {
    Transition(TransitionEvent),
    Animation(AnimationEvent),
}

impl MotionEvent {
    pub fn is_started(&self) -> bool {
        matches!(
            self,
            Self::Transition(TransitionEvent::EnterStarted { .. } | TransitionEvent::ExitStarted { .. })
                | Self::Animation(AnimationEvent::Started { .. })
        )
    }

    pub fn is_ended(&self) -> bool {
        matches!(
            self,
            Self::Transition(TransitionEvent::EnterEnded { .. } | TransitionEvent::ExitEnded { .. })
                | Self::Animation(AnimationEvent::Completed { .. })
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Animation(AnimationEvent::Cancelled { .. }))
    }
}

impl From<TransitionEvent> for MotionEvent {
    fn from(event: TransitionEvent) -> Self {
        Self::Transition(event)
    }
}

impl From<AnimationEvent> for MotionEvent {
    fn from(event: AnimationEvent) -> Self {
        Self::Animation(event)
    }
}

/// Queue shared between the producers of one frame and the host.
pub type SharedEventQueue = Rc<RefCell<EventQueue>>;

/// FIFO of motion events.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<MotionEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedEventQueue {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn push(&mut self, event: impl Into<MotionEvent>) {
        self.events.push_back(event.into());
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn pop(&mut self) -> Option<MotionEvent> {
        self.events.pop_front()
    }

    pub fn peek(&self) -> Option<&MotionEvent> {
        self.events.front()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = MotionEvent> + '_ {
        self.events.drain(..)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Transition events for one session, oldest first.
    pub fn for_session(&self, session: SessionId) -> Vec<&TransitionEvent> {
        self.events
            .iter()
            .filter_map(|e| match e {
                MotionEvent::Transition(t) if t.session() == session => Some(t),
                _ => None,
            })
            .collect()
    }

    /// Animation events for one target, oldest first.
    pub fn for_target(&self, target: TargetId) -> Vec<&AnimationEvent> {
        self.events
            .iter()
            .filter_map(|e| match e {
                MotionEvent::Animation(a) if a.target() == target => Some(a),
                _ => None,
            })
            .collect()
    }
}

/// Push onto an optional shared queue.
pub(crate) fn emit(queue: Option<&SharedEventQueue>, event: impl Into<MotionEvent>) {
    if let Some(queue) = queue {
        queue.borrow_mut().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_event_accessors() {
        let event = TransitionEvent::ExitEnded { session: SessionId(4), at_ms: 500 };
        assert_eq!(event.session(), SessionId(4));
        assert_eq!(event.at_ms(), 500);
        assert_eq!(event.state(), LifecycleState::Exited);
    }

    #[test]
    fn test_event_kind_predicates() {
        let started: MotionEvent =
            TransitionEvent::EnterStarted { session: SessionId(1), at_ms: 0 }.into();
        assert!(started.is_started());
        assert!(!started.is_ended());

        let cancelled: MotionEvent =
            AnimationEvent::Cancelled { animation_id: AnimationId(9), target: TargetId(2) }.into();
        assert!(cancelled.is_cancelled());
        assert!(!cancelled.is_ended());
    }

    #[test]
    fn test_queue_filters_and_drains_in_order() {
        let mut queue = EventQueue::new();
        queue.push(TransitionEvent::EnterStarted { session: SessionId(1), at_ms: 0 });
        queue.push(AnimationEvent::Started { animation_id: AnimationId(1), target: TargetId(7) });
        queue.push(TransitionEvent::EnterEnded { session: SessionId(1), at_ms: 300 });

        assert_eq!(queue.for_session(SessionId(1)).len(), 2);
        assert_eq!(queue.for_target(TargetId(7)).len(), 1);
        assert!(queue.for_target(TargetId(8)).is_empty());

        let drained: Vec<_> = queue.drain().collect();
        assert_eq!(drained.len(), 3);
        assert!(drained[0].is_started());
        assert!(drained[2].is_ended());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let event: MotionEvent =
            TransitionEvent::ExitStarted { session: SessionId(3), at_ms: 50 }.into();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "transition");
        assert_eq!(json["type"], "exit_started");
        assert_eq!(json["at_ms"], 50);

        let back: MotionEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
