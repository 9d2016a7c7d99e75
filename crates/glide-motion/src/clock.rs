//! Timer capability used by transition sessions.
//!
//! The engine never touches wall-clock time. Sessions schedule deferred tasks
//! through a [`Clock`], and the host decides when time moves. [`FrameClock`]
//! is the host-driven implementation: the render loop (or a test) calls
//! [`FrameClock::tick`] with the frame delta and every due task runs in
//! deadline order.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Identity of one scheduled task. Never reused by the clock that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// A deferred task.
pub type Task = Box<dyn FnOnce()>;

/// Schedules and cancels deferred tasks.
pub trait Clock {
    /// Current time in milliseconds on this clock's timeline.
    fn now_ms(&self) -> u64;

    /// Run `task` once, `delay_ms` from now.
    fn schedule(&self, delay_ms: u64, task: Task) -> TimerHandle;

    /// Cancel a scheduled task. Returns `false` if it already ran or was
    /// already cancelled.
    fn cancel(&self, handle: TimerHandle) -> bool;
}

#[derive(Default)]
struct Timers {
    now: u64,
    next_id: u64,
    /// Keyed by (deadline, id) so equal deadlines run in scheduling order.
    queue: BTreeMap<(u64, u64), Task>,
    deadlines: HashMap<u64, u64>,
}

/// Virtual clock advanced by the host.
///
/// Tasks scheduled from inside a running task are picked up in the same
/// `tick` if their deadline falls inside it. A zero-delay task runs on the
/// next `tick`, including `tick(0)`.
#[derive(Default)]
pub struct FrameClock {
    timers: RefCell<Timers>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance time by `delta_ms`, running due tasks. Returns how many ran.
    pub fn tick(&self, delta_ms: u64) -> usize {
        let target = self.timers.borrow().now.saturating_add(delta_ms);
        let mut ran = 0;

        loop {
            // The borrow must end before the task runs: tasks reschedule.
            let task = {
                let mut timers = self.timers.borrow_mut();
                let due = timers
                    .queue
                    .first_key_value()
                    .is_some_and(|(&(deadline, _), _)| deadline <= target);
                if !due {
                    break;
                }
                let Some(((deadline, id), task)) = timers.queue.pop_first() else {
                    break;
                };
                timers.deadlines.remove(&id);
                timers.now = timers.now.max(deadline);
                task
            };
            task();
            ran += 1;
        }

        self.timers.borrow_mut().now = target;
        ran
    }

    /// Run everything already due without moving time.
    pub fn flush(&self) -> usize {
        self.tick(0)
    }

    /// Advance to an absolute time. Moving backwards is a no-op.
    pub fn advance_to(&self, time_ms: u64) -> usize {
        let now = self.now_ms();
        self.tick(time_ms.saturating_sub(now))
    }

    /// Number of live (scheduled, not cancelled, not yet run) tasks.
    pub fn pending(&self) -> usize {
        self.timers.borrow().queue.len()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timers
            .borrow()
            .queue
            .first_key_value()
            .map(|(&(deadline, _), _)| deadline)
    }
}

impl Clock for FrameClock {
    fn now_ms(&self) -> u64 {
        self.timers.borrow().now
    }

    fn schedule(&self, delay_ms: u64, task: Task) -> TimerHandle {
        let mut timers = self.timers.borrow_mut();
        timers.next_id += 1;
        let id = timers.next_id;
        let deadline = timers.now.saturating_add(delay_ms);
        timers.queue.insert((deadline, id), task);
        timers.deadlines.insert(id, deadline);
        TimerHandle(id)
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        let mut timers = self.timers.borrow_mut();
        match timers.deadlines.remove(&handle.0) {
            Some(deadline) => timers.queue.remove(&(deadline, handle.0)).is_some(),
            None => false,
        }
    }
}

impl fmt::Debug for FrameClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let timers = self.timers.borrow();
        f.debug_struct("FrameClock")
            .field("now", &timers.now)
            .field("pending", &timers.queue.len())
            .finish()
    }
}

static_assertions::assert_not_impl_any!(FrameClock: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Task) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let make = {
            let log = log.clone();
            move |name: &'static str| -> Task {
                let log = log.clone();
                Box::new(move || log.borrow_mut().push(name))
            }
        };
        (log, make)
    }

    #[test]
    fn test_runs_in_deadline_then_schedule_order() {
        let clock = FrameClock::new();
        let (log, task) = recorder();
        clock.schedule(20, task("late"));
        clock.schedule(10, task("a"));
        clock.schedule(10, task("b"));

        assert_eq!(clock.tick(9), 0);
        assert_eq!(clock.tick(11), 3);
        assert_eq!(*log.borrow(), vec!["a", "b", "late"]);
        assert_eq!(clock.now_ms(), 20);
    }

    #[test]
    fn test_cancel_prevents_run() {
        let clock = FrameClock::new();
        let (log, task) = recorder();
        let handle = clock.schedule(5, task("never"));
        assert_eq!(clock.pending(), 1);
        assert!(clock.cancel(handle));
        assert!(!clock.cancel(handle));
        assert_eq!(clock.pending(), 0);

        clock.tick(100);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_zero_delay_runs_on_flush() {
        let clock = FrameClock::new();
        let (log, task) = recorder();
        clock.schedule(0, task("now"));
        assert!(log.borrow().is_empty());
        assert_eq!(clock.flush(), 1);
        assert_eq!(*log.borrow(), vec!["now"]);
    }

    #[test]
    fn test_nested_schedule_within_same_tick() {
        let clock = Rc::new(FrameClock::new());
        let (log, task) = recorder();
        let inner = task("inner");
        let outer_clock = clock.clone();
        clock.schedule(
            10,
            Box::new(move || {
                outer_clock.schedule(5, inner);
            }),
        );

        clock.tick(14);
        assert!(log.borrow().is_empty());
        clock.tick(1);
        assert_eq!(*log.borrow(), vec!["inner"]);
    }

    #[test]
    fn test_task_sees_its_deadline_as_now() {
        let clock = Rc::new(FrameClock::new());
        let seen = Rc::new(RefCell::new(None));
        let (c, s) = (clock.clone(), seen.clone());
        clock.schedule(30, Box::new(move || *s.borrow_mut() = Some(c.now_ms())));
        clock.tick(100);
        assert_eq!(*seen.borrow(), Some(30));
        assert_eq!(clock.now_ms(), 100);
    }

    #[test]
    fn test_handles_are_unique() {
        let clock = FrameClock::new();
        let a = clock.schedule(0, Box::new(|| {}));
        clock.flush();
        let b = clock.schedule(0, Box::new(|| {}));
        assert_ne!(a, b);
    }
}
