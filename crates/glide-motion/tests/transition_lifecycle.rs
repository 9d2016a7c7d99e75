use std::cell::RefCell;
use std::rc::Rc;

use glide_motion::{
    Clock, EventQueue, FrameClock, LifecycleState, MotionEvent, Presence, TransitionCallbacks,
    TransitionConfig, TransitionEvent, TransitionSession,
};

type Log = Rc<RefCell<Vec<&'static str>>>;

fn recording_callbacks(log: &Log) -> TransitionCallbacks {
    let hook = |name: &'static str| {
        let log = log.clone();
        move || log.borrow_mut().push(name)
    };
    TransitionCallbacks::new()
        .on_enter_start(hook("enter_start"))
        .on_enter_end(hook("enter_end"))
        .on_exit_start(hook("exit_start"))
        .on_exit_end(hook("exit_end"))
}

fn session(clock: &Rc<FrameClock>, config: TransitionConfig) -> (TransitionSession, Log) {
    let log: Log = Rc::default();
    let session = TransitionSession::builder(clock.clone(), config)
        .callbacks(recording_callbacks(&log))
        .build();
    (session, log)
}

fn count(log: &Log, name: &str) -> usize {
    log.borrow().iter().filter(|entry| **entry == name).count()
}

#[test]
fn enter_settles_after_enter_timeout() {
    let clock = Rc::new(FrameClock::new());
    let (session, log) = session(&clock, TransitionConfig::new(false).with_split_timeout(300, 500));

    assert!(session.set_visible(true));
    assert_eq!(session.state(), LifecycleState::Entering);
    assert_eq!(*log.borrow(), vec!["enter_start"]);

    clock.tick(299);
    assert_eq!(session.state(), LifecycleState::Entering);
    clock.tick(1);
    assert_eq!(session.state(), LifecycleState::Entered);
    assert_eq!(count(&log, "enter_end"), 1);

    clock.tick(10_000);
    assert_eq!(*log.borrow(), vec!["enter_start", "enter_end"]);
}

#[test]
fn reversing_mid_exit_cancels_exit_timer() {
    let clock = Rc::new(FrameClock::new());
    let (session, log) = session(&clock, TransitionConfig::new(true).with_timeout(300));
    assert_eq!(session.state(), LifecycleState::Entered);

    session.set_visible(false);
    clock.tick(50);
    session.set_visible(true);
    assert_eq!(session.state(), LifecycleState::Entering);
    assert_eq!(clock.pending(), 1, "only the fresh enter timer may remain");

    // The stale exit deadline (t=300) passes without effect.
    clock.tick(250);
    assert_eq!(session.state(), LifecycleState::Entering);
    clock.tick(100);
    assert_eq!(session.state(), LifecycleState::Entered);

    assert_eq!(count(&log, "exit_end"), 0);
    assert_eq!(*log.borrow(), vec!["exit_start", "enter_start", "enter_end"]);
}

#[test]
fn terminal_hooks_match_settled_directions() {
    // Deterministic pseudo-random toggle schedule.
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        seed
    };

    for _ in 0..20 {
        let clock = Rc::new(FrameClock::new());
        let (session, log) = session(&clock, TransitionConfig::new(false).with_split_timeout(120, 80));
        for _ in 0..40 {
            session.set_visible(next() % 2 == 0);
            clock.tick(next() % 150);
        }
        clock.tick(1_000);

        let log = log.borrow();
        let starts = log.iter().filter(|e| e.ends_with("_start")).count();
        let superseded = log
            .windows(2)
            .filter(|w| w[0].ends_with("_start") && w[1].ends_with("_start"))
            .count();
        let ends = log.iter().filter(|e| e.ends_with("_end")).count();
        assert_eq!(ends, starts - superseded);

        // Every end closes the start right before it, in the same direction.
        for w in log.windows(2).filter(|w| w[1].ends_with("_end")) {
            assert_eq!(w[0].trim_end_matches("_start"), w[1].trim_end_matches("_end"));
        }
        if let Some(last) = log.last() {
            assert!(last.ends_with("_end"));
        }
        assert_eq!(session.state(), session.state().settled());
    }
}

#[test]
fn repeated_intent_is_idempotent() {
    let clock = Rc::new(FrameClock::new());
    let (session, log) = session(&clock, TransitionConfig::new(false));

    assert!(session.set_visible(true));
    assert!(!session.set_visible(true));
    assert_eq!(clock.pending(), 1);
    assert_eq!(count(&log, "enter_start"), 1);

    clock.tick(300);
    assert!(!session.set_visible(true));
    assert_eq!(clock.pending(), 0);
    assert_eq!(*log.borrow(), vec!["enter_start", "enter_end"]);
}

#[test]
fn destroy_with_pending_timer_silences_hooks() {
    let clock = Rc::new(FrameClock::new());
    let (session, log) = session(&clock, TransitionConfig::new(false));

    session.set_visible(true);
    session.destroy();
    session.destroy();
    assert_eq!(clock.pending(), 0);
    assert!(!session.set_visible(false));

    clock.tick(5_000);
    assert_eq!(*log.borrow(), vec!["enter_start"]);
}

#[test]
fn reduced_motion_keeps_hook_order() {
    let run = |reduced: bool| {
        let clock = Rc::new(FrameClock::new());
        let config = TransitionConfig::new(false)
            .with_split_timeout(300, 500)
            .with_reduced_motion(reduced);
        let (session, log) = session(&clock, config);

        session.set_visible(true);
        assert_eq!(session.state(), LifecycleState::Entering);
        if reduced {
            clock.flush();
        } else {
            clock.tick(300);
        }
        assert_eq!(session.state(), LifecycleState::Entered);

        session.set_visible(false);
        if reduced {
            assert_eq!(clock.next_deadline(), Some(clock.now_ms()));
            clock.flush();
        } else {
            clock.tick(500);
        }
        assert_eq!(session.state(), LifecycleState::Exited);
        let log = log.borrow().clone();
        log
    };

    assert_eq!(run(true), run(false));
}

#[test]
fn reduced_motion_flip_on_live_session() {
    let clock = Rc::new(FrameClock::new());
    let (session, log) = session(&clock, TransitionConfig::new(false).with_split_timeout(300, 500));

    session.set_visible(true);
    session.set_reduced_motion(true);
    clock.tick(299);
    assert_eq!(session.state(), LifecycleState::Entering, "pending timer keeps its deadline");
    clock.tick(1);
    assert_eq!(session.state(), LifecycleState::Entered);

    session.set_visible(false);
    assert_eq!(clock.next_deadline(), Some(clock.now_ms()));
    clock.flush();
    assert_eq!(session.state(), LifecycleState::Exited);

    session.set_reduced_motion(false);
    session.set_visible(true);
    clock.tick(300);
    assert_eq!(session.state(), LifecycleState::Entered);
    session.set_visible(false);
    clock.tick(499);
    assert_eq!(session.state(), LifecycleState::Exiting);
    clock.tick(1);
    assert_eq!(session.state(), LifecycleState::Exited);

    let cycle = ["enter_start", "enter_end", "exit_start", "exit_end"];
    assert_eq!(*log.borrow(), [cycle, cycle].concat());
}

#[test]
fn unmount_on_exit_round_trip() {
    let clock = Rc::new(FrameClock::new());
    let presence = Presence::new(
        clock.clone(),
        TransitionConfig::new(true).with_unmount_on_exit(true),
    );
    assert!(presence.should_render());

    presence.set_visible(false);
    assert!(presence.should_render(), "still mounted while exiting");
    clock.tick(300);
    assert_eq!(presence.session().state(), LifecycleState::Exited);
    assert!(!presence.should_render());
    assert!(presence.render("panel").is_none());

    presence.set_visible(true);
    assert!(presence.should_render());
    let rendered = presence.render("panel").expect("rendered while entering");
    assert_eq!(rendered.state, LifecycleState::Entering);
}

#[test]
fn split_timeout_wins_over_uniform() {
    for config in [
        TransitionConfig::new(false).with_split_timeout(100, 400).with_timeout(50),
        TransitionConfig::new(false).with_timeout(50).with_split_timeout(100, 400),
    ] {
        let clock = Rc::new(FrameClock::new());
        let (session, _log) = session(&clock, config);

        session.set_visible(true);
        clock.tick(99);
        assert_eq!(session.state(), LifecycleState::Entering);
        clock.tick(1);
        assert_eq!(session.state(), LifecycleState::Entered);

        session.set_visible(false);
        clock.tick(399);
        assert_eq!(session.state(), LifecycleState::Exiting);
        clock.tick(1);
        assert_eq!(session.state(), LifecycleState::Exited);
    }
}

#[test]
fn events_follow_hook_order() {
    let clock = Rc::new(FrameClock::new());
    let events = EventQueue::shared();
    let log: Log = Rc::default();
    let session = TransitionSession::builder(clock.clone(), TransitionConfig::new(false).with_timeout(100))
        .callbacks(recording_callbacks(&log))
        .events(events.clone())
        .build();

    session.set_visible(true);
    clock.tick(40);
    session.set_visible(false);
    clock.tick(100);

    let names: Vec<&str> = events
        .borrow_mut()
        .drain()
        .map(|event| match event {
            MotionEvent::Transition(TransitionEvent::EnterStarted { .. }) => "enter_start",
            MotionEvent::Transition(TransitionEvent::EnterEnded { .. }) => "enter_end",
            MotionEvent::Transition(TransitionEvent::ExitStarted { .. }) => "exit_start",
            MotionEvent::Transition(TransitionEvent::ExitEnded { .. }) => "exit_end",
            MotionEvent::Animation(_) => "animation",
        })
        .collect();
    assert_eq!(names, *log.borrow());
    assert_eq!(names, vec!["enter_start", "exit_start", "exit_end"]);
}

#[test]
fn mount_on_enter_creates_presence_lazily() {
    let clock = Rc::new(FrameClock::new());
    let (session, _log) = session(
        &clock,
        TransitionConfig::new(false).with_mount_on_enter(true).with_timeout(100),
    );
    assert!(!session.is_mounted());
    assert!(!session.has_entered());

    session.set_visible(true);
    assert!(session.snapshot().is_mounted);
    clock.tick(100);
    assert!(session.has_entered());

    session.set_visible(false);
    clock.tick(100);
    let output = session.snapshot();
    assert_eq!(output.state, LifecycleState::Exited);
    assert!(output.is_mounted);
    assert!(!output.visible);
}
