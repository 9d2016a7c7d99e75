use std::rc::Rc;

use anyhow::{Context, Result};
use glide_config::GlideConfig;
use glide_motion::{
    AnimationCallbacks, AnimationOptions, Clock, Effect, EventQueue, Fade, FrameClock, IterationCount,
    KeyframeDriver, MotionEvent, PresenceGroup, Slide, SlideDirection, StyleSnapshot, TargetId,
    Timeline, TransitionCallbacks, TransitionSession,
};

mod scripts;
use scripts::Script;

const FRAME_MS: u64 = 16;
const MAX_FRAMES: usize = 600;

fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!("Starting glide demo v{}", env!("CARGO_PKG_VERSION"));

    let config = GlideConfig::load();
    let platform_reduced = std::env::var("GLIDE_PLATFORM_REDUCED_MOTION").is_ok()
        || std::env::args().any(|a| a == "--reduced-motion");
    let reduced = config.motion.effective_reduced_motion(platform_reduced);

    let script = std::env::var("DEMO_SCRIPT")
        .ok()
        .or_else(|| {
            std::env::args()
                .find_map(|a| a.strip_prefix("--script=").map(str::to_owned))
        })
        .map(|name| Script::parse(&name))
        .transpose()?;

    match script {
        Some(Script::Toggle) => run_toggle(&config, platform_reduced)?,
        Some(Script::Keyframes) => run_keyframes(reduced)?,
        Some(Script::Group) => run_group(&config, platform_reduced)?,
        None => {
            run_toggle(&config, platform_reduced)?;
            run_keyframes(reduced)?;
            run_group(&config, platform_reduced)?;
        }
    }
    Ok(())
}

fn css(style: &StyleSnapshot) -> String {
    style
        .iter()
        .map(|(property, value)| format!("{}: {}", property.css_name(), value))
        .collect::<Vec<_>>()
        .join("; ")
}

fn log_events(events: &glide_motion::SharedEventQueue) {
    for event in events.borrow_mut().drain() {
        match event {
            MotionEvent::Transition(event) => {
                tracing::info!(session = %event.session(), at_ms = event.at_ms(), "{:?}", event.state())
            }
            MotionEvent::Animation(event) => tracing::info!(?event, "animation"),
        }
    }
}

/// Show and hide a panel a few times, including a reversal mid-exit.
fn run_toggle(config: &GlideConfig, platform_reduced: bool) -> Result<()> {
    tracing::info!("script: toggle");
    let clock = Rc::new(FrameClock::new());
    let events = EventQueue::shared();
    let transition = config.transition_config(false, platform_reduced)?;
    let session = TransitionSession::builder(clock.clone(), transition)
        .callbacks(
            TransitionCallbacks::new()
                .on_enter_end(|| tracing::debug!("panel fully shown"))
                .on_exit_end(|| tracing::debug!("panel fully hidden")),
        )
        .events(events.clone())
        .build();

    let fade = Fade::default();
    let slide = Slide::new(SlideDirection::Up);
    tracing::info!(transition = %fade.css_transition(&config.timing.resolve()?), "fade transition");

    // (at_ms, visible)
    let schedule = [(0, true), (400, false), (480, true), (900, false)];
    let mut next = schedule.iter().peekable();
    while clock.now_ms() <= 1_400 {
        while let Some(&&(at, visible)) = next.peek() {
            if at > clock.now_ms() {
                break;
            }
            tracing::info!(at_ms = at, visible, "set_visible");
            session.set_visible(visible);
            next.next();
        }
        clock.tick(FRAME_MS);
        log_events(&events);
        if session.state().is_transient() && clock.now_ms() % (FRAME_MS * 8) == 0 {
            let mut style = session.style_delta(&fade);
            style.merge(&session.style_delta(&slide));
            tracing::debug!(state = ?session.state(), progress = session.progress(), style = %css(&style));
        }
    }
    tracing::info!(state = ?session.state(), mounted = session.is_mounted(), "toggle done");
    Ok(())
}

/// Play a pulse three times, then restart with the bounce sequence.
fn run_keyframes(reduced: bool) -> Result<()> {
    tracing::info!("script: keyframes");
    let timeline = Rc::new(Timeline::new());
    let events = EventQueue::shared();
    let target = TargetId::new();
    timeline.attach(target);

    let mut driver = KeyframeDriver::new(timeline.clone())
        .with_reduced_motion(reduced)
        .with_callbacks(AnimationCallbacks::new().on_finish(|| tracing::debug!("animation finished")))
        .with_events(events.clone());

    let options = AnimationOptions::new().iterations(IterationCount::count(3).unwrap_or_default());
    driver.start(target, &"pulse".into(), &"fast".into(), options)?;
    for frame in 0..20 {
        timeline.tick(FRAME_MS as f64);
        if frame % 5 == 0 {
            tracing::debug!(style = %css(&timeline.computed_style(target)), "pulse");
        }
    }

    let handle = driver
        .start(target, &"bounce".into(), &"bounce".into(), AnimationOptions::new())?
        .context("demo target is attached")?;
    log_events(&events);
    // A zero-duration playback still needs one tick to report completion.
    for _ in 0..MAX_FRAMES {
        timeline.tick(FRAME_MS as f64);
        if handle.is_finished() {
            break;
        }
    }
    log_events(&events);
    tracing::info!(
        finished = handle.is_finished(),
        style = %css(&timeline.computed_style(target)),
        "keyframes done"
    );
    Ok(())
}

/// Add and remove keyed toasts and watch them enter and exit.
fn run_group(config: &GlideConfig, platform_reduced: bool) -> Result<()> {
    tracing::info!("script: group");
    let clock = Rc::new(FrameClock::new());
    let template = config.transition_config(true, platform_reduced)?;
    let mut group = PresenceGroup::new(clock.clone(), template).with_initial(false);

    group.sync(["a", "b"]);
    group.sync(["b", "c"]);
    tracing::info!(keys = ?group.rendered_keys(), exiting = group.is_exiting(), "synced");

    while group.is_exiting() || clock.pending() > 0 {
        clock.tick(FRAME_MS);
        group.prune();
    }
    for rendered in group.render(|key| key.to_uppercase()) {
        tracing::info!(child = %rendered.child, state = ?rendered.state, "rendered");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_script_runs_to_completion() -> Result<()> {
        let config = GlideConfig::default();
        for reduced in [false, true] {
            run_toggle(&config, reduced)?;
            run_keyframes(reduced)?;
            run_group(&config, reduced)?;
        }
        Ok(())
    }

    #[test]
    fn script_names_parse() {
        assert_eq!(Script::parse("toggle").ok(), Some(Script::Toggle));
        assert_eq!(Script::parse("keyframes").ok(), Some(Script::Keyframes));
        assert_eq!(Script::parse("group").ok(), Some(Script::Group));
        assert!(Script::parse("bounceIn").is_err());
    }
}
