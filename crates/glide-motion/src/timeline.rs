//! In-process animation host.
//!
//! `Timeline` plays keyframe animations over host-driven time the same way
//! `FrameClock` runs timers: the render loop calls [`Timeline::tick`] with
//! the frame delta, then reads [`Timeline::computed_style`] per target.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;

use crate::driver::{AnimationHost, FinishCallback};
use crate::keyframes::{AnimationId, AnimationOptions, Playback};
use crate::node_ref::TargetId;
use crate::presets::{KeyframeSequence, TimingPreset};
use crate::style::StyleSnapshot;

struct Entry {
    playback: Playback,
    on_finish: Option<FinishCallback>,
}

#[derive(Default)]
struct TimelineState {
    attached: HashSet<TargetId>,
    entries: Vec<Entry>,
}

/// Reference [`AnimationHost`] driven by frame ticks.
#[derive(Default)]
pub struct Timeline {
    state: RefCell<TimelineState>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `target` as renderable.
    pub fn attach(&self, target: TargetId) {
        self.state.borrow_mut().attached.insert(target);
    }

    /// Remove `target`; its animations stop applying without finishing.
    pub fn detach(&self, target: TargetId) {
        let mut state = self.state.borrow_mut();
        state.attached.remove(&target);
        state.entries.retain(|e| e.playback.target != target);
    }

    /// Advance every unpaused animation. Returns how many finished.
    pub fn tick(&self, delta_ms: f64) -> usize {
        let finished: Vec<FinishCallback> = {
            let mut state = self.state.borrow_mut();
            let mut finished = Vec::new();
            for entry in &mut state.entries {
                entry.playback.update(delta_ms);
                if entry.playback.is_finished() {
                    if let Some(on_finish) = entry.on_finish.take() {
                        finished.push(on_finish);
                    }
                }
            }
            // Finished animations without forwards fill no longer apply.
            state.entries.retain(|e| {
                e.playback.is_active() || e.playback.options.fill_mode.applies_forwards()
            });
            finished
        };

        let count = finished.len();
        for on_finish in finished {
            on_finish();
        }
        count
    }

    /// Style currently applied to `target`; later animations win per
    /// property.
    pub fn computed_style(&self, target: TargetId) -> StyleSnapshot {
        let state = self.state.borrow();
        let mut style = StyleSnapshot::new();
        for entry in state.entries.iter().filter(|e| e.playback.target == target) {
            if let Some(applied) = entry.playback.current_style() {
                style.merge(&applied);
            }
        }
        style
    }

    /// Animations that are pending, running or paused.
    pub fn active_count(&self) -> usize {
        self.state
            .borrow()
            .entries
            .iter()
            .filter(|e| e.playback.is_active())
            .count()
    }

    /// Animations applying style to `target`, including finished ones held
    /// by forwards fill.
    pub fn applied_count(&self, target: TargetId) -> usize {
        self.state
            .borrow()
            .entries
            .iter()
            .filter(|e| e.playback.target == target)
            .count()
    }

    pub fn is_playing(&self, id: AnimationId) -> bool {
        self.state
            .borrow()
            .entries
            .iter()
            .any(|e| e.playback.id == id && e.playback.is_active() && !e.playback.is_paused())
    }

    fn with_playback(&self, id: AnimationId, f: impl FnOnce(&mut Playback)) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.entries.iter_mut().find(|e| e.playback.id == id) {
            f(&mut entry.playback);
        }
    }
}

impl AnimationHost for Timeline {
    fn is_attached(&self, target: TargetId) -> bool {
        self.state.borrow().attached.contains(&target)
    }

    fn play(
        &self,
        id: AnimationId,
        target: TargetId,
        sequence: KeyframeSequence,
        timing: TimingPreset,
        options: AnimationOptions,
        on_finish: FinishCallback,
    ) {
        let mut playback = Playback::new(target, sequence, timing, options);
        playback.id = id;
        self.state.borrow_mut().entries.push(Entry { playback, on_finish: Some(on_finish) });
    }

    fn cancel(&self, id: AnimationId) {
        self.state.borrow_mut().entries.retain(|e| e.playback.id != id);
    }

    fn pause(&self, id: AnimationId) {
        self.with_playback(id, Playback::pause);
    }

    fn resume(&self, id: AnimationId) {
        self.with_playback(id, Playback::resume);
    }
}

impl fmt::Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Timeline")
            .field("attached", &state.attached.len())
            .field("entries", &state.entries.len())
            .finish()
    }
}
