//! Shared helpers for timeblock-core integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use timeblock_core::{
    CompletionCue, CompletionNotifier, Event, NotifyError, Preferences, PresetCatalog,
    TimerEngine, TimerMode,
};

/// Engine with built-in presets, a 25-minute countdown default, in `mode`.
pub fn engine_in(mode: TimerMode) -> TimerEngine {
    let prefs = Preferences {
        mode,
        ..Preferences::default()
    };
    TimerEngine::new(prefs, PresetCatalog::builtin(), 25)
}

/// Tick `n` times, collecting the events raised.
pub fn tick_n(engine: &mut TimerEngine, n: u64) -> Vec<Event> {
    (0..n).filter_map(|_| engine.tick()).collect()
}

/// Notifier recording every cue it is asked to play.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub cues: Rc<RefCell<Vec<CompletionCue>>>,
}

impl RecordingNotifier {
    pub fn count(&self) -> usize {
        self.cues.borrow().len()
    }
}

impl CompletionNotifier for RecordingNotifier {
    fn notify_completion(&self, cue: &CompletionCue) -> Result<(), NotifyError> {
        self.cues.borrow_mut().push(cue.clone());
        Ok(())
    }
}
