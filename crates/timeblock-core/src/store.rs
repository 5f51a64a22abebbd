//! Single-writer wrapper around the timer engine.
//!
//! [`TimerStore`] owns the one [`TimerEngine`] of the process and applies the
//! side effects of its transitions: persisting preferences, playing the
//! completion cue and surfacing linked-activity completions. Effect failures
//! are logged and swallowed; the in-memory state stays authoritative.

use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::events::Event;
use crate::notify::{CompletionCue, CompletionNotifier, LinkedActivityHook};
use crate::preferences::{PreferenceStore, Preferences};
use crate::timer::{Phase, PresetCatalog, TimerEngine, TimerMode, TimerSession, TimerSnapshot};

/// The host's command surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    Start {
        block_id: String,
        #[serde(default)]
        override_minutes: Option<u32>,
    },
    Pause,
    Resume,
    Stop,
    Tick,
    Reset {
        #[serde(default)]
        override_minutes: Option<u32>,
    },
    SkipToNextPhase,
    SetMode {
        mode: TimerMode,
    },
    SetPreset {
        index: usize,
    },
    SetAudioEnabled {
        enabled: bool,
    },
    ResetSessions,
    LinkActivity {
        #[serde(default)]
        activity_id: Option<String>,
    },
}

pub struct TimerStore {
    engine: TimerEngine,
    prefs_store: Box<dyn PreferenceStore>,
    notifier: Box<dyn CompletionNotifier>,
    activity_hook: Box<dyn LinkedActivityHook>,
}

impl TimerStore {
    /// Build the store, loading preferences from `prefs_store`.
    ///
    /// An unreadable preference record is logged and replaced by defaults.
    pub fn open(
        prefs_store: Box<dyn PreferenceStore>,
        notifier: Box<dyn CompletionNotifier>,
        activity_hook: Box<dyn LinkedActivityHook>,
        presets: PresetCatalog,
        countdown_minutes: u32,
    ) -> Self {
        let prefs = match prefs_store.load() {
            Ok(Some(prefs)) => prefs,
            Ok(None) => Preferences::default(),
            Err(e) => {
                warn!(error = %e, "failed to load timer preferences, using defaults");
                Preferences::default()
            }
        };
        Self {
            engine: TimerEngine::new(prefs, presets, countdown_minutes),
            prefs_store,
            notifier,
            activity_hook,
        }
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.engine.snapshot()
    }

    /// Apply `command`, run its effects, and return the resulting events.
    ///
    /// An empty vec means the command was rejected or was a plain tick.
    pub fn dispatch(&mut self, command: Command) -> Vec<Event> {
        let before = self.engine.session().clone();
        let event = match command {
            Command::Start {
                block_id,
                override_minutes,
            } => self.engine.start(&block_id, override_minutes),
            Command::Pause => self.engine.pause(),
            Command::Resume => self.engine.resume(),
            Command::Stop => self.engine.stop(),
            Command::Tick => self.engine.tick(),
            Command::Reset { override_minutes } => self.engine.reset(override_minutes),
            Command::SkipToNextPhase => self.engine.skip_to_next_phase(),
            Command::SetMode { mode } => self.engine.set_mode(mode),
            Command::SetPreset { index } => self.engine.set_preset(index),
            Command::SetAudioEnabled { enabled } => self.engine.set_audio_enabled(enabled),
            Command::ResetSessions => self.engine.reset_sessions(),
            Command::LinkActivity { activity_id } => self.engine.link_activity(activity_id),
        };

        let Some(event) = event else {
            return Vec::new();
        };
        let mut events = Vec::with_capacity(2);
        events.extend(released_block(&before, self.engine.session(), &event));
        let due = self.apply_effects(&event);
        events.push(event);
        events.extend(due);
        events
    }

    pub fn tick(&mut self) -> Vec<Event> {
        self.dispatch(Command::Tick)
    }

    /// Mark `activity_id` complete for today (local date).
    ///
    /// # Errors
    /// Propagates the hook's failure; timer state is unaffected either way.
    pub fn complete_linked_activity(&self, activity_id: &str) -> Result<()> {
        self.complete_linked_activity_on(activity_id, Local::now().date_naive())
    }

    pub fn complete_linked_activity_on(&self, activity_id: &str, date: NaiveDate) -> Result<()> {
        self.activity_hook.mark_complete(activity_id, date)
    }

    // ── Effects ──────────────────────────────────────────────────────

    /// Run the side effects of `event`. Returns `LinkedActivityDue` when a
    /// linked work block just finished, by running out or by a skip.
    fn apply_effects(&self, event: &Event) -> Option<Event> {
        if event.changes_preferences() {
            self.persist_preferences();
        }

        match event {
            Event::PhaseCompleted {
                block_id,
                mode,
                phase,
                linked_activity_id,
                ..
            } => {
                if self.engine.preferences().audio_enabled {
                    let cue = CompletionCue {
                        block_id: block_id.clone(),
                        mode: *mode,
                        phase: *phase,
                    };
                    if let Err(e) = self.notifier.notify_completion(&cue) {
                        warn!(error = %e, "completion cue failed");
                    }
                }
                linked_activity_due(linked_activity_id.as_deref(), *mode, *phase)
            }
            // A skip never enters Complete, so there is no cue.
            Event::PhaseSkipped {
                from,
                linked_activity_id,
                ..
            } => linked_activity_due(linked_activity_id.as_deref(), TimerMode::Pomodoro, *from),
            _ => None,
        }
    }

    fn persist_preferences(&self) {
        let prefs = self.engine.preferences();
        match self.prefs_store.save(prefs) {
            Ok(()) => debug!(?prefs, "timer preferences saved"),
            Err(e) => warn!(error = %e, "failed to persist timer preferences"),
        }
    }
}

/// Breaks finishing do not complete the linked activity; the work block does.
fn completes_linked_activity(mode: TimerMode, phase: Phase) -> bool {
    match mode {
        TimerMode::Countdown => true,
        TimerMode::Pomodoro => phase.is_work(),
        TimerMode::Stopwatch => false,
    }
}

fn linked_activity_due(activity_id: Option<&str>, mode: TimerMode, phase: Phase) -> Option<Event> {
    let activity_id = activity_id?;
    completes_linked_activity(mode, phase).then(|| Event::LinkedActivityDue {
        activity_id: activity_id.to_string(),
        at: Utc::now(),
    })
}

/// A command other than `stop` that leaves the session without an owner
/// (a mode switch abandoning a paused or completed block) still reports the
/// release, so hosts following events see the block go.
fn released_block(before: &TimerSession, after: &TimerSession, event: &Event) -> Option<Event> {
    if matches!(event, Event::TimerStopped { .. }) || after.active_block_id.is_some() {
        return None;
    }
    let block_id = before.active_block_id.clone()?;
    Some(Event::TimerStopped {
        block_id: Some(block_id),
        mode: before.mode,
        elapsed_seconds: before.elapsed_seconds,
        at: event.at(),
    })
}
