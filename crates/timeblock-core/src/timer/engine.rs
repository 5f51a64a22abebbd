//! Timer engine implementation.
//!
//! The engine is a pure reducer over a single [`TimerSession`]. It does not
//! own a clock: the host calls `tick()` once per second while the session is
//! running, and every other command is a synchronous transition.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!           |
//!           v  (remaining reaches 0, countdown modes only)
//!        Complete -> Running (start: next Pomodoro phase / countdown refill)
//!
//! any -> Idle (stop)
//! ```
//!
//! Commands whose preconditions do not hold return `None` and leave the
//! state untouched.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::with_defaults();
//! engine.start("block-a", None);
//! // Once per second while running:
//! if let Some(event) = engine.tick() { /* phase completed */ }
//! ```

use chrono::Utc;
use tracing::debug;

use super::phase::{counts_as_session, next_phase, Phase};
use super::preset::{PomodoroPreset, PresetCatalog};
use super::session::{TimerMode, TimerSession, TimerSnapshot, TimerStatus};
use crate::events::Event;
use crate::preferences::Preferences;

pub const DEFAULT_COUNTDOWN_MINUTES: u32 = 25;

/// Core timer engine.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    session: TimerSession,
    prefs: Preferences,
    presets: PresetCatalog,
    countdown_minutes: u32,
}

impl TimerEngine {
    /// Create an idle engine from loaded preferences.
    ///
    /// A preset index that no longer exists in `presets` falls back to 0.
    pub fn new(mut prefs: Preferences, presets: PresetCatalog, countdown_minutes: u32) -> Self {
        if !presets.contains(prefs.pomodoro_preset_index) {
            debug!(
                index = prefs.pomodoro_preset_index,
                "stored preset index out of range, using first preset"
            );
            prefs.pomodoro_preset_index = 0;
        }
        Self {
            session: TimerSession::idle(prefs.mode, 0),
            prefs,
            presets,
            countdown_minutes: countdown_minutes.max(1),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(
            Preferences::default(),
            PresetCatalog::builtin(),
            DEFAULT_COUNTDOWN_MINUTES,
        )
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session(&self) -> &TimerSession {
        &self.session
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn presets(&self) -> &PresetCatalog {
        &self.presets
    }

    pub fn active_preset(&self) -> &PomodoroPreset {
        self.presets.get_or_first(self.prefs.pomodoro_preset_index)
    }

    pub fn status(&self) -> TimerStatus {
        self.session.status
    }

    pub fn mode(&self) -> TimerMode {
        self.session.mode
    }

    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    pub fn countdown_minutes(&self) -> u32 {
        self.countdown_minutes
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        let s = &self.session;
        TimerSnapshot {
            active_block_id: s.active_block_id.clone(),
            mode: s.mode,
            phase: s.phase,
            status: s.status,
            remaining_seconds: s.remaining_seconds,
            elapsed_seconds: s.elapsed_seconds,
            total_seconds: s.total_seconds,
            completed_sessions: s.completed_sessions,
            pomodoro_preset_index: self.prefs.pomodoro_preset_index,
            audio_enabled: self.prefs.audio_enabled,
            linked_activity_id: s.linked_activity_id.clone(),
            progress: s.progress(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start (or continue) the session for `block_id`.
    ///
    /// Rejected while a different block owns the session. From `Paused` this
    /// resumes; from `Complete` in Pomodoro it moves to the next phase.
    pub fn start(&mut self, block_id: &str, override_minutes: Option<u32>) -> Option<Event> {
        if let Some(active) = &self.session.active_block_id {
            if active != block_id {
                debug!(active = %active, requested = %block_id, "start rejected: another block owns the timer");
                return None;
            }
        }

        match self.session.status {
            TimerStatus::Running => {
                debug!("start ignored: already running");
                return None;
            }
            TimerStatus::Paused => return self.resume(),
            TimerStatus::Complete if self.session.mode == TimerMode::Pomodoro => {
                let next = next_phase(
                    self.session.phase,
                    self.session.completed_sessions,
                    self.active_preset().sessions_before_long_break,
                );
                self.load_phase(next);
            }
            TimerStatus::Complete | TimerStatus::Idle => self.load_fresh(override_minutes),
        }

        self.session.active_block_id = Some(block_id.to_string());
        self.session.status = TimerStatus::Running;
        Some(Event::TimerStarted {
            block_id: block_id.to_string(),
            mode: self.session.mode,
            phase: self.session.phase,
            total_seconds: self.session.total_seconds,
            remaining_seconds: self.session.remaining_seconds,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.session.status != TimerStatus::Running {
            debug!(status = ?self.session.status, "pause ignored: not running");
            return None;
        }
        self.session.status = TimerStatus::Paused;
        Some(Event::TimerPaused {
            remaining_seconds: self.session.remaining_seconds,
            elapsed_seconds: self.session.elapsed_seconds,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.session.status != TimerStatus::Paused {
            debug!(status = ?self.session.status, "resume ignored: not paused");
            return None;
        }
        self.session.status = TimerStatus::Running;
        Some(Event::TimerResumed {
            remaining_seconds: self.session.remaining_seconds,
            elapsed_seconds: self.session.elapsed_seconds,
            at: Utc::now(),
        })
    }

    /// Drop the session back to idle. Preferences and the session counter
    /// are kept.
    pub fn stop(&mut self) -> Option<Event> {
        let block_id = self.session.active_block_id.take();
        let (mode, elapsed_seconds) = (self.session.mode, self.session.elapsed_seconds);
        self.session = TimerSession::idle(self.prefs.mode, self.session.completed_sessions);
        Some(Event::TimerStopped {
            block_id,
            mode,
            elapsed_seconds,
            at: Utc::now(),
        })
    }

    /// Advance one second. Returns `Some(Event::PhaseCompleted)` when the
    /// countdown reaches zero.
    pub fn tick(&mut self) -> Option<Event> {
        if self.session.status != TimerStatus::Running {
            return None;
        }

        if !self.session.mode.counts_down() {
            self.session.elapsed_seconds = self.session.elapsed_seconds.saturating_add(1);
            return None;
        }

        if self.session.remaining_seconds > 0 {
            self.session.remaining_seconds -= 1;
            self.session.elapsed_seconds += 1;
        }
        if self.session.remaining_seconds == 0 {
            return Some(self.complete_phase());
        }
        None
    }

    /// Refill the duration bookkeeping without touching status or owner.
    /// Rejected when no block owns the session.
    pub fn reset(&mut self, override_minutes: Option<u32>) -> Option<Event> {
        if self.session.active_block_id.is_none() {
            debug!("reset ignored: no active block");
            return None;
        }
        let total = match self.session.mode {
            TimerMode::Pomodoro => self.active_preset().seconds_for(self.session.phase),
            TimerMode::Countdown => self.countdown_seconds(override_minutes),
            TimerMode::Stopwatch => 0,
        };
        self.session.total_seconds = total;
        self.session.remaining_seconds = total;
        self.session.elapsed_seconds = 0;
        Some(Event::TimerReset {
            total_seconds: total,
            at: Utc::now(),
        })
    }

    /// Force-complete the current Pomodoro phase and start the next one.
    pub fn skip_to_next_phase(&mut self) -> Option<Event> {
        if self.session.mode != TimerMode::Pomodoro
            || !matches!(self.session.status, TimerStatus::Running | TimerStatus::Paused)
        {
            debug!(mode = %self.session.mode, status = ?self.session.status, "skip ignored");
            return None;
        }

        let from = self.session.phase;
        let elapsed_seconds = self.session.elapsed_seconds;
        if counts_as_session(from) {
            self.session.completed_sessions += 1;
        }
        let to = next_phase(
            from,
            self.session.completed_sessions,
            self.active_preset().sessions_before_long_break,
        );
        self.load_phase(to);
        self.session.status = TimerStatus::Running;
        Some(Event::PhaseSkipped {
            block_id: self.session.active_block_id.clone(),
            from,
            to,
            elapsed_seconds,
            total_seconds: self.session.total_seconds,
            completed_sessions: self.session.completed_sessions,
            linked_activity_id: self.session.linked_activity_id.clone(),
            at: Utc::now(),
        })
    }

    /// Switch mode. A paused or completed session is abandoned (idle, owner
    /// cleared); the store reports that release as `TimerStopped`.
    pub fn set_mode(&mut self, mode: TimerMode) -> Option<Event> {
        if self.session.is_running() {
            debug!(%mode, "mode change rejected while running");
            return None;
        }
        if mode == self.prefs.mode {
            return None;
        }
        self.prefs.mode = mode;
        self.session = TimerSession::idle(mode, self.session.completed_sessions);
        Some(Event::ModeChanged {
            mode,
            at: Utc::now(),
        })
    }

    /// Select a Pomodoro preset. Takes effect from the next phase loaded.
    pub fn set_preset(&mut self, index: usize) -> Option<Event> {
        if self.session.is_running() {
            debug!(index, "preset change rejected while running");
            return None;
        }
        let name = match self.presets.get(index) {
            Some(preset) => preset.name.clone(),
            None => {
                debug!(index, len = self.presets.len(), "preset change rejected: no such preset");
                return None;
            }
        };
        if index == self.prefs.pomodoro_preset_index {
            return None;
        }
        self.prefs.pomodoro_preset_index = index;
        Some(Event::PresetChanged {
            index,
            name,
            at: Utc::now(),
        })
    }

    pub fn set_audio_enabled(&mut self, enabled: bool) -> Option<Event> {
        if self.session.is_running() {
            debug!(enabled, "audio toggle rejected while running");
            return None;
        }
        if enabled == self.prefs.audio_enabled {
            return None;
        }
        self.prefs.audio_enabled = enabled;
        Some(Event::AudioToggled {
            enabled,
            at: Utc::now(),
        })
    }

    pub fn reset_sessions(&mut self) -> Option<Event> {
        self.session.completed_sessions = 0;
        Some(Event::SessionsReset { at: Utc::now() })
    }

    /// Attach (or detach with `None`) the recurring activity completed by this
    /// block. Cleared again by `stop`.
    pub fn link_activity(&mut self, activity_id: Option<String>) -> Option<Event> {
        self.session.linked_activity_id = activity_id.clone();
        Some(Event::ActivityLinked {
            activity_id,
            at: Utc::now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete_phase(&mut self) -> Event {
        self.session.status = TimerStatus::Complete;
        if self.session.mode == TimerMode::Pomodoro && counts_as_session(self.session.phase) {
            self.session.completed_sessions += 1;
        }
        Event::PhaseCompleted {
            block_id: self.session.active_block_id.clone(),
            mode: self.session.mode,
            phase: self.session.phase,
            total_seconds: self.session.total_seconds,
            completed_sessions: self.session.completed_sessions,
            linked_activity_id: self.session.linked_activity_id.clone(),
            at: Utc::now(),
        }
    }

    fn load_fresh(&mut self, override_minutes: Option<u32>) {
        match self.session.mode {
            TimerMode::Pomodoro => self.load_phase(Phase::Work),
            TimerMode::Countdown => {
                let total = self.countdown_seconds(override_minutes);
                self.load_duration(total);
            }
            TimerMode::Stopwatch => self.load_duration(0),
        }
    }

    /// Countdown length: the override, else the length the owning block
    /// last ran with, else the configured default.
    fn countdown_seconds(&self, override_minutes: Option<u32>) -> u64 {
        match override_minutes {
            Some(minutes) => minutes_to_seconds(minutes),
            None if self.session.active_block_id.is_some() && self.session.total_seconds > 0 => {
                self.session.total_seconds
            }
            None => minutes_to_seconds(self.countdown_minutes),
        }
    }

    fn load_phase(&mut self, phase: Phase) {
        self.session.phase = phase;
        let total = self.active_preset().seconds_for(phase);
        self.load_duration(total);
    }

    fn load_duration(&mut self, total_seconds: u64) {
        self.session.total_seconds = total_seconds;
        self.session.remaining_seconds = total_seconds;
        self.session.elapsed_seconds = 0;
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Minutes to seconds, with a one-minute floor.
fn minutes_to_seconds(minutes: u32) -> u64 {
    u64::from(minutes.max(1)).saturating_mul(60)
}
