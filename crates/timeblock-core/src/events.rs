use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Phase, TimerMode};

/// Every accepted state change produces an Event.
/// Rejected commands produce none; the host polls snapshots for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        block_id: String,
        mode: TimerMode,
        phase: Phase,
        total_seconds: u64,
        remaining_seconds: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_seconds: u64,
        elapsed_seconds: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_seconds: u64,
        elapsed_seconds: u64,
        at: DateTime<Utc>,
    },
    /// The owning block was released. `mode` and `elapsed_seconds` describe
    /// the session as it was before the release.
    TimerStopped {
        block_id: Option<String>,
        mode: TimerMode,
        elapsed_seconds: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        total_seconds: u64,
        at: DateTime<Utc>,
    },
    /// Countdown or Pomodoro phase drained to zero.
    PhaseCompleted {
        block_id: Option<String>,
        mode: TimerMode,
        phase: Phase,
        total_seconds: u64,
        completed_sessions: u32,
        linked_activity_id: Option<String>,
        at: DateTime<Utc>,
    },
    /// Pomodoro phase cut short. `elapsed_seconds` is the time spent in
    /// `from`; `total_seconds` is the length of `to`.
    PhaseSkipped {
        block_id: Option<String>,
        from: Phase,
        to: Phase,
        elapsed_seconds: u64,
        total_seconds: u64,
        completed_sessions: u32,
        linked_activity_id: Option<String>,
        at: DateTime<Utc>,
    },
    ModeChanged {
        mode: TimerMode,
        at: DateTime<Utc>,
    },
    PresetChanged {
        index: usize,
        name: String,
        at: DateTime<Utc>,
    },
    AudioToggled {
        enabled: bool,
        at: DateTime<Utc>,
    },
    SessionsReset {
        at: DateTime<Utc>,
    },
    ActivityLinked {
        activity_id: Option<String>,
        at: DateTime<Utc>,
    },
    /// Raised by the store after a linked block completes. The host decides
    /// whether to mark the activity done.
    LinkedActivityDue {
        activity_id: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Whether the event reflects a change to durable preferences.
    pub fn changes_preferences(&self) -> bool {
        matches!(
            self,
            Event::ModeChanged { .. } | Event::PresetChanged { .. } | Event::AudioToggled { .. }
        )
    }

    /// Whether the event is a transition into `Complete`.
    pub fn is_completion(&self) -> bool {
        matches!(self, Event::PhaseCompleted { .. })
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TimerStarted { at, .. }
            | Event::TimerPaused { at, .. }
            | Event::TimerResumed { at, .. }
            | Event::TimerStopped { at, .. }
            | Event::TimerReset { at, .. }
            | Event::PhaseCompleted { at, .. }
            | Event::PhaseSkipped { at, .. }
            | Event::ModeChanged { at, .. }
            | Event::PresetChanged { at, .. }
            | Event::AudioToggled { at, .. }
            | Event::SessionsReset { at }
            | Event::ActivityLinked { at, .. }
            | Event::LinkedActivityDue { at, .. } => *at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let event = Event::AudioToggled {
            enabled: false,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "AudioToggled");
        assert_eq!(json["enabled"], false);
    }

    #[test]
    fn preference_events_are_flagged() {
        let now = Utc::now();
        assert!(Event::ModeChanged { mode: TimerMode::Stopwatch, at: now }.changes_preferences());
        assert!(!Event::SessionsReset { at: now }.changes_preferences());
        assert!(!Event::TimerReset { total_seconds: 0, at: now }.is_completion());
    }
}
