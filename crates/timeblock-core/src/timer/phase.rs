//! Pomodoro phase policy.
//!
//! Pure functions deciding which phase follows a completed one. The session
//! counter is bumped by the engine *before* `next_phase` runs, so the
//! long-break check sees the post-increment count.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    #[default]
    Work,
    Break,
    LongBreak,
}

impl Phase {
    pub fn is_work(self) -> bool {
        self == Phase::Work
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Work => "Work",
            Phase::Break => "Break",
            Phase::LongBreak => "Long Break",
        }
    }
}

/// Phase that follows `current`.
///
/// `sessions_before_long_break` of 0 is treated as 1.
pub fn next_phase(current: Phase, completed_sessions: u32, sessions_before_long_break: u32) -> Phase {
    match current {
        Phase::Work => {
            let cadence = sessions_before_long_break.max(1);
            if completed_sessions > 0 && completed_sessions % cadence == 0 {
                Phase::LongBreak
            } else {
                Phase::Break
            }
        }
        Phase::Break | Phase::LongBreak => Phase::Work,
    }
}

/// Whether completing `phase` counts toward `completed_sessions`.
pub fn counts_as_session(phase: Phase) -> bool {
    phase.is_work()
}
