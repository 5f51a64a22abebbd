use serde::{Deserialize, Serialize};

use super::phase::Phase;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerMode {
    #[default]
    Pomodoro,
    Stopwatch,
    Countdown,
}

impl TimerMode {
    pub const ALL: [TimerMode; 3] = [TimerMode::Pomodoro, TimerMode::Stopwatch, TimerMode::Countdown];

    /// Whether the mode drains `remaining_seconds` toward a natural completion.
    pub fn counts_down(self) -> bool {
        !matches!(self, TimerMode::Stopwatch)
    }
}

impl std::fmt::Display for TimerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TimerMode::Pomodoro => "pomodoro",
            TimerMode::Stopwatch => "stopwatch",
            TimerMode::Countdown => "countdown",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for TimerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pomodoro" => Ok(TimerMode::Pomodoro),
            "stopwatch" => Ok(TimerMode::Stopwatch),
            "countdown" => Ok(TimerMode::Countdown),
            other => Err(format!("unknown timer mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Complete,
}

/// The one mutable timer session.
///
/// Only [`TimerEngine`](super::TimerEngine) mutates it; hosts read it through
/// [`TimerEngine::session`](super::TimerEngine::session) or a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSession {
    /// Focus block owning the session; `None` means idle.
    pub active_block_id: Option<String>,
    pub mode: TimerMode,
    pub status: TimerStatus,
    /// Only meaningful in Pomodoro mode.
    pub phase: Phase,
    pub total_seconds: u64,
    pub remaining_seconds: u64,
    pub elapsed_seconds: u64,
    /// Work phases completed since the last `reset_sessions`.
    pub completed_sessions: u32,
    /// External recurring activity to mark done when the block completes.
    pub linked_activity_id: Option<String>,
}

impl TimerSession {
    /// Idle session in `mode`, carrying over the session counter.
    pub fn idle(mode: TimerMode, completed_sessions: u32) -> Self {
        Self {
            active_block_id: None,
            mode,
            status: TimerStatus::Idle,
            phase: Phase::Work,
            total_seconds: 0,
            remaining_seconds: 0,
            elapsed_seconds: 0,
            completed_sessions,
            linked_activity_id: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    /// 0.0 .. 1.0 progress within the current phase. Always 0 for stopwatch.
    pub fn progress(&self) -> f64 {
        if !self.mode.counts_down() || self.total_seconds == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_seconds as f64 / self.total_seconds as f64)
    }
}

impl Default for TimerSession {
    fn default() -> Self {
        Self::idle(TimerMode::default(), 0)
    }
}

/// Read model polled by the host for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub active_block_id: Option<String>,
    pub mode: TimerMode,
    pub phase: Phase,
    pub status: TimerStatus,
    pub remaining_seconds: u64,
    pub elapsed_seconds: u64,
    pub total_seconds: u64,
    pub completed_sessions: u32,
    pub pomodoro_preset_index: usize,
    pub audio_enabled: bool,
    pub linked_activity_id: Option<String>,
    pub progress: f64,
}

/// `MM:SS`, or `H:MM:SS` past the hour.
pub fn format_clock(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_round_trips_through_str() {
        for mode in TimerMode::ALL {
            assert_eq!(mode.to_string().parse::<TimerMode>().unwrap(), mode);
        }
        assert!("hourglass".parse::<TimerMode>().is_err());
        assert_eq!("Countdown".parse::<TimerMode>().unwrap(), TimerMode::Countdown);
    }

    #[test]
    fn idle_session_keeps_counter() {
        let s = TimerSession::idle(TimerMode::Countdown, 7);
        assert_eq!(s.completed_sessions, 7);
        assert_eq!(s.status, TimerStatus::Idle);
        assert!(s.active_block_id.is_none());
    }

    #[test]
    fn progress_is_zero_for_stopwatch() {
        let mut s = TimerSession::idle(TimerMode::Stopwatch, 0);
        s.elapsed_seconds = 120;
        assert_eq!(s.progress(), 0.0);
    }

    #[test]
    fn progress_tracks_remaining() {
        let mut s = TimerSession::idle(TimerMode::Countdown, 0);
        s.total_seconds = 100;
        s.remaining_seconds = 25;
        assert!((s.progress() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(1500), "25:00");
        assert_eq!(format_clock(3725), "1:02:05");
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let snap = TimerSnapshot {
            active_block_id: Some("a".into()),
            mode: TimerMode::Pomodoro,
            phase: Phase::LongBreak,
            status: TimerStatus::Running,
            remaining_seconds: 1,
            elapsed_seconds: 2,
            total_seconds: 3,
            completed_sessions: 4,
            pomodoro_preset_index: 0,
            audio_enabled: true,
            linked_activity_id: None,
            progress: 0.5,
        };
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["activeBlockId"], "a");
        assert_eq!(json["phase"], "longBreak");
        assert_eq!(json["remainingSeconds"], 1);
        assert_eq!(json["pomodoroPresetIndex"], 0);
    }
}
