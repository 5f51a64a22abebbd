mod engine;
mod phase;
mod preset;
mod session;

pub use engine::{TimerEngine, DEFAULT_COUNTDOWN_MINUTES};
pub use phase::{counts_as_session, next_phase, Phase};
pub use preset::{PomodoroPreset, PresetCatalog};
pub use session::{format_clock, TimerMode, TimerSession, TimerSnapshot, TimerStatus};
