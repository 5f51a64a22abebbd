//! # Timeblock Core Library
//!
//! This library provides the focus-session timer behind the dashboard's
//! "time block" widget: one global countdown / stopwatch / Pomodoro clock.
//! The `timeblock-cli` binary is a thin host over the same library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a pure reducer over the single timer session. The host
//!   calls `tick()` once per second while running; nothing here owns a clock.
//! - **Phase Policy**: which Pomodoro phase follows a completed one, and when
//!   the session counter moves.
//! - **Store**: single writer that applies effects after each transition
//!   (preference persistence, completion cue, linked-activity completion).
//! - **Storage**: SQLite for preferences, phase history and activity
//!   completions; TOML for configuration.
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TimerStore`]: Command dispatch plus side effects
//! - [`Database`]: Preference, history and activity persistence
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod notify;
pub mod preferences;
pub mod storage;
pub mod store;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, NotifyError, ValidationError};
pub use events::Event;
pub use notify::{CompletionCue, CompletionNotifier, LinkedActivityHook, SilentNotifier};
pub use preferences::{MemoryPreferenceStore, PreferenceStore, Preferences};
pub use storage::{Config, Database, Stats};
pub use store::{Command, TimerStore};
pub use timer::{
    next_phase, Phase, PomodoroPreset, PresetCatalog, TimerEngine, TimerMode, TimerSession,
    TimerSnapshot, TimerStatus,
};
