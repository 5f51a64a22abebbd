use serde::{Deserialize, Serialize};

use super::phase::Phase;
use crate::error::ValidationError;

/// A named bundle of Pomodoro durations and the long-break cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroPreset {
    pub name: String,
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub long_break_minutes: u32,
    pub sessions_before_long_break: u32,
}

impl PomodoroPreset {
    pub fn new(
        name: impl Into<String>,
        work_minutes: u32,
        break_minutes: u32,
        long_break_minutes: u32,
        sessions_before_long_break: u32,
    ) -> Self {
        Self {
            name: name.into(),
            work_minutes,
            break_minutes,
            long_break_minutes,
            sessions_before_long_break,
        }
    }

    pub fn classic() -> Self {
        Self::new("Classic", 25, 5, 15, 4)
    }

    pub fn short() -> Self {
        Self::new("Short", 15, 3, 10, 4)
    }

    pub fn deep_work() -> Self {
        Self::new("Deep Work", 50, 10, 30, 3)
    }

    /// Minutes configured for `phase`.
    pub fn minutes_for(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.work_minutes,
            Phase::Break => self.break_minutes,
            Phase::LongBreak => self.long_break_minutes,
        }
    }

    /// Seconds configured for `phase`.
    ///
    /// Uses saturating arithmetic to prevent overflow with large values.
    pub fn seconds_for(&self, phase: Phase) -> u64 {
        u64::from(self.minutes_for(phase)).saturating_mul(60)
    }

    /// Check the preset is usable: every phase at least one minute and a
    /// cadence of at least one session.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(invalid("name", "must not be empty"));
        }
        for (field, value) in [
            ("work_minutes", self.work_minutes),
            ("break_minutes", self.break_minutes),
            ("long_break_minutes", self.long_break_minutes),
        ] {
            if value == 0 {
                return Err(invalid(field, "must be at least 1 minute"));
            }
        }
        if self.sessions_before_long_break == 0 {
            return Err(invalid("sessions_before_long_break", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// Ordered preset list; built-ins first, user presets appended.
///
/// Never empty: every constructor starts from the built-ins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetCatalog {
    presets: Vec<PomodoroPreset>,
}

impl PresetCatalog {
    pub fn builtin() -> Self {
        Self {
            presets: vec![
                PomodoroPreset::classic(),
                PomodoroPreset::short(),
                PomodoroPreset::deep_work(),
            ],
        }
    }

    /// Built-in catalog extended with `custom` presets.
    ///
    /// # Errors
    /// Returns the first validation failure among `custom`.
    pub fn with_custom(custom: &[PomodoroPreset]) -> Result<Self, ValidationError> {
        let mut catalog = Self::builtin();
        for preset in custom {
            preset.validate()?;
            catalog.presets.push(preset.clone());
        }
        Ok(catalog)
    }

    pub fn get(&self, index: usize) -> Option<&PomodoroPreset> {
        self.presets.get(index)
    }

    /// Preset at `index`, or the first one when out of range.
    pub fn get_or_first(&self, index: usize) -> &PomodoroPreset {
        self.presets.get(index).unwrap_or(&self.presets[0])
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.presets.len()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PomodoroPreset> {
        self.presets.iter()
    }
}

impl Default for PresetCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
