//! Durable timer preferences and the port they are persisted through.
//!
//! Only the preference record survives a restart. The in-flight session
//! (remaining seconds, phase) is deliberately not persisted.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::timer::TimerMode;

/// Bumped only for incompatible changes. Additive fields rely on
/// `#[serde(default)]` and keep the version.
pub const PREFERENCES_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default = "default_true")]
    pub audio_enabled: bool,
    #[serde(default)]
    pub pomodoro_preset_index: usize,
    #[serde(default)]
    pub mode: TimerMode,
}

fn default_schema_version() -> u32 {
    PREFERENCES_SCHEMA_VERSION
}

fn default_true() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            schema_version: PREFERENCES_SCHEMA_VERSION,
            audio_enabled: true,
            pomodoro_preset_index: 0,
            mode: TimerMode::default(),
        }
    }
}

impl Preferences {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a stored record. Missing fields take their defaults and unknown
    /// fields are ignored, so records from newer or older builds still load.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Where preferences live between runs.
pub trait PreferenceStore {
    /// Stored preferences, or `None` on first run.
    fn load(&self) -> Result<Option<Preferences>>;

    fn save(&self, prefs: &Preferences) -> Result<()>;
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for Rc<T> {
    fn load(&self) -> Result<Option<Preferences>> {
        (**self).load()
    }

    fn save(&self, prefs: &Preferences) -> Result<()> {
        (**self).save(prefs)
    }
}

/// In-process store for tests and hosts without durable storage.
///
/// Clones share the same slot, so a test can keep a handle after moving one
/// into a [`TimerStore`](crate::store::TimerStore).
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    slot: Rc<RefCell<Option<Preferences>>>,
    saves: Rc<RefCell<usize>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(prefs: Preferences) -> Self {
        let store = Self::default();
        *store.slot.borrow_mut() = Some(prefs);
        store
    }

    pub fn current(&self) -> Option<Preferences> {
        self.slot.borrow().clone()
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> Result<Option<Preferences>> {
        Ok(self.slot.borrow().clone())
    }

    fn save(&self, prefs: &Preferences) -> Result<()> {
        *self.slot.borrow_mut() = Some(prefs.clone());
        *self.saves.borrow_mut() += 1;
        Ok(())
    }
}
