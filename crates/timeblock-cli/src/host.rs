//! Wiring between the core store and this terminal host.

use std::io::Write;
use std::rc::Rc;

use timeblock_core::{
    CompletionCue, CompletionNotifier, Config, Database, NotifyError, TimerStore,
};

/// Completion cue: rings the terminal bell.
pub struct BellNotifier {
    bell_count: u32,
}

impl BellNotifier {
    pub fn new(bell_count: u32) -> Self {
        Self { bell_count }
    }
}

impl CompletionNotifier for BellNotifier {
    fn notify_completion(&self, _cue: &CompletionCue) -> Result<(), NotifyError> {
        let mut err = std::io::stderr();
        for _ in 0..self.bell_count {
            err.write_all(b"\x07")
                .map_err(|e| NotifyError::Unavailable(e.to_string()))?;
        }
        err.flush()
            .map_err(|e| NotifyError::Unavailable(e.to_string()))
    }
}

/// Build the store over the on-disk database and configured presets.
pub fn open_store(
    config: &Config,
    db: Rc<Database>,
) -> Result<TimerStore, Box<dyn std::error::Error>> {
    let presets = config.catalog()?;
    Ok(TimerStore::open(
        Box::new(db.clone()),
        Box::new(BellNotifier::new(config.notifications.bell_count)),
        Box::new(db),
        presets,
        config.timer.countdown_minutes,
    ))
}
