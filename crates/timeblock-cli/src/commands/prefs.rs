use std::rc::Rc;

use clap::{Subcommand, ValueEnum};
use timeblock_core::{Command, Config, Database, TimerMode, TimerStore};

use crate::host::open_store;

#[derive(Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Show the stored preferences
    Show,
    /// Set the default timer mode
    Mode {
        /// pomodoro, stopwatch or countdown
        mode: TimerMode,
    },
    /// Select the Pomodoro preset by catalog index
    Preset {
        /// Index as listed by `timer presets`
        index: usize,
    },
    /// Turn the completion cue on or off
    Audio {
        #[arg(value_enum)]
        state: Toggle,
    },
}

pub fn run(action: PrefsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut store = open_store(&config, Rc::new(Database::open()?))?;

    let command = match action {
        PrefsAction::Show => {
            print_prefs(&store)?;
            return Ok(());
        }
        PrefsAction::Mode { mode } => Command::SetMode { mode },
        PrefsAction::Preset { index } => {
            if !store.engine().presets().contains(index) {
                return Err(format!(
                    "no preset at index {index} ({} available)",
                    store.engine().presets().len()
                )
                .into());
            }
            Command::SetPreset { index }
        }
        PrefsAction::Audio { state } => Command::SetAudioEnabled {
            enabled: matches!(state, Toggle::On),
        },
    };

    if store.dispatch(command).is_empty() {
        eprintln!("unchanged");
    }
    print_prefs(&store)
}

fn print_prefs(store: &TimerStore) -> Result<(), Box<dyn std::error::Error>> {
    let prefs = store.engine().preferences();
    let preset = store.engine().active_preset();
    let view = serde_json::json!({
        "mode": prefs.mode,
        "pomodoroPresetIndex": prefs.pomodoro_preset_index,
        "presetName": preset.name,
        "audioEnabled": prefs.audio_enabled,
    });
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
