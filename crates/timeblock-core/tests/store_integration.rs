//! Integration tests for the timer store over SQLite.
//!
//! Covers the persistence and notification boundary: preferences surviving a
//! restart, the in-flight session not surviving it, completion cues and
//! linked-activity completion.

mod common;

use std::rc::Rc;

use chrono::NaiveDate;
use common::RecordingNotifier;
use timeblock_core::notify::DetachedActivityHook;
use timeblock_core::{
    Command, Database, Event, Phase, PresetCatalog, TimerMode, TimerStatus, TimerStore,
};

fn open_store(db: Rc<Database>, notifier: RecordingNotifier) -> TimerStore {
    TimerStore::open(
        Box::new(db.clone()),
        Box::new(notifier),
        Box::new(db),
        PresetCatalog::builtin(),
        1,
    )
}

fn start(store: &mut TimerStore, block: &str) -> Vec<Event> {
    store.dispatch(Command::Start {
        block_id: block.into(),
        override_minutes: None,
    })
}

#[test]
fn test_preferences_survive_restart_but_session_does_not() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timeblock.db");

    {
        let db = Rc::new(Database::open_at(&path).unwrap());
        let mut store = open_store(db, RecordingNotifier::default());
        store.dispatch(Command::SetMode { mode: TimerMode::Countdown });
        store.dispatch(Command::SetPreset { index: 1 });
        store.dispatch(Command::SetAudioEnabled { enabled: false });
        start(&mut store, "blockA");
        for _ in 0..20 {
            store.tick();
        }
        assert_eq!(store.snapshot().elapsed_seconds, 20);
    }

    let db = Rc::new(Database::open_at(&path).unwrap());
    let store = open_store(db, RecordingNotifier::default());
    let snap = store.snapshot();
    assert_eq!(snap.mode, TimerMode::Countdown);
    assert_eq!(snap.pomodoro_preset_index, 1);
    assert!(!snap.audio_enabled);
    assert_eq!(snap.status, TimerStatus::Idle);
    assert_eq!(snap.elapsed_seconds, 0);
    assert!(snap.active_block_id.is_none());
}

#[test]
fn test_rejected_preference_change_is_not_persisted() {
    let db = Rc::new(Database::open_memory().unwrap());
    let mut store = open_store(db.clone(), RecordingNotifier::default());
    start(&mut store, "blockA");

    assert!(store
        .dispatch(Command::SetMode { mode: TimerMode::Stopwatch })
        .is_empty());
    assert!(db.kv_get("timer_preferences").unwrap().is_none());
}

#[test]
fn test_linked_activity_completion_flow() {
    let db = Rc::new(Database::open_memory().unwrap());
    let notifier = RecordingNotifier::default();
    let mut store = open_store(db.clone(), notifier.clone());

    store.dispatch(Command::SetMode { mode: TimerMode::Countdown });
    store.dispatch(Command::LinkActivity {
        activity_id: Some("morning-pages".into()),
    });
    start(&mut store, "blockA");

    let events: Vec<Event> = (0..60).flat_map(|_| store.tick()).collect();
    assert_eq!(notifier.count(), 1);
    let due = events
        .iter()
        .find_map(|e| match e {
            Event::LinkedActivityDue { activity_id, .. } => Some(activity_id.clone()),
            _ => None,
        })
        .expect("linked activity should be due");

    let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
    store.complete_linked_activity_on(&due, day).unwrap();
    store.complete_linked_activity_on(&due, day).unwrap();
    let done = db.activity_completions_on(day).unwrap();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].activity_id, "morning-pages");

    // Completing the activity leaves the timer where it was.
    assert_eq!(store.snapshot().status, TimerStatus::Complete);
}

#[test]
fn test_declining_linked_activity_changes_nothing() {
    let db = Rc::new(Database::open_memory().unwrap());
    let mut store = open_store(db.clone(), RecordingNotifier::default());
    store.dispatch(Command::SetMode { mode: TimerMode::Countdown });
    store.dispatch(Command::LinkActivity {
        activity_id: Some("walk".into()),
    });
    start(&mut store, "blockA");
    for _ in 0..60 {
        store.tick();
    }
    let before = store.snapshot();
    let today = chrono::Local::now().date_naive();
    assert!(db.activity_completions_on(today).unwrap().is_empty());
    assert_eq!(store.snapshot(), before);
}

#[test]
fn test_pomodoro_cue_for_each_phase_completion() {
    let db = Rc::new(Database::open_memory().unwrap());
    let notifier = RecordingNotifier::default();
    let mut store = open_store(db, notifier.clone());

    start(&mut store, "blockA");
    for _ in 0..1500 {
        store.tick();
    }
    start(&mut store, "blockA");
    for _ in 0..300 {
        store.tick();
    }

    let cues = notifier.cues.borrow();
    assert_eq!(cues.len(), 2);
    assert_eq!(cues[0].phase, Phase::Work);
    assert_eq!(cues[1].phase, Phase::Break);
    assert_eq!(store.snapshot().completed_sessions, 1);
}

#[test]
fn test_detached_hook_surfaces_error_without_touching_timer() {
    let mut store = TimerStore::open(
        Box::new(timeblock_core::MemoryPreferenceStore::new()),
        Box::new(RecordingNotifier::default()),
        Box::new(DetachedActivityHook),
        PresetCatalog::builtin(),
        1,
    );
    start(&mut store, "blockA");
    let before = store.snapshot();
    assert!(store.complete_linked_activity("anything").is_err());
    assert_eq!(store.snapshot(), before);
}
