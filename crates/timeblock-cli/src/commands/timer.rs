use std::io::Write;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde::Serialize;
use timeblock_core::timer::{counts_as_session, format_clock};
use timeblock_core::{
    Command, Config, Database, Event, Phase, PomodoroPreset, TimerMode, TimerSnapshot,
    TimerStatus, TimerStore,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{info, warn};
use uuid::Uuid;

use crate::host::open_store;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run a focus block in the foreground, ticking once per second
    Run {
        /// Focus block id (default: a fresh id)
        #[arg(long)]
        block: Option<String>,
        /// Countdown length in minutes (countdown mode only)
        #[arg(long)]
        minutes: Option<u32>,
        /// Switch mode before starting: pomodoro, stopwatch or countdown
        #[arg(long)]
        mode: Option<TimerMode>,
        /// Recurring activity to complete when the block finishes
        #[arg(long)]
        link: Option<String>,
        /// Mark the linked activity done without asking
        #[arg(long)]
        mark_done: bool,
        /// Print events as JSON lines instead of a progress line
        #[arg(long)]
        json: bool,
    },
    /// Print the idle timer read model as JSON
    Status,
    /// List the Pomodoro preset catalog
    Presets,
}

#[derive(Serialize)]
struct PresetRow<'a> {
    index: usize,
    active: bool,
    #[serde(flatten)]
    preset: &'a PomodoroPreset,
}

pub async fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Run {
            block,
            minutes,
            mode,
            link,
            mark_done,
            json,
        } => {
            let opts = RunOptions {
                block_id: block.unwrap_or_else(|| Uuid::new_v4().to_string()),
                minutes,
                mode,
                link,
                mark_done,
                json,
            };
            run_block(opts).await
        }
        TimerAction::Status => {
            let config = Config::load()?;
            let store = open_store(&config, Rc::new(Database::open()?))?;
            println!("{}", serde_json::to_string_pretty(&store.snapshot())?);
            Ok(())
        }
        TimerAction::Presets => {
            let config = Config::load()?;
            let store = open_store(&config, Rc::new(Database::open()?))?;
            let active = store.snapshot().pomodoro_preset_index;
            let rows: Vec<PresetRow> = store
                .engine()
                .presets()
                .iter()
                .enumerate()
                .map(|(index, preset)| PresetRow {
                    index,
                    active: index == active,
                    preset,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
            Ok(())
        }
    }
}

struct RunOptions {
    block_id: String,
    minutes: Option<u32>,
    mode: Option<TimerMode>,
    link: Option<String>,
    mark_done: bool,
    json: bool,
}

enum Input {
    Command(Command),
    Quit,
    Help,
}

fn parse_input(line: &str, opts: &RunOptions) -> Option<Input> {
    let input = match line.trim() {
        "n" | "start" => Input::Command(Command::Start {
            block_id: opts.block_id.clone(),
            override_minutes: opts.minutes,
        }),
        "p" | "pause" => Input::Command(Command::Pause),
        "r" | "resume" => Input::Command(Command::Resume),
        "s" | "skip" => Input::Command(Command::SkipToNextPhase),
        "x" | "reset" => Input::Command(Command::Reset {
            override_minutes: opts.minutes,
        }),
        "z" => Input::Command(Command::ResetSessions),
        "q" | "quit" | "stop" => Input::Quit,
        "?" | "h" | "help" => Input::Help,
        _ => return None,
    };
    Some(input)
}

const HELP: &str = "[p] pause  [r] resume  [s] skip phase  [x] reset  [n] start next  [z] reset sessions  [q] stop";

/// A finished stretch of the timer worth keeping in the phase history.
#[derive(Debug, PartialEq)]
struct HistoryEntry<'a> {
    block_id: Option<&'a str>,
    mode: TimerMode,
    phase: Phase,
    duration_secs: u64,
    at: DateTime<Utc>,
}

impl<'a> HistoryEntry<'a> {
    /// Completed phases, skipped work phases (they count as sessions), and
    /// stopwatch blocks that ran before being stopped.
    fn from_event(event: &'a Event) -> Option<Self> {
        match event {
            Event::PhaseCompleted {
                block_id,
                mode,
                phase,
                total_seconds,
                at,
                ..
            } => Some(Self {
                block_id: block_id.as_deref(),
                mode: *mode,
                phase: *phase,
                duration_secs: *total_seconds,
                at: *at,
            }),
            Event::PhaseSkipped {
                block_id,
                from,
                elapsed_seconds,
                at,
                ..
            } if counts_as_session(*from) => Some(Self {
                block_id: block_id.as_deref(),
                mode: TimerMode::Pomodoro,
                phase: *from,
                duration_secs: *elapsed_seconds,
                at: *at,
            }),
            Event::TimerStopped {
                block_id,
                mode: TimerMode::Stopwatch,
                elapsed_seconds,
                at,
            } if *elapsed_seconds > 0 => Some(Self {
                block_id: block_id.as_deref(),
                mode: TimerMode::Stopwatch,
                phase: Phase::Work,
                duration_secs: *elapsed_seconds,
                at: *at,
            }),
            _ => None,
        }
    }
}

/// Terminal side of a running block: renders state, records completed
/// phases, and answers linked-activity prompts.
struct Host {
    db: Rc<Database>,
    json: bool,
    mark_done: bool,
}

impl Host {
    fn handle(&self, store: &TimerStore, events: &[Event]) {
        for event in events {
            if self.json {
                match serde_json::to_string(event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => warn!(error = %e, "failed to serialize event"),
                }
            }

            if let Some(entry) = HistoryEntry::from_event(event) {
                if let Err(e) = self.db.record_phase(
                    entry.block_id,
                    entry.mode,
                    entry.phase,
                    entry.duration_secs,
                    entry.at,
                ) {
                    warn!(error = %e, "failed to record finished phase");
                }
            }

            match event {
                Event::PhaseCompleted { mode, phase, .. } => {
                    if !self.json {
                        let what = match mode {
                            TimerMode::Pomodoro => phase.label(),
                            _ => "Countdown",
                        };
                        println!("\n{what} complete. [n] start next, [q] quit");
                    }
                }
                Event::LinkedActivityDue { activity_id, .. } => {
                    self.linked_activity_due(store, activity_id);
                }
                _ => {}
            }
        }
    }

    fn linked_activity_due(&self, store: &TimerStore, activity_id: &str) {
        if !self.mark_done {
            if !self.json {
                println!("Linked activity '{activity_id}' can be marked done: timeblock-cli activity done {activity_id}");
            }
            return;
        }
        match store.complete_linked_activity(activity_id) {
            Ok(()) => {
                info!(activity = %activity_id, "linked activity marked complete");
                if !self.json {
                    println!("Marked '{activity_id}' done for today.");
                }
            }
            Err(e) => warn!(activity = %activity_id, error = %e, "failed to mark linked activity"),
        }
    }

    fn render(&self, snap: &TimerSnapshot) {
        if self.json {
            return;
        }
        let clock = match snap.mode {
            TimerMode::Stopwatch => format_clock(snap.elapsed_seconds),
            _ => format_clock(snap.remaining_seconds),
        };
        let label = match snap.mode {
            TimerMode::Pomodoro => snap.phase.label(),
            TimerMode::Countdown => "Countdown",
            TimerMode::Stopwatch => "Stopwatch",
        };
        let status = match snap.status {
            TimerStatus::Paused => " (paused)",
            _ => "",
        };
        print!(
            "\r[{label}] {clock}{status}  sessions: {}   ",
            snap.completed_sessions
        );
        let _ = std::io::stdout().flush();
    }
}

async fn run_block(opts: RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Rc::new(Database::open()?);
    let mut store = open_store(&config, db.clone())?;
    let host = Host {
        db,
        json: opts.json,
        mark_done: opts.mark_done,
    };

    if let Some(mode) = opts.mode {
        let events = store.dispatch(Command::SetMode { mode });
        host.handle(&store, &events);
    }
    if opts.link.is_some() {
        let events = store.dispatch(Command::LinkActivity {
            activity_id: opts.link.clone(),
        });
        host.handle(&store, &events);
    }

    let started = store.dispatch(Command::Start {
        block_id: opts.block_id.clone(),
        override_minutes: opts.minutes,
    });
    if started.is_empty() {
        return Err("timer could not be started".into());
    }
    info!(block = %opts.block_id, mode = %store.snapshot().mode, "focus block started");
    host.handle(&store, &started);
    if !opts.json {
        println!("{HELP}");
    }
    host.render(&store.snapshot());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ticker: Option<Interval> = None;

    loop {
        sync_ticker(&store, &mut ticker);

        tokio::select! {
            _ = next_tick(&mut ticker) => {
                let events = store.tick();
                host.handle(&store, &events);
            }
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(line) => match parse_input(&line, &opts) {
                        Some(Input::Command(cmd)) => {
                            let events = store.dispatch(cmd);
                            host.handle(&store, &events);
                        }
                        Some(Input::Quit) => {
                            let events = store.dispatch(Command::Stop);
                            host.handle(&store, &events);
                        }
                        Some(Input::Help) => println!("\n{HELP}"),
                        None => println!("\nunknown input '{}'. {HELP}", line.trim()),
                    },
                    None => stdin_open = false,
                }
            }
            _ = &mut ctrl_c => {
                let events = store.dispatch(Command::Stop);
                host.handle(&store, &events);
            }
        }

        let mut snap = store.snapshot();
        if snap.status == TimerStatus::Complete
            && snap.mode == TimerMode::Pomodoro
            && config.timer.auto_continue
        {
            let events = store.dispatch(Command::Start {
                block_id: opts.block_id.clone(),
                override_minutes: opts.minutes,
            });
            host.handle(&store, &events);
            snap = store.snapshot();
        }

        if snap.status == TimerStatus::Idle {
            break;
        }
        // Nothing can resume a paused or completed block once input is gone.
        if !stdin_open && snap.status != TimerStatus::Running {
            break;
        }
        host.render(&snap);
    }

    if opts.json {
        println!("{}", serde_json::to_string(&store.snapshot())?);
    } else {
        println!();
    }
    info!(block = %opts.block_id, "focus block ended");
    Ok(())
}

/// Keep a one-second interval installed exactly while the timer runs.
fn sync_ticker(store: &TimerStore, ticker: &mut Option<Interval>) {
    let running = store.snapshot().status == TimerStatus::Running;
    match (running, ticker.is_some()) {
        (true, false) => {
            let period = Duration::from_secs(1);
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            *ticker = Some(interval);
        }
        (false, true) => *ticker = None,
        _ => {}
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> RunOptions {
        RunOptions {
            block_id: "b".into(),
            minutes: Some(5),
            mode: None,
            link: None,
            mark_done: false,
            json: false,
        }
    }

    #[test]
    fn parses_single_key_inputs() {
        let o = opts();
        assert!(matches!(
            parse_input("p", &o),
            Some(Input::Command(Command::Pause))
        ));
        assert!(matches!(
            parse_input(" s \n", &o),
            Some(Input::Command(Command::SkipToNextPhase))
        ));
        assert!(matches!(parse_input("q", &o), Some(Input::Quit)));
        assert!(matches!(parse_input("?", &o), Some(Input::Help)));
        assert!(parse_input("jump", &o).is_none());
    }

    #[test]
    fn skipped_work_enters_history_but_skipped_break_does_not() {
        let at = Utc::now();
        let skip = |from, to| Event::PhaseSkipped {
            block_id: Some("b".into()),
            from,
            to,
            elapsed_seconds: 600,
            total_seconds: 300,
            completed_sessions: 1,
            linked_activity_id: None,
            at,
        };

        let work = skip(Phase::Work, Phase::Break);
        assert_eq!(
            HistoryEntry::from_event(&work),
            Some(HistoryEntry {
                block_id: Some("b"),
                mode: TimerMode::Pomodoro,
                phase: Phase::Work,
                duration_secs: 600,
                at,
            })
        );
        assert!(HistoryEntry::from_event(&skip(Phase::Break, Phase::Work)).is_none());
    }

    #[test]
    fn stopped_stopwatch_enters_history_when_it_ran() {
        let stopped = |mode, elapsed_seconds| Event::TimerStopped {
            block_id: Some("b".into()),
            mode,
            elapsed_seconds,
            at: Utc::now(),
        };

        let event = stopped(TimerMode::Stopwatch, 90);
        let entry = HistoryEntry::from_event(&event).unwrap();
        assert_eq!(entry.mode, TimerMode::Stopwatch);
        assert_eq!(entry.duration_secs, 90);
        assert!(HistoryEntry::from_event(&stopped(TimerMode::Stopwatch, 0)).is_none());
        assert!(HistoryEntry::from_event(&stopped(TimerMode::Countdown, 90)).is_none());
    }

    #[test]
    fn start_and_reset_carry_block_and_minutes() {
        let o = opts();
        match parse_input("n", &o) {
            Some(Input::Command(Command::Start {
                block_id,
                override_minutes,
            })) => {
                assert_eq!(block_id, "b");
                assert_eq!(override_minutes, Some(5));
            }
            _ => panic!("Expected Start"),
        }
        assert!(matches!(
            parse_input("x", &o),
            Some(Input::Command(Command::Reset {
                override_minutes: Some(5)
            }))
        ));
    }
}
