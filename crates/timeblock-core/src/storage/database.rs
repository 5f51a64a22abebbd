//! SQLite-based storage.
//!
//! Provides persistent storage for:
//! - Completed timer phases and statistics (daily and all-time)
//! - Linked-activity completions, one row per activity per day
//! - Key-value store for the preference record

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{DatabaseError, Result};
use crate::notify::LinkedActivityHook;
use crate::preferences::{PreferenceStore, Preferences};
use crate::timer::{Phase, TimerMode};

const PREFERENCES_KEY: &str = "timer_preferences";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub id: i64,
    pub block_id: Option<String>,
    pub mode: String,
    pub phase: String,
    pub duration_secs: u64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCompletion {
    pub activity_id: String,
    pub date: NaiveDate,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Stats {
    pub total_phases: u64,
    pub completed_pomodoros: u64,
    pub completed_countdowns: u64,
    pub stopwatch_blocks: u64,
    pub total_focus_secs: u64,
    pub total_break_secs: u64,
    pub today_pomodoros: u64,
    pub today_focus_secs: u64,
}

/// SQLite database for phase history, activity completions and preferences.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/timeblock/timeblock.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("timeblock.db");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS phases (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                block_id      TEXT,
                mode          TEXT NOT NULL,
                phase         TEXT NOT NULL,
                duration_secs INTEGER NOT NULL,
                completed_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS activity_completions (
                activity_id  TEXT NOT NULL,
                date         TEXT NOT NULL,
                completed_at TEXT NOT NULL,
                PRIMARY KEY (activity_id, date)
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_phases_completed_at ON phases(completed_at);
            CREATE INDEX IF NOT EXISTS idx_activity_completions_date ON activity_completions(date);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    /// Record a completed phase.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_phase(
        &self,
        block_id: Option<&str>,
        mode: TimerMode,
        phase: Phase,
        duration_secs: u64,
        completed_at: DateTime<Utc>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO phases (block_id, mode, phase, duration_secs, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                block_id,
                mode.to_string(),
                phase_key(mode, phase),
                duration_secs,
                completed_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent phases first.
    pub fn recent_phases(&self, limit: usize) -> Result<Vec<PhaseRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, block_id, mode, phase, duration_secs, completed_at
             FROM phases
             ORDER BY completed_at DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            let completed_at: String = row.get(5)?;
            Ok(PhaseRecord {
                id: row.get(0)?,
                block_id: row.get(1)?,
                mode: row.get(2)?,
                phase: row.get(3)?,
                duration_secs: row.get(4)?,
                completed_at: parse_timestamp(&completed_at),
            })
        })?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    pub fn stats_today(&self) -> Result<Stats> {
        self.stats_since(Some(today_start()))
    }

    pub fn stats_all(&self) -> Result<Stats> {
        let mut stats = self.stats_since(None)?;
        let today = self.stats_since(Some(today_start()))?;
        stats.today_pomodoros = today.completed_pomodoros;
        stats.today_focus_secs = today.total_focus_secs;
        Ok(stats)
    }

    fn stats_since(&self, since: Option<String>) -> Result<Stats> {
        let mut stmt = self.conn.prepare(
            "SELECT phase, COUNT(*), COALESCE(SUM(duration_secs), 0)
             FROM phases
             WHERE ?1 IS NULL OR completed_at >= ?1
             GROUP BY phase",
        )?;

        let mut stats = Stats::default();
        let rows = stmt.query_map(params![since.as_deref()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
            ))
        })?;

        for row in rows {
            let (phase, count, secs) = row?;
            stats.total_phases += count;
            match phase.as_str() {
                "work" => {
                    stats.completed_pomodoros += count;
                    stats.total_focus_secs += secs;
                }
                "countdown" => {
                    stats.completed_countdowns += count;
                    stats.total_focus_secs += secs;
                }
                "stopwatch" => {
                    stats.stopwatch_blocks += count;
                    stats.total_focus_secs += secs;
                }
                "break" | "long_break" => {
                    stats.total_break_secs += secs;
                }
                _ => {}
            }
        }

        if since.is_some() {
            stats.today_pomodoros = stats.completed_pomodoros;
            stats.today_focus_secs = stats.total_focus_secs;
        }
        Ok(stats)
    }

    /// Mark `activity_id` done on `date`. Repeating the call for the same
    /// day only refreshes `completed_at`.
    pub fn upsert_activity_completion(&self, activity_id: &str, date: NaiveDate) -> Result<()> {
        self.conn.execute(
            "INSERT INTO activity_completions (activity_id, date, completed_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(activity_id, date) DO UPDATE SET completed_at = excluded.completed_at",
            params![activity_id, date.to_string(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn activity_completions_on(&self, date: NaiveDate) -> Result<Vec<ActivityCompletion>> {
        let mut stmt = self.conn.prepare(
            "SELECT activity_id, date, completed_at
             FROM activity_completions
             WHERE date = ?1
             ORDER BY completed_at",
        )?;
        let rows = stmt.query_map(params![date.to_string()], |row| {
            let date: String = row.get(1)?;
            let completed_at: String = row.get(2)?;
            Ok((row.get::<_, String>(0)?, date, completed_at))
        })?;

        let mut completions = Vec::new();
        for row in rows {
            let (activity_id, day, completed_at) = row?;
            let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                .map_err(|e| DatabaseError::QueryFailed(format!("bad date '{day}': {e}")))?;
            completions.push(ActivityCompletion {
                activity_id,
                date,
                completed_at: parse_timestamp(&completed_at),
            });
        }
        Ok(completions)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl PreferenceStore for Database {
    fn load(&self) -> Result<Option<Preferences>> {
        match self.kv_get(PREFERENCES_KEY)? {
            Some(json) => Ok(Some(Preferences::from_json(&json)?)),
            None => Ok(None),
        }
    }

    fn save(&self, prefs: &Preferences) -> Result<()> {
        self.kv_set(PREFERENCES_KEY, &prefs.to_json()?)
    }
}

impl LinkedActivityHook for Database {
    fn mark_complete(&self, activity_id: &str, date: NaiveDate) -> Result<()> {
        self.upsert_activity_completion(activity_id, date)
    }
}

/// Storage key for a finished block. Countdowns and stopped stopwatches have
/// no Pomodoro phase.
fn phase_key(mode: TimerMode, phase: Phase) -> &'static str {
    match (mode, phase) {
        (TimerMode::Countdown, _) => "countdown",
        (TimerMode::Stopwatch, _) => "stopwatch",
        (TimerMode::Pomodoro, Phase::Work) => "work",
        (TimerMode::Pomodoro, Phase::Break) => "break",
        (TimerMode::Pomodoro, Phase::LongBreak) => "long_break",
    }
}

fn today_start() -> String {
    let today = Utc::now().format("%Y-%m-%d").to_string();
    format!("{today}T00:00:00+00:00")
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_query() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        db.record_phase(Some("a"), TimerMode::Pomodoro, Phase::Work, 1500, now)
            .unwrap();
        db.record_phase(Some("a"), TimerMode::Pomodoro, Phase::Break, 300, now)
            .unwrap();
        db.record_phase(None, TimerMode::Countdown, Phase::Work, 600, now)
            .unwrap();

        let stats = db.stats_all().unwrap();
        assert_eq!(stats.total_phases, 3);
        assert_eq!(stats.completed_pomodoros, 1);
        assert_eq!(stats.completed_countdowns, 1);
        assert_eq!(stats.total_focus_secs, 2100);
        assert_eq!(stats.total_break_secs, 300);
        assert_eq!(stats.today_pomodoros, 1);

        assert_eq!(db.stats_today().unwrap().total_phases, 3);
    }

    #[test]
    fn stopped_stopwatch_counts_as_focus() {
        let db = Database::open_memory().unwrap();
        db.record_phase(Some("b"), TimerMode::Stopwatch, Phase::Work, 420, Utc::now())
            .unwrap();
        let stats = db.stats_all().unwrap();
        assert_eq!(stats.stopwatch_blocks, 1);
        assert_eq!(stats.completed_pomodoros, 0);
        assert_eq!(stats.total_focus_secs, 420);
        assert_eq!(db.recent_phases(1).unwrap()[0].phase, "stopwatch");
    }

    #[test]
    fn old_phases_are_excluded_from_today() {
        let db = Database::open_memory().unwrap();
        let last_week = Utc::now() - chrono::Duration::days(7);
        db.record_phase(None, TimerMode::Pomodoro, Phase::Work, 1500, last_week)
            .unwrap();
        assert_eq!(db.stats_today().unwrap().completed_pomodoros, 0);
        let all = db.stats_all().unwrap();
        assert_eq!(all.completed_pomodoros, 1);
        assert_eq!(all.today_pomodoros, 0);
    }

    #[test]
    fn recent_phases_newest_first() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        db.record_phase(Some("a"), TimerMode::Pomodoro, Phase::Work, 1500, now - chrono::Duration::minutes(30))
            .unwrap();
        db.record_phase(Some("a"), TimerMode::Pomodoro, Phase::LongBreak, 900, now)
            .unwrap();
        let recent = db.recent_phases(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].phase, "long_break");
        assert_eq!(recent[1].block_id.as_deref(), Some("a"));
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
    }

    #[test]
    fn preferences_round_trip_through_kv() {
        let db = Database::open_memory().unwrap();
        assert!(PreferenceStore::load(&db).unwrap().is_none());

        let prefs = Preferences {
            audio_enabled: false,
            pomodoro_preset_index: 1,
            mode: TimerMode::Countdown,
            ..Preferences::default()
        };
        db.save(&prefs).unwrap();
        assert_eq!(PreferenceStore::load(&db).unwrap(), Some(prefs));
    }

    #[test]
    fn activity_completion_is_idempotent_per_day() {
        let db = Database::open_memory().unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();
        let next = day.succ_opt().unwrap();

        db.mark_complete("stretch", day).unwrap();
        db.mark_complete("stretch", day).unwrap();
        db.mark_complete("stretch", next).unwrap();
        db.mark_complete("read", day).unwrap();

        let on_day = db.activity_completions_on(day).unwrap();
        assert_eq!(on_day.len(), 2);
        assert!(on_day.iter().all(|c| c.date == day));
        assert_eq!(db.activity_completions_on(next).unwrap().len(), 1);
    }

    #[test]
    fn open_at_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.kv_set("k", "v").unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.kv_get("k").unwrap().as_deref(), Some("v"));
    }
}
