//! Outward signals raised when a phase completes.
//!
//! Both ports are fire-and-forget from the engine's point of view: the
//! `Complete` transition has already happened by the time they run.

use std::rc::Rc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{NotifyError, Result};
use crate::timer::{Phase, TimerMode};

/// What just finished, for hosts that vary the cue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionCue {
    pub block_id: Option<String>,
    pub mode: TimerMode,
    pub phase: Phase,
}

/// Audible (or otherwise perceptible) completion cue.
pub trait CompletionNotifier {
    fn notify_completion(&self, cue: &CompletionCue) -> Result<(), NotifyError>;
}

/// "Mark activity complete for today" in the external data layer.
///
/// Implementations are expected to be idempotent per `(activity_id, date)`.
pub trait LinkedActivityHook {
    fn mark_complete(&self, activity_id: &str, date: NaiveDate) -> Result<()>;
}

impl<T: LinkedActivityHook + ?Sized> LinkedActivityHook for Rc<T> {
    fn mark_complete(&self, activity_id: &str, date: NaiveDate) -> Result<()> {
        (**self).mark_complete(activity_id, date)
    }
}

/// Notifier that does nothing. Used when the host has no audio output.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl CompletionNotifier for SilentNotifier {
    fn notify_completion(&self, _cue: &CompletionCue) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Hook for hosts with no activity data layer. Every request fails so the
/// host can tell the user nothing was recorded.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedActivityHook;

impl LinkedActivityHook for DetachedActivityHook {
    fn mark_complete(&self, activity_id: &str, _date: NaiveDate) -> Result<()> {
        Err(NotifyError::LinkedActivity {
            activity_id: activity_id.to_string(),
            message: "no activity store configured".to_string(),
        }
        .into())
    }
}
