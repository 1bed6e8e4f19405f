// src/core/state.rs — Shared run status for observers
//
// One `RunStatus` per process, behind a mutex. Only the active run writes to
// it; every update carries that run's id so a stopped run that is still
// unwinding cannot overwrite its successor.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use super::types::{CancelFlag, LogLevel, ProgressEvent, RunResult};
use crate::infra::errors::DraftError;

pub const LOG_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    Idle,
    Running,
    Succeeded,
    Failed,
    Stopped,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntry {
    /// Wall-clock `HH:MM:SS`.
    pub time: String,
    pub level: LogLevel,
    pub message: String,
}

/// Append-only log that keeps the newest `capacity` entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    #[serde(skip, default = "default_capacity")]
    capacity: usize,
}

fn default_capacity() -> usize {
    LOG_CAPACITY
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }
}

impl LogBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, level: LogLevel, message: impl Into<String>) {
        self.entries.push_back(LogEntry {
            time: Local::now().format("%H:%M:%S").to_string(),
            level,
            message: message.into(),
        });
        while self.entries.len() > self.capacity.max(1) {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatus {
    pub running: bool,
    pub phase: RunPhase,
    pub progress: u8,
    pub current_step: String,
    pub logs: LogBuffer,
    pub result: Option<RunResult>,
    pub error: Option<String>,
    pub provider: Option<String>,
    pub domain: Option<String>,
    pub run_id: Option<String>,
    pub iteration: u32,
    pub best_score: Option<u8>,
    pub started_at: Option<DateTime<Local>>,
    pub finished_at: Option<DateTime<Local>>,
    /// Stop signal of the run that owns `run_id`; raised under the same lock
    /// that marks the run stopped.
    #[serde(skip)]
    cancel: Option<CancelFlag>,
}

impl Default for RunStatus {
    fn default() -> Self {
        Self {
            running: false,
            phase: RunPhase::Idle,
            progress: 0,
            current_step: String::new(),
            logs: LogBuffer::default(),
            result: None,
            error: None,
            provider: None,
            domain: None,
            run_id: None,
            iteration: 0,
            best_score: None,
            started_at: None,
            finished_at: None,
            cancel: None,
        }
    }
}

impl RunStatus {
    fn is_current(&self, run_id: &str) -> bool {
        self.running && self.run_id.as_deref() == Some(run_id)
    }
}

/// Cloneable handle to the process-wide run status.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    inner: Arc<Mutex<RunStatus>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RunStatus> {
        // A panicking writer leaves plain data behind; keep serving it
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> RunStatus {
        self.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    /// Reset the status for a new run. Fails, leaving state untouched, if one is active.
    pub fn try_begin(&self, provider: &str, domain: &str) -> Result<String, DraftError> {
        let mut status = self.lock();
        if status.running {
            return Err(DraftError::RunInProgress);
        }

        let run_id = uuid::Uuid::new_v4().to_string();
        *status = RunStatus {
            running: true,
            phase: RunPhase::Running,
            current_step: "Starting...".into(),
            provider: Some(provider.to_string()),
            domain: Some(domain.to_string()),
            run_id: Some(run_id.clone()),
            started_at: Some(Local::now()),
            cancel: Some(CancelFlag::new()),
            ..RunStatus::default()
        };
        status
            .logs
            .push(LogLevel::Info, format!("Task started with {}", provider));
        Ok(run_id)
    }

    /// Stop signal for `run_id`. Already raised if the run was stopped
    /// between `try_begin` and this call; `None` once a newer run began.
    pub fn cancel_flag(&self, run_id: &str) -> Option<CancelFlag> {
        let status = self.lock();
        if status.run_id.as_deref() != Some(run_id) {
            return None;
        }
        status.cancel.clone()
    }

    /// Apply one progress event. Returns false when the event was stale.
    pub fn apply(&self, run_id: &str, event: &ProgressEvent) -> bool {
        let mut status = self.lock();
        if !status.is_current(run_id) {
            return false;
        }
        match event {
            ProgressEvent::Step { percent, step } => {
                status.progress = status.progress.max(*percent);
                status.current_step = step.clone();
            }
            ProgressEvent::Log { level, message } => {
                status.logs.push(*level, message.clone());
            }
            ProgressEvent::Scored {
                iteration,
                best_score,
                ..
            } => {
                status.iteration = *iteration;
                status.best_score = Some(*best_score);
            }
        }
        true
    }

    pub fn finish(&self, run_id: &str, result: RunResult) -> bool {
        let mut status = self.lock();
        if !status.is_current(run_id) {
            return false;
        }
        status.running = false;
        status.phase = RunPhase::Succeeded;
        status.progress = 100;
        status.current_step = "Complete".into();
        status.best_score = Some(result.score);
        status.result = Some(result);
        status.finished_at = Some(Local::now());
        true
    }

    pub fn fail(&self, run_id: &str, error: &DraftError) -> bool {
        let mut status = self.lock();
        if !status.is_current(run_id) {
            return false;
        }
        let message = error.to_string();
        status.running = false;
        status.phase = RunPhase::Failed;
        status.current_step = "Failed".into();
        status.logs.push(LogLevel::Error, format!("Error: {}", message));
        status.error = Some(message);
        status.finished_at = Some(Local::now());
        true
    }

    /// Mark the active run stopped. Returns false when nothing was running.
    pub fn stop(&self) -> bool {
        let mut status = self.lock();
        if !status.running {
            return false;
        }
        if let Some(flag) = &status.cancel {
            flag.cancel();
        }
        status.running = false;
        status.phase = RunPhase::Stopped;
        status.current_step = "Stopped by user".into();
        status.logs.push(LogLevel::Warning, "Task stopped by user");
        status.finished_at = Some(Local::now());
        true
    }
}

/// Build a progress callback that records events on `board` for `run_id`.
///
/// `inner` is an optional inner callback (e.g. terminal_progress) to delegate to.
pub fn board_progress(
    board: StatusBoard,
    run_id: String,
    inner: Option<Box<dyn Fn(ProgressEvent) + Send + Sync>>,
) -> impl Fn(ProgressEvent) + Send + Sync + 'static {
    move |event: ProgressEvent| {
        if let Some(ref cb) = inner {
            cb(event.clone());
        }
        board.apply(&run_id, &event);
    }
}
