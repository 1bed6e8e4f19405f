// src/core/types.rs — Core domain types

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::infra::errors::DraftError;

/// Bounds for one optimisation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    pub max_iterations: u32,
    /// A score strictly below this ends the loop early.
    pub target_score: u8,
}

impl LoopConfig {
    pub fn new(max_iterations: u32, target_score: u8) -> Result<Self, DraftError> {
        if max_iterations == 0 {
            return Err(DraftError::Config(
                "max_iterations must be at least 1".into(),
            ));
        }
        if target_score > 100 {
            return Err(DraftError::Config(format!(
                "target_score must be within 0..=100, got {}",
                target_score
            )));
        }
        Ok(Self {
            max_iterations,
            target_score,
        })
    }

    /// What to do after scoring iteration `iteration` (1-based).
    pub fn decide(&self, iteration: u32, score: u8) -> IterationDecision {
        if score < self.target_score {
            IterationDecision::Accept
        } else if iteration >= self.max_iterations {
            IterationDecision::AcceptBest
        } else {
            IterationDecision::Continue
        }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: 2,
            target_score: 30,
        }
    }
}

/// A draft together with the score it received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub content: String,
    pub score: u8,
}

impl Candidate {
    pub fn new(content: impl Into<String>, score: u8) -> Self {
        Self {
            content: content.into(),
            score,
        }
    }

    /// Strict improvement only; ties keep the earlier candidate.
    pub fn is_beaten_by(&self, score: u8) -> bool {
        score < self.score
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IterationDecision {
    /// Rewrite and score again.
    Continue,
    /// Target reached.
    Accept,
    /// Out of iterations; keep the best seen.
    AcceptBest,
}

impl std::fmt::Display for IterationDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IterationDecision::Continue => write!(f, "continue"),
            IterationDecision::Accept => write!(f, "accept"),
            IterationDecision::AcceptBest => write!(f, "accept_best"),
        }
    }
}

/// One scored iteration, kept for reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IterationRecord {
    pub iteration: u32,
    pub score: u8,
    /// Draft length in characters.
    pub length: usize,
}

/// Final result of a run. Built once, after the article is saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Record id in the article store.
    pub id: String,
    pub title: String,
    /// Article body as persisted.
    pub content: String,
    /// Body with the cover image prepended, for display.
    pub preview: String,
    pub score: u8,
    pub iterations: u32,
    pub history: Vec<IterationRecord>,
    pub cover: Option<String>,
    pub provider: String,
    pub created_at: DateTime<Local>,
}

/// Markdown shown ahead of the body when a cover exists.
pub fn preview_content(content: &str, cover: Option<&str>) -> String {
    match cover {
        Some(path) => format!("![封面图]({})\n\n{}", path, content),
        None => content.to_string(),
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Info => write!(f, "info"),
            LogLevel::Success => write!(f, "success"),
            LogLevel::Warning => write!(f, "warning"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Events emitted by the orchestrator while a run progresses.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Step {
        percent: u8,
        step: String,
    },
    Log {
        level: LogLevel,
        message: String,
    },
    Scored {
        iteration: u32,
        max_iterations: u32,
        score: u8,
        best_score: u8,
        decision: IterationDecision,
    },
}

/// Cooperative stop signal shared between a run and whoever may stop it.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─── LoopConfig ─────────────────────────────────────────────

    #[test]
    fn test_loop_config_rejects_zero_iterations() {
        let err = LoopConfig::new(0, 30).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_loop_config_rejects_target_over_100() {
        assert!(LoopConfig::new(2, 101).is_err());
        assert!(LoopConfig::new(2, 100).is_ok());
    }

    #[test]
    fn test_decide_target_is_strict() {
        let cfg = LoopConfig::new(2, 30).unwrap();
        assert_eq!(cfg.decide(1, 29), IterationDecision::Accept);
        assert_eq!(cfg.decide(1, 30), IterationDecision::Continue);
        assert_eq!(cfg.decide(2, 30), IterationDecision::AcceptBest);
    }

    #[test]
    fn test_decide_target_zero_never_accepts() {
        let cfg = LoopConfig::new(3, 0).unwrap();
        assert_eq!(cfg.decide(1, 0), IterationDecision::Continue);
        assert_eq!(cfg.decide(3, 0), IterationDecision::AcceptBest);
    }

    #[test]
    fn test_decide_accept_wins_on_last_iteration() {
        let cfg = LoopConfig::new(1, 30).unwrap();
        assert_eq!(cfg.decide(1, 10), IterationDecision::Accept);
    }

    // ─── Candidate ──────────────────────────────────────────────

    #[test]
    fn test_candidate_ties_keep_earlier() {
        let best = Candidate::new("first", 40);
        assert!(!best.is_beaten_by(40));
        assert!(best.is_beaten_by(39));
    }

    // ─── Misc ───────────────────────────────────────────────────

    #[test]
    fn test_preview_content_prepends_cover() {
        assert_eq!(
            preview_content("body", Some("covers/a.png")),
            "![封面图](covers/a.png)\n\nbody"
        );
        assert_eq!(preview_content("body", None), "body");
    }

    #[test]
    fn test_log_level_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&LogLevel::Warning).unwrap(), "\"warning\"");
        assert_eq!(LogLevel::Success.to_string(), "success");
    }

    #[test]
    fn test_cancel_flag_shared() {
        let flag = CancelFlag::new();
        let other = flag.clone();
        assert!(!other.is_cancelled());
        flag.cancel();
        assert!(other.is_cancelled());
    }
}
