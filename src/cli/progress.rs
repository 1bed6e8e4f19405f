// src/cli/progress.rs — Terminal progress renderer for real-time run feedback

use crate::core::types::{LogLevel, ProgressEvent};

/// One stderr line for `event`, or `None` for events the terminal skips.
pub fn format_event(event: &ProgressEvent) -> Option<String> {
    match event {
        ProgressEvent::Step { percent, step } => Some(format!("[{:>3}%] {}", percent, step)),
        ProgressEvent::Scored {
            iteration,
            max_iterations,
            score,
            best_score,
            decision,
        } => Some(format!(
            "[iter {}/{}] score={}% best={}% -> {}",
            iteration, max_iterations, score, best_score, decision
        )),
        ProgressEvent::Log { level, message } => match level {
            // Info lines repeat what steps already show
            LogLevel::Info => None,
            LogLevel::Success => Some(format!("  {}", message.trim_start())),
            LogLevel::Warning => Some(format!("  [warn] {}", message.trim_start())),
            LogLevel::Error => Some(format!("  [error] {}", message.trim_start())),
        },
    }
}

/// Build a progress callback that writes formatted output to stderr.
///
/// All progress output goes to stderr so stdout remains clean for the article.
/// Returns a closure suitable for `Orchestrator::with_progress()`.
pub fn terminal_progress() -> impl Fn(ProgressEvent) + Send + Sync + 'static {
    move |event| {
        if let Some(line) = format_event(&event) {
            eprintln!("{}", line);
        }
    }
}
