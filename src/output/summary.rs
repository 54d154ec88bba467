//! End-of-run summary
//!
//! This module collects the terminal status of every task into a
//! [`RunReport`] and prints it once the index has been finalized.

use crate::state::TaskStatus;
use chrono::{DateTime, Utc};

/// Longest error message shown in the summary and in failure index entries
pub const DISPLAY_MESSAGE_LIMIT: usize = 120;

/// Outcome of a single task
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub url: String,
    pub relative_path: String,

    /// Terminal status, or `Pending` if the task was never admitted
    pub status: TaskStatus,

    /// Truncated error message
    pub error: Option<String>,
}

/// Run summary
#[derive(Debug, Clone)]
pub struct RunReport {
    pub project: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub pages_crawled: usize,
    pub tasks: Vec<TaskReport>,
    pub index_entries_written: usize,
}

impl RunReport {
    pub fn count(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(TaskStatus::Success)
    }

    pub fn failed(&self) -> usize {
        self.count(TaskStatus::Error)
    }

    pub fn skipped(&self) -> usize {
        self.count(TaskStatus::Skipped)
    }

    /// Tasks that never reached a terminal state
    pub fn unfinished(&self) -> usize {
        self.tasks.iter().filter(|t| !t.status.is_terminal()).count()
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

/// Shortens a message to `limit` characters, appending `...` when cut
pub fn truncate_message(message: &str, limit: usize) -> String {
    let flat = message.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= limit {
        return flat;
    }
    let cut: String = flat.chars().take(limit).collect();
    format!("{}...", cut.trim_end())
}

/// Formats the summary as plain text
pub fn format_summary(report: &RunReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Distill Summary: {} ===\n\n", report.project));

    out.push_str("Tasks:\n");
    let mut tasks: Vec<&TaskReport> = report.tasks.iter().collect();
    tasks.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    for task in tasks {
        out.push_str(&format!(
            "  [{:<7}] {} ({})\n",
            task.status.as_str(),
            task.relative_path,
            task.url
        ));
        if let Some(error) = &task.error {
            out.push_str(&format!("            {}\n", error));
        }
    }
    out.push('\n');

    out.push_str("Overview:\n");
    out.push_str(&format!("  Pages crawled: {}\n", report.pages_crawled));
    out.push_str(&format!("  Tasks: {}\n", report.tasks.len()));
    out.push_str(&format!("  Success: {}\n", report.succeeded()));
    out.push_str(&format!("  Error: {}\n", report.failed()));
    out.push_str(&format!("  Skipped: {}\n", report.skipped()));
    if report.unfinished() > 0 {
        out.push_str(&format!("  Not processed: {}\n", report.unfinished()));
    }
    out.push_str(&format!(
        "  Index entries written: {}\n",
        report.index_entries_written
    ));
    out.push('\n');

    out.push_str(&format!(
        "Started: {}\n",
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!(
        "Finished: {}\n",
        report.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!("Duration: {}s\n", report.duration_seconds()));

    out
}

/// Prints the summary to stdout
pub fn print_summary(report: &RunReport) {
    print!("{}", format_summary(report));
}
