//! Task state definitions for tracking per-page processing
//!
//! This module defines all states a task can be in during a run. The
//! fieldless [`TaskStatus`] names a state; [`TaskState`] carries the data that
//! only exists in that state.

use std::fmt;

/// Name of a task state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    // ===== Initial State =====
    /// Task is waiting to be admitted by the scheduler
    Pending,

    // ===== In-Flight States =====
    /// Content is being chunked and transformed
    Generating,

    /// The assembled artifact is being written
    Saving,

    // ===== Terminal States =====
    /// Artifact already existed at materialization and was left alone
    Skipped,

    /// Artifact was written
    Success,

    /// Generation or saving failed
    Error,
}

impl TaskStatus {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Skipped | Self::Success | Self::Error)
    }

    /// Returns true if `to` is a legal next state
    ///
    /// Pending → Skipped, Pending → Generating → Saving → Success, and any
    /// in-flight state → Error. No state is ever re-entered; chunk progress is
    /// updated in place.
    pub fn can_transition_to(&self, to: TaskStatus) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Skipped)
                | (Self::Pending, Self::Generating)
                | (Self::Generating, Self::Saving)
                | (Self::Generating, Self::Error)
                | (Self::Saving, Self::Success)
                | (Self::Saving, Self::Error)
        )
    }

    /// Lowercase name used in logs and the run summary
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Generating => "generating",
            Self::Saving => "saving",
            Self::Skipped => "skipped",
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    /// Returns all possible task states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::Generating,
            Self::Saving,
            Self::Skipped,
            Self::Success,
            Self::Error,
        ]
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A task state together with its per-state data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Skipped,
    Generating {
        chunks_done: usize,
        chunks_total: usize,
    },
    Saving,
    Success {
        title: String,
        description: String,
    },
    Error {
        message: String,
    },
}

impl TaskState {
    pub fn status(&self) -> TaskStatus {
        match self {
            Self::Pending => TaskStatus::Pending,
            Self::Skipped => TaskStatus::Skipped,
            Self::Generating { .. } => TaskStatus::Generating,
            Self::Saving => TaskStatus::Saving,
            Self::Success { .. } => TaskStatus::Success,
            Self::Error { .. } => TaskStatus::Error,
        }
    }
}
