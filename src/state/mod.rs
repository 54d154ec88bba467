//! State module for tracking task progress
//!
//! This module provides the per-page task and its state machine.
//!
//! # Components
//!
//! - `TaskStatus`: Names a state (pending, generating, saving, skipped, success, error)
//! - `TaskState`: A state with its data (chunk progress, result metadata, error message)
//! - `Task`: The per-page unit of work that moves through those states

mod task;
mod task_state;

// Re-export main types
pub use task::{Task, ERROR_SUFFIX};
pub use task_state::{TaskState, TaskStatus};
