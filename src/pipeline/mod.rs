//! Pipeline module for turning crawled pages into artifacts
//!
//! This module contains the task phase of a run, including:
//! - Task materialization from the crawl result
//! - The bounded worker pool
//! - Per-task execution (generate, save, record)
//! - Overall run coordination and index finalization

mod context;
mod coordinator;
mod materialize;
mod scheduler;
mod worker;

pub use context::{Counters, RunContext};
pub use coordinator::{Coordinator, RunOutcome, EXIT_INTERRUPTED};
pub use materialize::materialize;
pub use scheduler::{ScheduleOutcome, Scheduler};
pub use worker::execute_task;
