use crate::crawler::FetchError;
use crate::state::task_state::{TaskState, TaskStatus};
use crate::DistillError;
use std::path::PathBuf;
use url::Url;

/// Suffix of the file holding a failed task's full error
pub const ERROR_SUFFIX: &str = ".error";

/// Per-page unit of work
///
/// A task is mutated only by whoever holds it: the materializer until it is
/// queued, then the worker executing it. Transitions go through the methods
/// below, which reject anything the state machine does not allow.
#[derive(Debug, Clone)]
pub struct Task {
    /// Normalized page URL
    pub url: Url,

    /// Crawled content; `None` if the page failed to load or has been consumed
    pub raw_content: Option<String>,

    /// Why the page failed to load, when it did
    pub fetch_error: Option<FetchError>,

    /// Absolute artifact path
    pub target_path: PathBuf,

    /// Artifact path relative to the project directory
    pub relative_path: String,

    state: TaskState,
}

impl Task {
    /// Creates a pending task
    pub fn new(
        url: Url,
        raw_content: Option<String>,
        target_path: PathBuf,
        relative_path: String,
    ) -> Self {
        Self {
            url,
            raw_content,
            fetch_error: None,
            target_path,
            relative_path,
            state: TaskState::Pending,
        }
    }

    /// Attaches the error that kept the page from loading
    pub fn with_fetch_error(mut self, error: Option<FetchError>) -> Self {
        self.fetch_error = error;
        self
    }

    pub fn state(&self) -> &TaskState {
        &self.state
    }

    pub fn status(&self) -> TaskStatus {
        self.state.status()
    }

    /// Pending → Skipped
    pub fn skip(&mut self) -> Result<(), DistillError> {
        self.transition(TaskState::Skipped)
    }

    /// Pending → Generating, with unknown chunk count
    pub fn start_generating(&mut self) -> Result<(), DistillError> {
        self.transition(TaskState::Generating {
            chunks_done: 0,
            chunks_total: 0,
        })
    }

    /// Records chunk progress; ignored outside Generating
    pub fn update_progress(&mut self, done: usize, total: usize) {
        if let TaskState::Generating {
            chunks_done,
            chunks_total,
        } = &mut self.state
        {
            *chunks_done = done;
            *chunks_total = total;
        }
    }

    /// Generating → Saving
    pub fn start_saving(&mut self) -> Result<(), DistillError> {
        self.transition(TaskState::Saving)
    }

    /// Saving → Success
    pub fn succeed(&mut self, title: String, description: String) -> Result<(), DistillError> {
        self.transition(TaskState::Success { title, description })
    }

    /// Generating or Saving → Error
    pub fn fail(&mut self, message: String) -> Result<(), DistillError> {
        self.transition(TaskState::Error { message })
    }

    /// Takes the raw content out of the task, leaving `None`
    pub fn take_content(&mut self) -> Option<String> {
        self.raw_content.take()
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            TaskState::Error { message } => Some(message),
            _ => None,
        }
    }

    /// `(done, total)` while generating
    pub fn chunk_progress(&self) -> Option<(usize, usize)> {
        match self.state {
            TaskState::Generating {
                chunks_done,
                chunks_total,
            } => Some((chunks_done, chunks_total)),
            _ => None,
        }
    }

    /// Where the full error of a failed task is written
    pub fn error_path(&self) -> PathBuf {
        let mut path = self.target_path.clone().into_os_string();
        path.push(ERROR_SUFFIX);
        PathBuf::from(path)
    }

    /// Relative counterpart of [`Task::error_path`]
    pub fn error_relative_path(&self) -> String {
        format!("{}{}", self.relative_path, ERROR_SUFFIX)
    }

    fn transition(&mut self, next: TaskState) -> Result<(), DistillError> {
        let from = self.status();
        let to = next.status();

        if !from.can_transition_to(to) {
            return Err(DistillError::InvalidTransition { from, to });
        }

        tracing::trace!("{}: {} -> {}", self.relative_path, from, to);
        self.state = next;
        Ok(())
    }
}
