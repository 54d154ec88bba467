//! Execution of a single task
//!
//! Generating chunks and transforms the page content, Saving writes the
//! artifact. Whatever fails along the way turns the task into an Error with a
//! failure index entry; it never escapes to the scheduler.

use crate::output::{
    remove_stale_error_file, render_artifact, truncate_message, write_artifact,
    write_error_file, IndexEntry, DISPLAY_MESSAGE_LIMIT,
};
use crate::pipeline::context::RunContext;
use crate::state::Task;
use crate::transform::{transform_document, Transformer};
use crate::url::title_from_relative_path;
use crate::DistillError;
use std::error::Error as _;

/// Runs a pending task to a terminal state and returns it
///
/// Exactly one index entry is recorded and exactly one counter is bumped,
/// whichever way the task ends.
pub async fn execute_task(mut task: Task, ctx: &RunContext, transformer: &dyn Transformer) -> Task {
    tracing::debug!("Processing {} -> {}", task.url, task.relative_path);

    match process(&mut task, ctx, transformer).await {
        Ok(entry) => {
            tracing::info!("Saved {}", task.relative_path);
            ctx.record_success(entry);
        }
        Err(e) => {
            let message = error_chain(&e);
            tracing::error!(
                url = %task.url,
                path = %task.target_path.display(),
                "Task failed: {}",
                message
            );

            let display = truncate_message(&message, DISPLAY_MESSAGE_LIMIT);
            if let Err(transition) = task.fail(display.clone()) {
                tracing::warn!("{}: {}", task.relative_path, transition);
            }

            write_error_file(&task.error_path(), &message).await;
            ctx.record_failure(IndexEntry::failure(
                title_from_relative_path(&task.relative_path),
                display,
                ctx.index_path_for(&task.error_relative_path()),
            ));
        }
    }

    task
}

async fn process(
    task: &mut Task,
    ctx: &RunContext,
    transformer: &dyn Transformer,
) -> Result<IndexEntry, DistillError> {
    task.start_generating()?;

    let content = match task.take_content() {
        Some(content) => content,
        None => {
            return Err(match task.fetch_error.take() {
                Some(e) => DistillError::Fetch(e),
                None => DistillError::MissingContent {
                    url: task.url.to_string(),
                },
            })
        }
    };

    let document = transform_document(transformer, &content, &ctx.chunking, |done, total| {
        task.update_progress(done, total);
        if total > 1 {
            tracing::debug!("{}: chunk {}/{}", task.relative_path, done, total);
        }
    })
    .await?;

    task.start_saving()?;
    write_artifact(&task.target_path, &render_artifact(&document)).await?;
    remove_stale_error_file(&task.error_path()).await;

    let title = if document.title.is_empty() {
        title_from_relative_path(&task.relative_path)
    } else {
        document.title
    };
    task.succeed(title.clone(), document.description.clone())?;

    Ok(IndexEntry::artifact(
        title,
        document.description,
        ctx.index_path_for(&task.relative_path),
    ))
}

/// Formats an error with every source in its chain
fn error_chain(error: &DistillError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChunkSettings;
    use crate::crawler::{FetchError, FetchErrorKind};
    use crate::state::{TaskState, TaskStatus};
    use crate::transform::{TransformError, TransformErrorKind, TransformOutput};
    use async_trait::async_trait;
    use std::path::Path;
    use tempfile::TempDir;
    use url::Url;

    struct Fixed(Result<TransformOutput, TransformError>);

    #[async_trait]
    impl Transformer for Fixed {
        async fn transform(&self, _input: &str) -> Result<TransformOutput, TransformError> {
            self.0.clone()
        }
    }

    fn ok_transformer() -> Fixed {
        Fixed(Ok(TransformOutput {
            title: "Guide".to_string(),
            description: "How to start.".to_string(),
            transformed_content: "Step one.".to_string(),
        }))
    }

    fn context(dir: &Path) -> RunContext {
        RunContext::new("docs".to_string(), dir.to_path_buf(), ChunkSettings::default())
    }

    fn task(dir: &Path, content: Option<&str>) -> Task {
        Task::new(
            Url::parse("https://example.com/docs/guide").unwrap(),
            content.map(str::to_string),
            dir.join("guide.md"),
            "guide.md".to_string(),
        )
    }

    #[tokio::test]
    async fn test_successful_task() {
        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path());
        std::fs::write(dir.path().join("guide.md.error"), "old failure").unwrap();

        let task = execute_task(task(dir.path(), Some("text")), &ctx, &ok_transformer()).await;

        assert_eq!(
            task.state(),
            &TaskState::Success {
                title: "Guide".to_string(),
                description: "How to start.".to_string()
            }
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("guide.md")).unwrap(),
            "# Guide\n\n> How to start.\n\nStep one.\n"
        );
        assert!(!dir.path().join("guide.md.error").exists());

        let entries = ctx.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].artifact_path, "docs/guide.md");
        assert_eq!(ctx.counters().succeeded, 1);
    }

    #[tokio::test]
    async fn test_transform_failure_becomes_error() {
        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path());
        let failing = Fixed(Err(TransformError::new(
            TransformErrorKind::HttpStatus(500),
            "overloaded",
        )));

        let task = execute_task(task(dir.path(), Some("text")), &ctx, &failing).await;

        assert_eq!(task.status(), TaskStatus::Error);
        assert!(task.error_message().unwrap().contains("HTTP 500"));
        assert!(!dir.path().join("guide.md").exists());

        let error_file = std::fs::read_to_string(dir.path().join("guide.md.error")).unwrap();
        assert!(error_file.contains("overloaded"));

        let entries = ctx.entries();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].failed);
        assert_eq!(entries[0].title, "guide");
        assert_eq!(entries[0].artifact_path, "docs/guide.md.error");
        assert_eq!(ctx.counters().failed, 1);
    }

    #[tokio::test]
    async fn test_missing_content_becomes_error() {
        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path());

        let task = execute_task(task(dir.path(), None), &ctx, &ok_transformer()).await;

        assert_eq!(task.status(), TaskStatus::Error);
        assert!(task.error_message().unwrap().contains("unavailable"));
        assert_eq!(ctx.counters().failed, 1);
        assert_eq!(ctx.counters().succeeded, 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_reason_is_reported() {
        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path());
        let task = task(dir.path(), None).with_fetch_error(Some(FetchError::new(
            FetchErrorKind::Timeout,
            "https://example.com/docs/guide",
            "navigation timed out after 30s",
        )));

        let task = execute_task(task, &ctx, &ok_transformer()).await;

        assert_eq!(task.status(), TaskStatus::Error);
        let shown = task.error_message().unwrap();
        assert!(shown.starts_with("Fetch error: timeout while fetching"));
        assert!(shown.contains("navigation timed out after 30s"));

        let error_file = std::fs::read_to_string(dir.path().join("guide.md.error")).unwrap();
        assert!(error_file.contains("navigation timed out after 30s"));

        let entries = ctx.entries();
        assert!(entries[0].failed);
        assert!(entries[0].description.contains("timeout"));
    }

    #[tokio::test]
    async fn test_long_error_is_truncated_for_display() {
        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path());
        let failing = Fixed(Err(TransformError::new(
            TransformErrorKind::Schema,
            "x".repeat(500),
        )));

        let task = execute_task(task(dir.path(), Some("text")), &ctx, &failing).await;

        let shown = task.error_message().unwrap();
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), DISPLAY_MESSAGE_LIMIT + 3);

        // The error file keeps everything
        let error_file = std::fs::read_to_string(dir.path().join("guide.md.error")).unwrap();
        assert!(error_file.contains(&"x".repeat(500)));
    }

    #[test]
    fn test_error_chain_includes_sources() {
        let err = DistillError::Write {
            path: "/out/a.md".into(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert_eq!(error_chain(&err), "Failed to write /out/a.md: disk full");
    }
}
