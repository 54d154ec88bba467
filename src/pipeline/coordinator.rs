//! Run coordinator - main pipeline orchestration
//!
//! This module drives one run from start to finish:
//! - Crawling the scoped section into a list of pages
//! - Materializing tasks, skipping pages whose artifact exists
//! - Running pending tasks on the bounded scheduler
//! - Finalizing the index exactly once, on completion or interrupt
//! - Collecting the run report

use crate::config::{Config, IndexMode};
use crate::crawler::{crawl, Frontier, PageFetcher};
use crate::output::{read_artifact_header, write_index, IndexEntry, RunReport, TaskReport};
use crate::pipeline::context::RunContext;
use crate::pipeline::materialize::materialize;
use crate::pipeline::scheduler::Scheduler;
use crate::pipeline::worker::execute_task;
use crate::state::{Task, TaskStatus};
use crate::transform::Transformer;
use crate::url::{normalize, title_from_relative_path, Scope, INDEX_FILE_NAME};
use crate::DistillError;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

/// Exit status of a run stopped by the user
pub const EXIT_INTERRUPTED: u8 = 130;

/// Everything a finished (or interrupted) run produced
#[derive(Debug)]
pub struct RunOutcome {
    pub report: RunReport,

    /// True if a stop was requested at any point during the run
    pub interrupted: bool,

    /// Set when the index could not be written
    pub finalize_error: Option<DistillError>,
}

impl RunOutcome {
    /// Process exit status: 130 when interrupted, 1 when finalizing failed, else 0
    pub fn exit_status(&self) -> u8 {
        if self.interrupted {
            EXIT_INTERRUPTED
        } else if self.finalize_error.is_some() {
            1
        } else {
            0
        }
    }
}

/// Main pipeline coordinator
pub struct Coordinator {
    config: Config,
    fetcher: Box<dyn PageFetcher>,
    transformer: Box<dyn Transformer>,
    shutdown: CancellationToken,
    force_stop: CancellationToken,
}

impl Coordinator {
    /// Creates a coordinator over an already-validated configuration
    pub fn new(
        config: Config,
        fetcher: Box<dyn PageFetcher>,
        transformer: Box<dyn Transformer>,
    ) -> Self {
        Self {
            config,
            fetcher,
            transformer,
            shutdown: CancellationToken::new(),
            force_stop: CancellationToken::new(),
        }
    }

    /// Uses externally owned tokens for graceful and forced stops
    ///
    /// Cancelling `shutdown` ends the crawl and closes admission while running
    /// tasks finish. Cancelling `force_stop` abandons running tasks as well.
    /// The index is finalized in both cases.
    pub fn with_cancellation(
        mut self,
        shutdown: CancellationToken,
        force_stop: CancellationToken,
    ) -> Self {
        self.shutdown = shutdown;
        self.force_stop = force_stop;
        self
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn force_stop_token(&self) -> CancellationToken {
        self.force_stop.clone()
    }

    /// Runs the pipeline
    ///
    /// # Returns
    ///
    /// * `Ok(RunOutcome)` - The run reached finalization, possibly interrupted
    /// * `Err(DistillError)` - Fatal error before any task ran (bad start URL,
    ///   empty crawl)
    pub async fn run(&self) -> Result<RunOutcome, DistillError> {
        let started_at = Utc::now();

        let start = normalize(&self.config.start_url, None)?;
        let scope = Scope::new(&start, &self.config.exclude);
        let ctx = RunContext::new(
            self.config.project_name(),
            self.config.project_dir(),
            self.config.chunking,
        );

        tracing::info!(
            "Crawling {} into {}",
            start,
            ctx.project_dir.display()
        );

        let frontier = Frontier::new(start.clone(), scope.clone(), self.config.crawl.max_pages);
        let crawled = crawl(self.fetcher.as_ref(), frontier, &self.shutdown).await;

        if crawled.is_empty() && !crawled.was_interrupted() {
            return Err(DistillError::EmptyCrawl {
                url: start.to_string(),
            });
        }
        let pages_crawled = crawled.len();

        let tasks = materialize(
            crawled.into_pages(),
            &scope,
            &ctx.project_dir,
            self.config.force,
        )?;

        let mut rows: Vec<TaskReport> = tasks
            .iter()
            .map(|task| TaskReport {
                url: task.url.to_string(),
                relative_path: task.relative_path.clone(),
                status: task.status(),
                error: None,
            })
            .collect();

        let mut pending = Vec::new();
        let mut skipped = Vec::new();
        for (position, task) in tasks.into_iter().enumerate() {
            if task.status() == TaskStatus::Skipped {
                ctx.record_skipped();
                skipped.push(task);
            } else {
                pending.push((position, task));
            }
        }

        tracing::info!(
            "{} tasks materialized: {} to process, {} skipped",
            rows.len(),
            pending.len(),
            skipped.len()
        );

        let scheduler = Scheduler::new(self.config.concurrency as usize);
        let (ctx_ref, transformer) = (&ctx, self.transformer.as_ref());
        let scheduled = scheduler.run(pending, &self.shutdown, move |(position, task)| async move {
            (position, execute_task(task, ctx_ref, transformer).await)
        });

        let forced = tokio::select! {
            outcome = scheduled => {
                tracing::debug!("Peak tasks in flight: {}", outcome.peak_in_flight);
                for (position, task) in outcome.completed {
                    rows[position].status = task.status();
                    rows[position].error = task.error_message().map(str::to_string);
                }
                if !outcome.unstarted.is_empty() {
                    tracing::warn!("{} tasks were not started", outcome.unstarted.len());
                }
                false
            }
            _ = self.force_stop.cancelled() => {
                tracing::warn!("Forced stop, abandoning tasks in flight");
                true
            }
        };

        let (index_entries_written, finalize_error) = match self.finalize(&ctx, &skipped).await {
            Ok(written) => (written, None),
            Err(e) => {
                tracing::error!("Failed to write index: {}", e);
                (0, Some(e))
            }
        };

        let counters = ctx.counters();
        tracing::info!(
            "Run finished: {} succeeded, {} failed, {} skipped",
            counters.succeeded,
            counters.failed,
            counters.skipped
        );

        let report = RunReport {
            project: ctx.project.clone(),
            started_at,
            finished_at: Utc::now(),
            pages_crawled,
            tasks: rows,
            index_entries_written,
        };

        Ok(RunOutcome {
            report,
            interrupted: forced || self.shutdown.is_cancelled(),
            finalize_error,
        })
    }

    /// Persists the index; only the first call per run writes anything
    ///
    /// Regenerate mode lists this run's successes plus the artifacts skipped at
    /// materialization. Pages the crawl never reached are not listed.
    async fn finalize(&self, ctx: &RunContext, skipped: &[Task]) -> Result<usize, DistillError> {
        if !ctx.begin_finalize() {
            tracing::debug!("Index already finalized");
            return Ok(0);
        }

        let index_path = ctx.project_dir.join(INDEX_FILE_NAME);
        let mode = self.config.index_mode;

        let entries = match mode {
            IndexMode::Incremental => ctx.entries(),
            IndexMode::Regenerate => {
                let mut entries: Vec<IndexEntry> =
                    ctx.entries().into_iter().filter(|e| !e.failed).collect();
                for task in skipped {
                    entries.push(existing_entry(ctx, task).await);
                }
                entries
            }
        };

        let written = write_index(&index_path, &ctx.project, &entries, mode).await?;
        tracing::info!(
            "Index {} updated ({:?}, {} entries)",
            index_path.display(),
            mode,
            written
        );

        Ok(written)
    }
}

/// Index entry for an artifact produced by an earlier run
async fn existing_entry(ctx: &RunContext, task: &Task) -> IndexEntry {
    let header = match read_artifact_header(&task.target_path).await {
        Ok(header) => header,
        Err(e) => {
            tracing::warn!("Could not read {}: {}", task.target_path.display(), e);
            Default::default()
        }
    };

    IndexEntry::artifact(
        header
            .title
            .unwrap_or_else(|| title_from_relative_path(&task.relative_path)),
        header.description.unwrap_or_default(),
        ctx.index_path_for(&task.relative_path),
    )
}
