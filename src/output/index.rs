//! Index file rendering and persistence
//!
//! The index lists every artifact of a project:
//!
//! ```text
//! # {project}
//!
//! ## {title}
//!
//! - path: {project}/{relative path}
//! - description: {description}
//! ```
//!
//! Blocks are separated by a blank line and sorted by path. Every write goes
//! to a temporary sibling file that is then renamed over the index, so a crash
//! mid-write leaves the previous index intact.

use crate::config::IndexMode;
use crate::output::artifact::single_line;
use crate::DistillError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// One index block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub title: String,
    pub description: String,

    /// Artifact path relative to the output root (`{project}/{relative}`)
    pub artifact_path: String,

    /// True for entries recording a failed task
    pub failed: bool,
}

impl IndexEntry {
    pub fn artifact(title: String, description: String, artifact_path: String) -> Self {
        Self {
            title,
            description,
            artifact_path,
            failed: false,
        }
    }

    pub fn failure(title: String, description: String, artifact_path: String) -> Self {
        Self {
            title,
            description,
            artifact_path,
            failed: true,
        }
    }

    /// Renders the entry as a Markdown block without trailing newline
    pub fn render(&self) -> String {
        format!(
            "## {}\n\n- path: {}\n- description: {}",
            single_line(&self.title),
            self.artifact_path,
            single_line(&self.description)
        )
    }
}

/// Renders entries sorted by path, blank-line separated
pub fn render_entries(entries: &[IndexEntry]) -> String {
    let mut sorted: Vec<&IndexEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.artifact_path.cmp(&b.artifact_path));

    sorted
        .iter()
        .map(|entry| entry.render())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Renders a complete index file
pub fn render_index(project: &str, entries: &[IndexEntry]) -> String {
    if entries.is_empty() {
        return format!("# {}\n", project);
    }
    format!("# {}\n\n{}\n", project, render_entries(entries))
}

/// Writes the index in the given mode and returns the number of entries written
///
/// * `Incremental` leaves existing content untouched and appends `entries`.
///   With nothing to append the file is not touched at all.
/// * `Regenerate` replaces the file with exactly `entries`.
pub async fn write_index(
    path: &Path,
    project: &str,
    entries: &[IndexEntry],
    mode: IndexMode,
) -> Result<usize, DistillError> {
    match mode {
        IndexMode::Incremental => append_index(path, project, entries).await,
        IndexMode::Regenerate => {
            write_atomic(path, &render_index(project, entries)).await?;
            Ok(entries.len())
        }
    }
}

async fn append_index(
    path: &Path,
    project: &str,
    entries: &[IndexEntry],
) -> Result<usize, DistillError> {
    if entries.is_empty() {
        tracing::debug!("No new index entries, leaving {} as is", path.display());
        return Ok(0);
    }

    let existing = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(source) => {
            return Err(DistillError::Write {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let contents = if existing.trim().is_empty() {
        render_index(project, entries)
    } else {
        let mut contents = existing;
        if !contents.ends_with('\n') {
            contents.push('\n');
        }
        contents.push('\n');
        contents.push_str(&render_entries(entries));
        contents.push('\n');
        contents
    };

    write_atomic(path, &contents).await?;
    Ok(entries.len())
}

/// Writes `contents` to a temporary sibling and renames it over `path`
async fn write_atomic(path: &Path, contents: &str) -> Result<(), DistillError> {
    let tmp = temp_path(path);
    let write_error = |source| DistillError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
    }
    tokio::fs::write(&tmp, contents).await.map_err(write_error)?;
    tokio::fs::rename(&tmp, path).await.map_err(write_error)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
