//! Artifact files
//!
//! One Markdown file per successfully processed page:
//!
//! ```text
//! # {title}
//!
//! > {description}
//!
//! {body}
//! ```
//!
//! Failed pages get a sibling `.error` file holding the full error instead.

use crate::transform::TransformedDocument;
use crate::DistillError;
use std::io::ErrorKind;
use std::path::Path;

/// Title and description read back from an existing artifact
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactHeader {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Renders a transformed document as artifact text
pub fn render_artifact(doc: &TransformedDocument) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", single_line(&doc.title)));
    if !doc.description.is_empty() {
        out.push_str(&format!("> {}\n\n", single_line(&doc.description)));
    }
    out.push_str(doc.body.trim_end());
    out.push('\n');
    out
}

/// Writes an artifact, creating parent directories and replacing any existing file
pub async fn write_artifact(path: &Path, contents: &str) -> Result<(), DistillError> {
    let write_error = |source| DistillError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
    }
    tokio::fs::write(path, contents).await.map_err(write_error)
}

/// Writes the full error of a failed task; failures are logged, not returned
pub async fn write_error_file(path: &Path, message: &str) {
    if let Some(parent) = path.parent() {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            tracing::warn!("Could not create {}: {}", parent.display(), e);
            return;
        }
    }
    if let Err(e) = tokio::fs::write(path, format!("{}\n", message)).await {
        tracing::warn!("Could not write error file {}: {}", path.display(), e);
    }
}

/// Removes an error file left over from an earlier failed run
pub async fn remove_stale_error_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!("Removed stale {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Could not remove {}: {}", path.display(), e),
    }
}

/// Reads the `# title` and `> description` lines at the top of an artifact
pub async fn read_artifact_header(path: &Path) -> std::io::Result<ArtifactHeader> {
    let contents = tokio::fs::read_to_string(path).await?;
    Ok(parse_header(&contents))
}

fn parse_header(contents: &str) -> ArtifactHeader {
    let mut header = ArtifactHeader::default();
    let mut lines = contents.lines().map(str::trim).filter(|l| !l.is_empty());

    if let Some(title) = lines.next().and_then(|l| l.strip_prefix("# ")) {
        header.title = Some(title.trim().to_string()).filter(|t| !t.is_empty());

        if let Some(description) = lines.next().and_then(|l| l.strip_prefix("> ")) {
            header.description = Some(description.trim().to_string());
        }
    }

    header
}

/// Collapses line breaks so a value fits on one Markdown line
pub(crate) fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
