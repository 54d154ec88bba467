//! Output module for artifacts, the index and the run summary
//!
//! This module handles:
//! - Rendering and writing per-page artifacts (and `.error` files)
//! - Rendering and persisting the project index
//! - Printing the end-of-run summary

mod artifact;
mod index;
pub mod summary;

pub use artifact::{
    read_artifact_header, remove_stale_error_file, render_artifact, write_artifact,
    write_error_file, ArtifactHeader,
};
pub use index::{render_entries, render_index, write_index, IndexEntry};
pub use summary::{
    format_summary, print_summary, truncate_message, RunReport, TaskReport,
    DISPLAY_MESSAGE_LIMIT,
};
