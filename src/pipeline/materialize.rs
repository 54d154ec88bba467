//! Task materialization
//!
//! Turns the crawl result into the ordered task list. A page whose artifact
//! already exists is skipped unless regeneration is forced; this is the only
//! state carried between runs.

use crate::crawler::CrawledPage;
use crate::state::Task;
use crate::url::{disambiguate, relative_path_for, Scope};
use crate::DistillError;
use std::collections::HashSet;
use std::path::Path;

/// Creates one task per in-scope crawled page, in crawl order
///
/// Relative paths are unique within the returned list: when two URLs derive
/// the same path, the first keeps it and later ones get a URL hash suffix.
pub fn materialize(
    pages: Vec<CrawledPage>,
    scope: &Scope,
    project_dir: &Path,
    force: bool,
) -> Result<Vec<Task>, DistillError> {
    let mut used_paths = HashSet::new();
    let mut tasks = Vec::with_capacity(pages.len());

    for page in pages {
        if !scope.in_scope(&page.url) {
            tracing::debug!("Not materializing out-of-scope {}", page.url);
            continue;
        }

        let mut relative_path = relative_path_for(&page.url, scope.start_segments());
        if used_paths.contains(&relative_path) {
            let unique = disambiguate(&relative_path, page.url.as_str());
            tracing::warn!(
                "{} collides with another page at {}, using {}",
                page.url,
                relative_path,
                unique
            );
            relative_path = unique;
        }
        used_paths.insert(relative_path.clone());

        let target_path = project_dir.join(&relative_path);
        let exists = target_path.exists();
        let mut task = Task::new(page.url, page.content, target_path, relative_path)
            .with_fetch_error(page.failure);

        if exists && !force {
            task.skip()?;
            tracing::debug!("Skipping {}, artifact exists", task.relative_path);
        }

        tasks.push(task);
    }

    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{FetchError, FetchErrorKind};
    use crate::state::TaskStatus;
    use tempfile::TempDir;
    use url::Url;

    fn page(url: &str, content: Option<&str>) -> CrawledPage {
        CrawledPage {
            url: Url::parse(url).unwrap(),
            content: content.map(str::to_string),
            failure: None,
        }
    }

    fn docs_scope() -> Scope {
        Scope::new(&Url::parse("https://example.com/docs").unwrap(), &[])
    }

    #[test]
    fn test_one_task_per_page_in_order() {
        let dir = TempDir::new().unwrap();
        let pages = vec![
            page("https://example.com/docs", Some("root")),
            page("https://example.com/docs/guide", Some("guide")),
            page("https://example.com/docs/api/auth", None),
        ];

        let tasks = materialize(pages, &docs_scope(), dir.path(), false).unwrap();

        let paths: Vec<&str> = tasks.iter().map(|t| t.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["_root.md", "guide.md", "api-auth.md"]);
        assert!(tasks.iter().all(|t| t.status() == TaskStatus::Pending));
        assert_eq!(tasks[1].target_path, dir.path().join("guide.md"));
        assert!(tasks[2].raw_content.is_none());
    }

    #[test]
    fn test_fetch_failure_is_carried_into_task() {
        let dir = TempDir::new().unwrap();
        let mut broken = page("https://example.com/docs/slow", None);
        broken.failure = Some(FetchError::new(
            FetchErrorKind::Timeout,
            "https://example.com/docs/slow",
            "navigation timed out after 30s",
        ));

        let tasks = materialize(vec![broken], &docs_scope(), dir.path(), false).unwrap();

        let error = tasks[0].fetch_error.as_ref().unwrap();
        assert_eq!(error.kind, FetchErrorKind::Timeout);
        assert_eq!(error.message, "navigation timed out after 30s");
    }

    #[test]
    fn test_existing_artifact_is_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("guide.md"), "# Guide\n").unwrap();

        let pages = vec![
            page("https://example.com/docs/guide", Some("guide")),
            page("https://example.com/docs/other", Some("other")),
        ];
        let tasks = materialize(pages, &docs_scope(), dir.path(), false).unwrap();

        assert_eq!(tasks[0].status(), TaskStatus::Skipped);
        assert_eq!(tasks[1].status(), TaskStatus::Pending);
    }

    #[test]
    fn test_force_ignores_existing_artifacts() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("guide.md"), "# Guide\n").unwrap();

        let pages = vec![page("https://example.com/docs/guide", Some("guide"))];
        let tasks = materialize(pages, &docs_scope(), dir.path(), true).unwrap();

        assert_eq!(tasks[0].status(), TaskStatus::Pending);
    }

    #[test]
    fn test_colliding_paths_are_disambiguated() {
        let dir = TempDir::new().unwrap();
        let pages = vec![
            page("https://example.com/docs/Guide", Some("one")),
            page("https://example.com/docs/guide", Some("two")),
        ];

        let tasks = materialize(pages, &docs_scope(), dir.path(), false).unwrap();

        assert_eq!(tasks[0].relative_path, "guide.md");
        assert_eq!(
            tasks[1].relative_path,
            disambiguate("guide.md", "https://example.com/docs/guide")
        );
    }

    #[test]
    fn test_out_of_scope_pages_dropped() {
        let dir = TempDir::new().unwrap();
        let pages = vec![
            page("https://example.com/docs/guide", Some("in")),
            page("https://example.com/blog/post", Some("out")),
        ];

        let tasks = materialize(pages, &docs_scope(), dir.path(), false).unwrap();
        assert_eq!(tasks.len(), 1);
    }
}
