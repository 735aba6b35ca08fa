//! The two run modes: pull issues into the sheet, push sheet edits back.

use std::path::Path;

use anyhow::{Context, Result};

use crate::catalog::FieldCatalog;
use crate::normalize::normalize_all;
use crate::providers::{SearchQuery, Tracker};
use crate::reconcile::{BatchResult, Reconciler};
use crate::sheet;

/// Fetch every issue matching `jql` and write the sheet. Any failure aborts
/// before the file is touched.
pub async fn pull(
    tracker: &dyn Tracker,
    catalog: &FieldCatalog,
    jql: &str,
    path: &Path,
) -> Result<usize> {
    let query = SearchQuery {
        jql: jql.to_string(),
        fields: catalog.source_fields(),
    };
    tracing::info!(tracker = tracker.name(), %jql, fields = query.fields.len(), "fetching issues");
    let issues = tracker
        .search(&query)
        .await
        .with_context(|| format!("Failed to retrieve issues from {}", tracker.name()))?;
    tracing::info!(count = issues.len(), "issues retrieved");

    let rows = normalize_all(&issues, catalog);
    sheet::export(path, catalog, &rows)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), rows = rows.len(), "sheet written");
    Ok(rows.len())
}

/// Read the sheet and push each row. Only an unreadable sheet is an error;
/// row failures land in the returned batch.
pub async fn push(
    tracker: &dyn Tracker,
    catalog: &FieldCatalog,
    path: &Path,
    concurrency: usize,
) -> Result<BatchResult> {
    tracing::info!(path = %path.display(), "reading sheet");
    let rows = sheet::import(path, catalog)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    tracing::info!(rows = rows.len(), concurrency, "pushing rows");

    let result = Reconciler::new(tracker, catalog)
        .with_concurrency(concurrency)
        .reconcile(&rows)
        .await;
    let elapsed = result.finished_at - result.started_at;
    tracing::info!(
        elapsed_ms = elapsed.num_milliseconds(),
        "push finished: {}",
        result.counts()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ASSIGNEE, CATEGORY, PRIORITY, SUMMARY, TASK_KEY, TEAM};
    use crate::config::{DEFAULT_CATEGORY_FIELD, DEFAULT_TEAM_FIELD};
    use crate::model::RawRecord;
    use crate::providers::tests::{Call, MockTracker};
    use crate::reconcile::Outcome;
    use serde_json::json;

    fn catalog() -> FieldCatalog {
        FieldCatalog::standard(DEFAULT_CATEGORY_FIELD, DEFAULT_TEAM_FIELD)
    }

    fn issues() -> Vec<RawRecord> {
        serde_json::from_value(json!([
            {
                "key": "DEVOPS-1",
                "fields": {
                    "summary": "Fix bug",
                    "priority": { "name": "High" },
                    "assignee": { "displayName": "Jane Doe" },
                    "customfield_10035": { "value": "Bug" },
                    "customfield_10001": { "name": "Core" }
                }
            },
            {
                "key": "DEVOPS-2",
                "fields": { "summary": "Unowned chore", "priority": { "name": "Low" } }
            }
        ]))
        .unwrap()
    }

    #[tokio::test]
    async fn pull_writes_one_row_per_issue() {
        let tracker = MockTracker::new().with_issues(issues());
        let catalog = catalog();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jira_tasks.csv");

        let count = pull(&tracker, &catalog, "project = DEVOPS", &path).await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(tracker.calls(), vec![Call::Search("project = DEVOPS".into())]);
        let rows = sheet::import(&path, &catalog).unwrap();
        assert_eq!(rows[0].text(TASK_KEY).as_deref(), Some("DEVOPS-1"));
        assert_eq!(rows[1].text(ASSIGNEE).as_deref(), Some("Unassigned"));
    }

    #[tokio::test]
    async fn failed_pull_leaves_existing_file_alone() {
        let tracker = MockTracker::new().with_search_failure(401, "Unauthorized");
        let catalog = catalog();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jira_tasks.csv");
        std::fs::write(&path, "previous export").unwrap();

        let err = pull(&tracker, &catalog, "project = DEVOPS", &path)
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("Unauthorized"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous export");
    }

    #[tokio::test]
    async fn pull_then_push_round_trip() {
        let tracker = MockTracker::new()
            .with_issues(issues())
            .with_user("Jane Doe", "abc123");
        let catalog = catalog();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jira_tasks.csv");

        pull(&tracker, &catalog, "project = DEVOPS", &path).await.unwrap();
        let result = push(&tracker, &catalog, &path, 1).await.unwrap();

        assert_eq!(result.outcome_for("DEVOPS-1"), Some(&Outcome::Updated));
        assert_eq!(
            result.outcome_for("DEVOPS-2"),
            Some(&Outcome::SkippedMissingFields(vec![
                ASSIGNEE.to_string(),
                CATEGORY.to_string(),
                TEAM.to_string()
            ]))
        );
        assert_eq!(tracker.updates().len(), 1);
    }

    #[tokio::test]
    async fn edited_sheet_is_pushed() {
        let tracker = MockTracker::new().with_user("Jane Doe", "abc123");
        let catalog = catalog();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edited.csv");
        std::fs::write(
            &path,
            format!(
                "{TASK_KEY},{PRIORITY},{SUMMARY},{ASSIGNEE},{CATEGORY},{TEAM}\n\
                 DEVOPS-1,High,  Fix bug  ,Jane Doe,Bug,Core\n"
            ),
        )
        .unwrap();

        let result = push(&tracker, &catalog, &path, 2).await.unwrap();

        assert_eq!(result.counts().updated, 1);
        let (_, payload) = &tracker.updates()[0];
        assert_eq!(payload.summary.as_deref(), Some("Fix bug"));
    }

    #[tokio::test]
    async fn malformed_sheet_stops_before_any_remote_call() {
        let tracker = MockTracker::new().with_user("Jane Doe", "abc123");
        let catalog = catalog();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        std::fs::write(&path, "Task Key,Summary\nDEVOPS-1,Fix bug\n").unwrap();

        let err = push(&tracker, &catalog, &path, 1).await.unwrap_err();

        assert!(format!("{err:#}").contains("Priority"));
        assert!(tracker.calls().is_empty());
    }
}
