//! Push edited rows back to the tracker, one row at a time.
//!
//! Each row goes validate → resolve assignee → build payload → update. A row
//! that fails at any step is recorded and the batch moves on.

use std::fmt;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};

use crate::catalog::{FieldCatalog, ASSIGNEE, CATEGORY, PRIORITY, SUMMARY, TASK_KEY, TEAM};
use crate::description;
use crate::identity::IdentityResolver;
use crate::model::{AccountRef, Identity, NamedRef, RowRecord, UpdatePayload};
use crate::providers::Tracker;

/// Columns a row must fill before anything is sent.
pub const REQUIRED_COLUMNS: [&str; 6] = [TASK_KEY, PRIORITY, SUMMARY, ASSIGNEE, CATEGORY, TEAM];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Updated,
    SkippedMissingFields(Vec<String>),
    SkippedUnresolvedAssignee { assignee: String, reason: String },
    Failed(String),
}

impl Outcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Updated => "updated",
            Outcome::SkippedMissingFields(_) => "skipped_missing_fields",
            Outcome::SkippedUnresolvedAssignee { .. } => "skipped_unresolved_assignee",
            Outcome::Failed(_) => "failed",
        }
    }

    pub fn detail(&self) -> Option<String> {
        match self {
            Outcome::Updated => None,
            Outcome::SkippedMissingFields(columns) => Some(format!("missing {}", columns.join(", "))),
            Outcome::SkippedUnresolvedAssignee { reason, .. } => Some(reason.clone()),
            Outcome::Failed(reason) => Some(reason.clone()),
        }
    }
}

/// The outcome of one spreadsheet row. `row` counts data rows from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowReport {
    pub row: usize,
    pub key: Option<String>,
    pub outcome: Outcome,
}

#[derive(Debug, Clone)]
pub struct BatchResult {
    pub reports: Vec<RowReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchCounts {
    pub updated: usize,
    pub skipped_missing: usize,
    pub skipped_unresolved: usize,
    pub failed: usize,
}

impl BatchResult {
    pub fn counts(&self) -> BatchCounts {
        let mut counts = BatchCounts::default();
        for report in &self.reports {
            match report.outcome {
                Outcome::Updated => counts.updated += 1,
                Outcome::SkippedMissingFields(_) => counts.skipped_missing += 1,
                Outcome::SkippedUnresolvedAssignee { .. } => counts.skipped_unresolved += 1,
                Outcome::Failed(_) => counts.failed += 1,
            }
        }
        counts
    }
}

impl fmt::Display for BatchCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} updated, {} skipped (missing fields), {} skipped (unknown assignee), {} failed",
            self.updated, self.skipped_missing, self.skipped_unresolved, self.failed
        )
    }
}

/// A row that passed validation, values trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRow {
    pub key: String,
    pub priority: String,
    pub summary: String,
    pub assignee: String,
    pub category: String,
    pub team: String,
}

pub struct Reconciler<'a> {
    tracker: &'a dyn Tracker,
    catalog: &'a FieldCatalog,
    concurrency: usize,
}

impl<'a> Reconciler<'a> {
    pub fn new(tracker: &'a dyn Tracker, catalog: &'a FieldCatalog) -> Self {
        Self {
            tracker,
            catalog,
            concurrency: 1,
        }
    }

    /// Rows in flight at once. Reports keep input order either way.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn reconcile(&self, rows: &[RowRecord]) -> BatchResult {
        let started_at = Utc::now();
        let reports = stream::iter(rows.iter().enumerate())
            .map(|(i, row)| self.reconcile_row(i + 1, row))
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await;
        BatchResult {
            reports,
            started_at,
            finished_at: Utc::now(),
        }
    }

    async fn reconcile_row(&self, row_no: usize, row: &RowRecord) -> RowReport {
        let key = row.text(TASK_KEY);
        let outcome = self.push_row(row).await;
        let label = key.as_deref().unwrap_or("<no key>");
        match &outcome {
            Outcome::Updated => tracing::info!(key = label, row = row_no, "issue updated"),
            Outcome::Failed(reason) => {
                tracing::error!(key = label, row = row_no, %reason, "update failed")
            }
            skipped => tracing::warn!(
                key = label,
                row = row_no,
                outcome = skipped.kind(),
                detail = %skipped.detail().unwrap_or_default(),
                "row skipped"
            ),
        }
        RowReport {
            row: row_no,
            key,
            outcome,
        }
    }

    async fn push_row(&self, row: &RowRecord) -> Outcome {
        let valid = match self.validate(row) {
            Ok(valid) => valid,
            Err(missing) => return Outcome::SkippedMissingFields(missing),
        };

        let identity = match IdentityResolver::new(self.tracker).resolve(&valid.assignee).await {
            Ok(identity) => identity,
            Err(err) => {
                return Outcome::SkippedUnresolvedAssignee {
                    assignee: valid.assignee,
                    reason: err.to_string(),
                }
            }
        };

        tracing::debug!(
            key = %valid.key,
            assignee = %identity.display_name,
            account = %identity.account_id,
            "assignee resolved"
        );
        let payload = build_payload(&valid, &identity);
        tracing::debug!(key = %valid.key, payload = %payload.to_body(), "pushing update");
        match self.tracker.update_issue(&valid.key, &payload).await {
            Ok(()) => Outcome::Updated,
            Err(err) => Outcome::Failed(err.to_string()),
        }
    }

    /// Checks the required columns. A cell holding the column's placeholder
    /// (`Unassigned`, `No Priority`, ...) counts as empty.
    pub fn validate(&self, row: &RowRecord) -> Result<ValidRow, Vec<String>> {
        let mut missing = Vec::new();
        let mut value = |column: &str| -> String {
            match row.text(column) {
                Some(text) if !self.catalog.is_fallback(column, &text) => text,
                _ => {
                    missing.push(column.to_string());
                    String::new()
                }
            }
        };
        let valid = ValidRow {
            key: value(TASK_KEY),
            priority: value(PRIORITY),
            summary: value(SUMMARY),
            assignee: value(ASSIGNEE),
            category: value(CATEGORY),
            team: value(TEAM),
        };
        if missing.is_empty() {
            Ok(valid)
        } else {
            Err(missing)
        }
    }
}

/// The partial update for one row: summary, priority, assignee and a freshly
/// rendered description. Nothing else on the issue is touched.
pub fn build_payload(row: &ValidRow, identity: &Identity) -> UpdatePayload {
    UpdatePayload {
        summary: sanitize(&row.summary),
        priority: sanitize(&row.priority).map(|name| NamedRef { name }),
        assignee: Some(AccountRef {
            account_id: identity.account_id.clone(),
        }),
        description: Some(description::render(&row.summary, &row.category, &row.team)),
    }
}

fn sanitize(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_CATEGORY_FIELD, DEFAULT_TEAM_FIELD};
    use crate::providers::tests::{Call, MockTracker};

    impl BatchResult {
        pub fn outcome_for(&self, key: &str) -> Option<&Outcome> {
            self.reports
                .iter()
                .find(|r| r.key.as_deref() == Some(key))
                .map(|r| &r.outcome)
        }
    }

    fn catalog() -> FieldCatalog {
        FieldCatalog::standard(DEFAULT_CATEGORY_FIELD, DEFAULT_TEAM_FIELD)
    }

    fn row(key: &str, assignee: &str, category: &str) -> RowRecord {
        [
            (TASK_KEY, key),
            (PRIORITY, "High"),
            (SUMMARY, "Fix bug"),
            (ASSIGNEE, assignee),
            (CATEGORY, category),
            (TEAM, "Core"),
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn end_to_end_row_is_updated() {
        let tracker = MockTracker::new().with_user("Jane Doe", "abc123");
        let catalog = catalog();
        let result = Reconciler::new(&tracker, &catalog)
            .reconcile(&[row("DEVOPS-1", "Jane Doe", "Bug")])
            .await;

        assert_eq!(result.outcome_for("DEVOPS-1"), Some(&Outcome::Updated));
        let updates = tracker.updates();
        assert_eq!(updates.len(), 1);
        let (key, payload) = &updates[0];
        assert_eq!(key, "DEVOPS-1");
        assert_eq!(payload.summary.as_deref(), Some("Fix bug"));
        assert_eq!(payload.priority, Some(NamedRef { name: "High".into() }));
        assert_eq!(
            payload.assignee,
            Some(AccountRef {
                account_id: "abc123".into()
            })
        );
        let description = payload.description.as_deref().unwrap();
        for part in ["Fix bug", "Bug", "Core"] {
            assert!(description.contains(part));
        }
    }

    #[tokio::test]
    async fn missing_fields_make_no_remote_calls() {
        let tracker = MockTracker::new().with_user("Jane Doe", "abc123");
        let catalog = catalog();
        let mut incomplete = row("DEVOPS-2", "Jane Doe", "Bug");
        incomplete.insert(TEAM, "   ".into());
        let mut no_summary = row("DEVOPS-3", "Jane Doe", "Bug");
        no_summary.insert(SUMMARY, "".into());

        let result = Reconciler::new(&tracker, &catalog)
            .reconcile(&[incomplete, no_summary])
            .await;

        assert_eq!(
            result.outcome_for("DEVOPS-2"),
            Some(&Outcome::SkippedMissingFields(vec![TEAM.to_string()]))
        );
        assert_eq!(
            result.outcome_for("DEVOPS-3"),
            Some(&Outcome::SkippedMissingFields(vec![SUMMARY.to_string()]))
        );
        assert!(tracker.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_category_alone_blocks_the_row() {
        let tracker = MockTracker::new().with_user("Jane Doe", "abc123");
        let catalog = catalog();
        let rows = [
            row("DEVOPS-5", "Jane Doe", ""),
            row("DEVOPS-6", "Jane Doe", "No Category"),
        ];

        let result = Reconciler::new(&tracker, &catalog).reconcile(&rows).await;

        for key in ["DEVOPS-5", "DEVOPS-6"] {
            assert_eq!(
                result.outcome_for(key),
                Some(&Outcome::SkippedMissingFields(vec![CATEGORY.to_string()]))
            );
        }
        assert!(tracker.calls().is_empty());
    }

    #[tokio::test]
    async fn placeholder_values_count_as_missing() {
        let tracker = MockTracker::new();
        let catalog = catalog();
        let mut placeholder = row("DEVOPS-4", "Unassigned", "Bug");
        placeholder.insert(PRIORITY, "No Priority".into());

        let result = Reconciler::new(&tracker, &catalog)
            .reconcile(&[placeholder])
            .await;

        assert_eq!(
            result.reports[0].outcome,
            Outcome::SkippedMissingFields(vec![PRIORITY.to_string(), ASSIGNEE.to_string()])
        );
        assert!(tracker.calls().is_empty());
    }

    #[tokio::test]
    async fn row_without_key_is_still_reported() {
        let tracker = MockTracker::new();
        let catalog = catalog();
        let result = Reconciler::new(&tracker, &catalog)
            .reconcile(&[row("", "Jane Doe", "Bug")])
            .await;

        assert_eq!(result.reports[0].row, 1);
        assert_eq!(result.reports[0].key, None);
        assert!(matches!(
            result.reports[0].outcome,
            Outcome::SkippedMissingFields(_)
        ));
    }

    #[tokio::test]
    async fn unresolved_assignee_is_isolated() {
        let tracker = MockTracker::new().with_user("Jane Doe", "abc123");
        let catalog = catalog();
        let rows = [
            row("DEVOPS-1", "Jane Doe", "Bug"),
            row("DEVOPS-2", "Nobody Known", "Bug"),
            row("DEVOPS-3", "Jane Doe", "Task"),
        ];

        let result = Reconciler::new(&tracker, &catalog).reconcile(&rows).await;

        assert_eq!(result.outcome_for("DEVOPS-1"), Some(&Outcome::Updated));
        assert!(matches!(
            result.outcome_for("DEVOPS-2"),
            Some(Outcome::SkippedUnresolvedAssignee { assignee, .. }) if assignee == "Nobody Known"
        ));
        assert_eq!(result.outcome_for("DEVOPS-3"), Some(&Outcome::Updated));
        assert!(!tracker.calls().contains(&Call::Update("DEVOPS-2".into())));
    }

    #[tokio::test]
    async fn lookup_failure_skips_only_that_row() {
        let tracker = MockTracker::new()
            .with_user("Jane Doe", "abc123")
            .with_failing_lookup("Max Power");
        let catalog = catalog();
        let rows = [
            row("DEVOPS-1", "Max Power", "Bug"),
            row("DEVOPS-2", "Jane Doe", "Bug"),
        ];

        let result = Reconciler::new(&tracker, &catalog).reconcile(&rows).await;

        match result.outcome_for("DEVOPS-1") {
            Some(Outcome::SkippedUnresolvedAssignee { reason, .. }) => {
                assert!(reason.contains("500"))
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(result.outcome_for("DEVOPS-2"), Some(&Outcome::Updated));
    }

    #[tokio::test]
    async fn failed_update_does_not_stop_the_batch() {
        let tracker = MockTracker::new()
            .with_user("Jane Doe", "abc123")
            .with_failing_update("DEVOPS-1", 400, r#"{"errors":{"priority":"invalid"}}"#);
        let catalog = catalog();
        let rows = [
            row("DEVOPS-1", "Jane Doe", "Bug"),
            row("DEVOPS-2", "Jane Doe", "Bug"),
        ];

        let result = Reconciler::new(&tracker, &catalog).reconcile(&rows).await;

        match result.outcome_for("DEVOPS-1") {
            Some(Outcome::Failed(reason)) => {
                assert!(reason.contains("400"));
                assert!(reason.contains("priority"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(result.outcome_for("DEVOPS-2"), Some(&Outcome::Updated));
        assert_eq!(
            result.counts(),
            BatchCounts {
                updated: 1,
                failed: 1,
                ..Default::default()
            }
        );
    }

    #[tokio::test]
    async fn description_is_replaced_each_push() {
        let tracker = MockTracker::new().with_user("Jane Doe", "abc123");
        let catalog = catalog();
        let reconciler = Reconciler::new(&tracker, &catalog);

        reconciler
            .reconcile(&[row("DEVOPS-1", "Jane Doe", "Bug")])
            .await;
        reconciler
            .reconcile(&[row("DEVOPS-1", "Jane Doe", "Improvement")])
            .await;

        let updates = tracker.updates();
        let second = updates[1].1.description.as_deref().unwrap();
        assert!(second.contains("Improvement"));
        assert!(!second.contains("| Bug |"));
        assert_eq!(
            second,
            description::render("Fix bug", "Improvement", "Core")
        );
    }

    #[tokio::test]
    async fn concurrent_batch_keeps_input_order() {
        let tracker = MockTracker::new().with_user("Jane Doe", "abc123");
        let catalog = catalog();
        let rows: Vec<RowRecord> = (1..=8)
            .map(|i| row(&format!("DEVOPS-{i}"), "Jane Doe", "Bug"))
            .collect();

        let result = Reconciler::new(&tracker, &catalog)
            .with_concurrency(4)
            .reconcile(&rows)
            .await;

        let keys: Vec<_> = result.reports.iter().map(|r| r.key.clone().unwrap()).collect();
        let expected: Vec<_> = (1..=8).map(|i| format!("DEVOPS-{i}")).collect();
        assert_eq!(keys, expected);
        assert_eq!(result.counts().updated, 8);
    }

    #[test]
    fn payload_trims_summary_and_priority() {
        let valid = ValidRow {
            key: "DEVOPS-1".into(),
            priority: " High ".into(),
            summary: "  Fix bug ".into(),
            assignee: "Jane Doe".into(),
            category: "Bug".into(),
            team: "Core".into(),
        };
        let identity = Identity {
            display_name: "Jane Doe".into(),
            account_id: "abc123".into(),
        };
        let payload = build_payload(&valid, &identity);
        assert_eq!(payload.summary.as_deref(), Some("Fix bug"));
        assert_eq!(payload.priority.unwrap().name, "High");
    }

    #[test]
    fn sanitize_drops_blank_text() {
        assert_eq!(sanitize("   "), None);
        assert_eq!(sanitize(" x "), Some("x".to_string()));
    }
}
