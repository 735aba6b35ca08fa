//! Column catalog: which issue field feeds each spreadsheet column, and what
//! to write when the field is absent.

use crate::config::SyncConfig;
use crate::model::CellValue;

pub const TASK_KEY: &str = "Task Key";
pub const SUMMARY: &str = "Summary";
pub const CATEGORY: &str = "Category";
pub const ASSIGNEE: &str = "Assignee";
pub const PRIORITY: &str = "Priority";
pub const TEAM: &str = "Team";
pub const LABELS: &str = "Labels";

/// How to pull a value out of a raw issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extract {
    /// The issue key itself.
    Key,
    /// A field used as-is. Objects project their display attribute.
    Scalar(String),
    /// Walk into an object field, e.g. `assignee.displayName`.
    Path {
        field: String,
        path: &'static [&'static str],
    },
    /// Rich text, either a plain string or an ADF document.
    RichText(String),
    /// Writes `text` when the field holds anything truthy.
    Flag { field: String, text: &'static str },
    /// A list joined with [`LIST_DELIMITER`]. `within` names the array inside an
    /// object field (`worklog.worklogs`); `select` walks each element, and an
    /// empty `select` means the elements are strings. Elements lacking the
    /// selected value are skipped.
    List {
        field: String,
        within: Option<&'static str>,
        select: &'static [&'static str],
    },
}

pub const LIST_DELIMITER: &str = ", ";

impl Extract {
    /// The remote field id this rule reads, if any.
    pub fn source_field(&self) -> Option<&str> {
        match self {
            Extract::Key => None,
            Extract::Scalar(field)
            | Extract::RichText(field)
            | Extract::Path { field, .. }
            | Extract::Flag { field, .. }
            | Extract::List { field, .. } => Some(field),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Number,
}

impl ColumnKind {
    /// The cell a column of this kind holds for `text`. Export and import both
    /// go through here, so a written cell reads back with the same type.
    pub fn cell(self, text: &str) -> CellValue {
        match self {
            ColumnKind::Number => CellValue::parse_numeric(text),
            ColumnKind::Text => CellValue::text(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub column: &'static str,
    pub rule: Extract,
    pub fallback: CellValue,
    pub kind: ColumnKind,
}

impl FieldSpec {
    fn new(column: &'static str, rule: Extract, fallback: &str) -> Self {
        Self {
            column,
            rule,
            fallback: CellValue::text(fallback),
            kind: ColumnKind::Text,
        }
    }

    fn numeric(mut self) -> Self {
        self.kind = ColumnKind::Number;
        self
    }
}

fn scalar(field: &str) -> Extract {
    Extract::Scalar(field.to_string())
}

fn path(field: &str, path: &'static [&'static str]) -> Extract {
    Extract::Path {
        field: field.to_string(),
        path,
    }
}

fn list(field: &str, select: &'static [&'static str]) -> Extract {
    Extract::List {
        field: field.to_string(),
        within: None,
        select,
    }
}

/// Ordered column specs. Column names are unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCatalog {
    specs: Vec<FieldSpec>,
}

impl FieldCatalog {
    pub fn from_config(sync: &SyncConfig) -> Self {
        Self::standard(&sync.category_field, &sync.team_field)
    }

    /// The full export layout. `category_field` and `team_field` are the
    /// site-specific custom field ids behind the Category and Team columns.
    pub fn standard(category_field: &str, team_field: &str) -> Self {
        let specs = vec![
            FieldSpec::new(TASK_KEY, Extract::Key, ""),
            FieldSpec::new(SUMMARY, scalar("summary"), ""),
            FieldSpec::new("Status", path("status", &["name"]), "No Status"),
            FieldSpec::new(CATEGORY, path(category_field, &["value"]), "No Category"),
            FieldSpec::new(ASSIGNEE, path("assignee", &["displayName"]), "Unassigned"),
            FieldSpec::new("Due Date", scalar("duedate"), ""),
            FieldSpec::new(PRIORITY, path("priority", &["name"]), "No Priority"),
            FieldSpec::new(LABELS, list("labels", &[]), "No Labels"),
            FieldSpec::new("Created", scalar("created"), ""),
            FieldSpec::new("Updated", scalar("updated"), ""),
            FieldSpec::new("Reporter", path("reporter", &["displayName"]), "No Reporter"),
            FieldSpec::new(TEAM, path(team_field, &["name"]), "No Team"),
            FieldSpec::new(
                "Status Category Changed",
                scalar("statuscategorychangedate"),
                "No Status Category Changed",
            ),
            FieldSpec::new("Parent", path("parent", &["key"]), "No Parent"),
            FieldSpec::new("Fix Versions", list("fixVersions", &["name"]), "No Fix Versions"),
            FieldSpec::new("Resolution", path("resolution", &["name"]), "Unresolved"),
            FieldSpec::new("DEV Completion", scalar("customfield_10112"), "No DEV Completion"),
            FieldSpec::new("QA Completion", scalar("customfield_10113"), "No QA Completion"),
            FieldSpec::new(
                "Demo Deployment",
                scalar("customfield_10114"),
                "No Demo Deployment",
            ),
            FieldSpec::new(
                "Remaining Estimate",
                scalar("timeestimate"),
                "No Remaining Estimate",
            )
            .numeric(),
            FieldSpec::new(
                "Σ Original Estimate",
                scalar("aggregatetimeoriginalestimate"),
                "No Σ Original Estimate",
            )
            .numeric(),
            FieldSpec::new(
                "Affects Versions",
                list("versions", &["name"]),
                "No Affects Versions",
            ),
            FieldSpec::new(
                "Linked Issues",
                list("issuelinks", &["outwardIssue", "key"]),
                "No Linked Issues",
            ),
            FieldSpec::new("Creator", path("creator", &["displayName"]), "No Creator"),
            FieldSpec::new("Sub-tasks", list("subtasks", &["key"]), "No Sub-tasks"),
            FieldSpec::new("Progress", path("progress", &["progress"]), "No Progress").numeric(),
            FieldSpec::new("Votes", path("votes", &["votes"]), "No Votes").numeric(),
            FieldSpec::new(
                "Log Work",
                Extract::List {
                    field: "worklog".to_string(),
                    within: Some("worklogs"),
                    select: &["timeSpent"],
                },
                "No Work Log",
            ),
            FieldSpec::new("Time Spent", scalar("timespent"), "No Time Spent").numeric(),
            FieldSpec::new("Resolved", scalar("resolutiondate"), "Not Resolved"),
            FieldSpec::new("Work Ratio", scalar("workratio"), "No Work Ratio").numeric(),
            FieldSpec::new("Watchers", path("watches", &["watchCount"]), "No Watchers").numeric(),
            FieldSpec::new("Images", path("thumbnail", &["name"]), "No Images"),
            FieldSpec::new("Sprint", list("customfield_10020", &["name"]), "No Sprint"),
            FieldSpec::new(
                "Flagged",
                Extract::Flag {
                    field: "customfield_10021".to_string(),
                    text: "Yes",
                },
                "No Flag",
            ),
            FieldSpec::new(
                "Original Estimate",
                scalar("timeoriginalestimate"),
                "No Original Estimate",
            )
            .numeric(),
            FieldSpec::new(
                "Description",
                Extract::RichText("description".to_string()),
                "No Description",
            ),
            FieldSpec::new("Epic Link", scalar("customfield_10014"), "No Epic Link"),
            FieldSpec::new(
                "Time Tracking",
                path("timetracking", &["originalEstimate"]),
                "No Time Tracking",
            ),
            FieldSpec::new(
                "Environment",
                Extract::RichText("environment".to_string()),
                "No Environment",
            ),
            FieldSpec::new("Due date", scalar("duedate"), "No Due date"),
        ];
        Self { specs }
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.specs.iter().map(|s| s.column)
    }

    pub fn spec(&self, column: &str) -> Option<&FieldSpec> {
        self.specs.iter().find(|s| s.column == column)
    }

    pub fn kind(&self, column: &str) -> ColumnKind {
        self.spec(column).map_or(ColumnKind::Text, |s| s.kind)
    }

    /// True when `value` is the placeholder this catalog writes for an absent field.
    pub fn is_fallback(&self, column: &str, value: &str) -> bool {
        self.spec(column)
            .and_then(|s| s.fallback.as_str())
            .is_some_and(|f| !f.is_empty() && f == value)
    }

    /// Field ids to request from search, in catalog order without repeats.
    pub fn source_fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = Vec::new();
        for field in self.specs.iter().filter_map(|s| s.rule.source_field()) {
            if !fields.iter().any(|f| f == field) {
                fields.push(field.to_string());
            }
        }
        fields
    }
}
