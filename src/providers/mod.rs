pub mod jira;

use async_trait::async_trait;

use crate::error::TrackerError;
use crate::model::{Account, RawRecord, UpdatePayload};

/// What to pull: a filter expression plus the field ids to include.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub jql: String,
    pub fields: Vec<String>,
}

/// The remote issue tracker as seen by the sync engine.
#[async_trait]
pub trait Tracker: Send + Sync {
    fn name(&self) -> &str;

    /// Every issue matching the query. Fails as a whole, never partially.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawRecord>, TrackerError>;

    /// Accounts matching a free-text query, in the tracker's own ranking.
    async fn find_users(&self, query: &str) -> Result<Vec<Account>, TrackerError>;

    /// Partial update of one issue.
    async fn update_issue(&self, key: &str, payload: &UpdatePayload) -> Result<(), TrackerError>;
}
