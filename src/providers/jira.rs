use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{SearchQuery, Tracker};
use crate::config::JiraConfig;
use crate::error::TrackerError;
use crate::model::{Account, RawRecord, UpdatePayload};

pub struct JiraTracker {
    base_url: String,
    auth_header: String,
    page_size: u32,
    client: reqwest::Client,
}

impl JiraTracker {
    pub fn new(config: &JiraConfig, page_size: u32) -> anyhow::Result<Self> {
        let creds = format!("{}:{}", config.email, config.api_token);
        let encoded = base64::engine::general_purpose::STANDARD.encode(creds);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            base_url: config.base_url()?,
            auth_header: format!("Basic {encoded}"),
            page_size: page_size.max(1),
            client,
        })
    }

    fn search_url(&self) -> String {
        format!("{}/rest/api/2/search", self.base_url)
    }

    fn user_search_url(&self, query: &str) -> String {
        format!(
            "{}/rest/api/3/user/search?query={}",
            self.base_url,
            urlencoding::encode(query)
        )
    }

    fn issue_url(&self, key: &str) -> String {
        format!(
            "{}/rest/api/2/issue/{}",
            self.base_url,
            urlencoding::encode(key)
        )
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchPage {
    #[serde(default)]
    start_at: u64,
    #[serde(default)]
    total: Option<u64>,
    issues: Vec<RawRecord>,
}

pub(crate) fn search_body(query: &SearchQuery, start_at: u64, max_results: u32) -> serde_json::Value {
    serde_json::json!({
        "jql": query.jql,
        "fields": query.fields,
        "startAt": start_at,
        "maxResults": max_results,
    })
}

/// Reads the body of a non-success response into an error.
async fn status_error(resp: reqwest::Response) -> TrackerError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    TrackerError::Status { status, body }
}

#[async_trait]
impl Tracker for JiraTracker {
    fn name(&self) -> &str {
        "Jira"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawRecord>, TrackerError> {
        let mut issues: Vec<RawRecord> = Vec::new();
        loop {
            let start_at = issues.len() as u64;
            let resp = self
                .client
                .post(self.search_url())
                .header("Authorization", &self.auth_header)
                .header("Accept", "application/json")
                .json(&search_body(query, start_at, self.page_size))
                .send()
                .await?;
            if resp.status() != StatusCode::OK {
                return Err(status_error(resp).await);
            }
            let bytes = resp.bytes().await?;
            let page: SearchPage = serde_json::from_slice(&bytes)?;
            let received = page.issues.len();
            tracing::debug!(start_at = page.start_at, received, total = ?page.total, "search page");
            issues.extend(page.issues);

            let done = match page.total {
                Some(total) => issues.len() as u64 >= total,
                None => true,
            };
            if done || received == 0 {
                break;
            }
        }
        Ok(issues)
    }

    async fn find_users(&self, query: &str) -> Result<Vec<Account>, TrackerError> {
        let resp = self
            .client
            .get(self.user_search_url(query))
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .send()
            .await?;
        if resp.status() != StatusCode::OK {
            return Err(status_error(resp).await);
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn update_issue(&self, key: &str, payload: &UpdatePayload) -> Result<(), TrackerError> {
        let resp = self
            .client
            .put(self.issue_url(key))
            .header("Authorization", &self.auth_header)
            .header("Content-Type", "application/json")
            .json(&payload.to_body())
            .send()
            .await?;
        if resp.status() != StatusCode::NO_CONTENT {
            return Err(status_error(resp).await);
        }
        Ok(())
    }
}
