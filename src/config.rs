use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_JQL: &str = r#"project="DevOps""#;
pub const DEFAULT_FILE: &str = "jira_tasks.csv";
pub const DEFAULT_CATEGORY_FIELD: &str = "customfield_10035";
pub const DEFAULT_TEAM_FIELD: &str = "customfield_10001";

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    pub jira: Option<JiraConfig>,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JiraConfig {
    /// Atlassian cloud site name, expanded to `https://{domain}.atlassian.net`.
    pub domain: Option<String>,
    /// Explicit base URL for self-hosted instances. Wins over `domain`.
    pub base_url: Option<String>,
    pub email: String,
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub jql: String,
    pub file: PathBuf,
    pub page_size: u32,
    pub concurrency: usize,
    pub category_field: String,
    pub team_field: String,
    pub report: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            jql: DEFAULT_JQL.to_string(),
            file: PathBuf::from(DEFAULT_FILE),
            page_size: 100,
            concurrency: 1,
            category_field: DEFAULT_CATEGORY_FIELD.to_string(),
            team_field: DEFAULT_TEAM_FIELD.to_string(),
            report: None,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

impl JiraConfig {
    pub fn base_url(&self) -> Result<String> {
        if let Some(url) = self.base_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return Ok(url.trim().trim_end_matches('/').to_string());
        }
        match self.domain.as_deref().map(str::trim) {
            Some(domain) if !domain.is_empty() => Ok(format!("https://{domain}.atlassian.net")),
            _ => bail!("[jira] needs either `domain` or `base_url`"),
        }
    }
}

impl AppConfig {
    /// The Jira section with credentials checked, or an error naming what is missing.
    pub fn jira(&self) -> Result<&JiraConfig> {
        let jira = self
            .jira
            .as_ref()
            .context("No [jira] section configured. Add credentials to ~/.tracksheet/config.toml")?;
        if jira.email.trim().is_empty() {
            bail!("[jira] email is empty");
        }
        if jira.api_token.trim().is_empty() {
            bail!("[jira] api_token is empty (set it in the config or JIRA_API_TOKEN)");
        }
        jira.base_url()?;
        Ok(jira)
    }

    pub fn report_path(&self) -> PathBuf {
        self.sync
            .report
            .clone()
            .unwrap_or_else(|| data_dir().join("push-report.jsonl"))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("JIRA_API_TOKEN") {
            if !token.trim().is_empty() {
                if let Some(jira) = self.jira.as_mut() {
                    jira.api_token = token;
                }
            }
        }
        if self.sync.concurrency == 0 {
            self.sync.concurrency = 1;
        }
    }
}

pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tracksheet")
}

fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("TRACKSHEET_CONFIG") {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    data_dir().join("config.toml")
}

pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let path = explicit.map(Path::to_path_buf).unwrap_or_else(config_path);
    if !path.exists() {
        if explicit.is_some() {
            bail!("Config file {} does not exist", path.display());
        }
        let mut config = AppConfig::default();
        config.apply_env_overrides();
        return Ok(config);
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let mut config: AppConfig = toml::from_str(contents)?;
    config.apply_env_overrides();
    Ok(config)
}
