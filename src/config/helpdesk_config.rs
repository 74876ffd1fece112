//! Help desk configuration file handling
//!
//! Loads ~/.config/helpdesk-jira/config.yaml. The result is read once at
//! startup and handed to the adapter; nothing mutates it afterwards.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Jira connection and workflow settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraConfig {
    /// Jira base URL including any context path (e.g. "https://tools.hmcts.net/jira")
    pub url: String,

    /// Project key that scopes searches and ticket key matching
    pub project: String,

    /// System user, used whenever a requester cannot be resolved
    pub username: String,

    /// Environment variable holding the bearer token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    pub issue_type_id: String,

    pub issue_type_name: String,

    /// Transition that moves a ticket to "In Progress"
    pub start_transition_id: String,

    /// Transition that moves a ticket to "Done"
    pub done_transition_id: String,

    /// Transition applied right after creation ("Up Next")
    #[serde(default = "default_up_next_transition_id")]
    pub up_next_transition_id: String,

    /// Labels every new help request carries
    #[serde(default = "default_platform_labels")]
    pub platform_labels: Vec<String>,

    /// Extra fields sent verbatim on creation (e.g. the cost centre epic link)
    #[serde(default = "default_custom_fields")]
    pub custom_fields: BTreeMap<String, serde_json::Value>,

    /// Fix versions set on creation, by name
    #[serde(default = "default_fix_versions")]
    pub fix_versions: Vec<String>,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Require https and verified certificates
    #[serde(default = "default_strict_ssl")]
    pub strict_ssl: bool,

    /// Overall HTTP client timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_token_env() -> String {
    "JIRA_API_TOKEN".to_string()
}

fn default_up_next_transition_id() -> String {
    "361".to_string()
}

fn default_platform_labels() -> Vec<String> {
    vec!["F&PPETTeam".to_string(), "created-from-slack".to_string()]
}

fn default_custom_fields() -> BTreeMap<String, serde_json::Value> {
    let mut fields = BTreeMap::new();
    fields.insert(
        "customfield_10008".to_string(),
        serde_json::Value::String("PAY-6381".to_string()),
    );
    fields
}

fn default_fix_versions() -> Vec<String> {
    vec!["F&P No Release Required".to_string()]
}

fn default_api_version() -> String {
    "2".to_string()
}

fn default_strict_ssl() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

impl JiraConfig {
    /// Create a config with the required settings and defaults for the rest
    pub fn new(
        url: impl Into<String>,
        project: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            project: project.into(),
            username: username.into(),
            token_env: default_token_env(),
            issue_type_id: String::new(),
            issue_type_name: String::new(),
            start_transition_id: String::new(),
            done_transition_id: String::new(),
            up_next_transition_id: default_up_next_transition_id(),
            platform_labels: default_platform_labels(),
            custom_fields: default_custom_fields(),
            fix_versions: default_fix_versions(),
            api_version: default_api_version(),
            strict_ssl: default_strict_ssl(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Set the issue type used for creation and searches
    pub fn with_issue_type(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.issue_type_id = id.into();
        self.issue_type_name = name.into();
        self
    }

    /// Set the start and done workflow transitions
    pub fn with_transitions(mut self, start: impl Into<String>, done: impl Into<String>) -> Self {
        self.start_transition_id = start.into();
        self.done_transition_id = done.into();
        self
    }

    pub fn with_token_env(mut self, token_env: impl Into<String>) -> Self {
        self.token_env = token_env.into();
        self
    }

    pub fn with_strict_ssl(mut self, strict_ssl: bool) -> Self {
        self.strict_ssl = strict_ssl;
        self
    }

    /// Bearer token read from the configured environment variable
    pub fn api_token(&self) -> Option<String> {
        std::env::var(self.token_env.trim_start_matches('$'))
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }

    /// REST API root, e.g. "https://tools.hmcts.net/jira/rest/api/2"
    pub fn api_base_url(&self) -> String {
        format!(
            "{}/rest/api/{}",
            self.url.trim_end_matches('/'),
            self.api_version
        )
    }
}

/// Help desk configuration
///
/// Represents the complete ~/.config/helpdesk-jira/config.yaml file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpdeskConfig {
    pub jira: JiraConfig,
}

impl HelpdeskConfig {
    pub fn new(jira: JiraConfig) -> Self {
        Self { jira }
    }

    /// Load configuration from the default path (~/.config/helpdesk-jira/config.yaml)
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path();
        Self::load(&path)
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::HelpdeskError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading help desk configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            project = %config.jira.project,
            url = %config.jira.url,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving help desk configuration");

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Get the default config path (~/.config/helpdesk-jira/config.yaml)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("helpdesk-jira");
        path.push("config.yaml");
        path
    }
}
