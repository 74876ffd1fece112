//! JIRA REST Client
//!
//! Thin reqwest wrapper over the Jira REST API (v2) covering the calls the
//! help request adapter makes.

use super::TicketingClient;
use crate::config::JiraConfig;
use crate::{HelpdeskError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

/// Per-request timeout for search/query operations (large result sets)
const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);
/// Per-request timeout for single resource fetches
const GET_TIMEOUT: Duration = Duration::from_secs(10);
/// Per-request timeout for create/update operations
const WRITE_TIMEOUT: Duration = Duration::from_secs(15);

/// Page size requested from the search endpoint
const SEARCH_PAGE_SIZE: u32 = 50;

/// JIRA issue representation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JiraIssue {
    #[serde(default)]
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub fields: JiraFields,
}

/// JIRA issue fields
///
/// Everything is optional because callers ask for narrow field sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JiraFields {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub assignee: Option<JiraUser>,
    #[serde(default)]
    pub reporter: Option<JiraUser>,
    #[serde(default)]
    pub status: Option<JiraStatus>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraStatus {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
}

/// Jira Server user; `name` is the username the API expects for assignees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraUser {
    pub name: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(rename = "emailAddress", default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub total: u32,
    #[serde(rename = "startAt", default)]
    pub start_at: u32,
    #[serde(rename = "maxResults", default)]
    pub max_results: u32,
    #[serde(default)]
    pub issues: Vec<JiraIssue>,
}

impl SearchResults {
    /// Result set with no issues
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraProject {
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub name: String,
}

/// Response body of a successful issue creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedIssue {
    pub id: String,
    pub key: String,
    #[serde(rename = "self", default)]
    pub self_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRef {
    pub key: String,
}

/// Request body for issue creation
#[derive(Debug, Clone, Serialize)]
pub struct NewIssue {
    pub fields: NewIssueFields,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewIssueFields {
    pub summary: String,
    #[serde(rename = "issuetype")]
    pub issue_type: IdRef,
    pub project: IdRef,
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub reporter: NameRef,
    #[serde(rename = "fixVersions")]
    pub fix_versions: Vec<NameRef>,
    #[serde(flatten)]
    pub custom_fields: BTreeMap<String, serde_json::Value>,
}

/// Partial update using Jira's `update` verbs (`set`, `add`, ...)
#[derive(Debug, Clone, Default, Serialize)]
pub struct IssueUpdate {
    pub update: BTreeMap<String, Vec<serde_json::Value>>,
}

impl IssueUpdate {
    /// Replace the description entirely
    pub fn set_description(description: impl Into<String>) -> Self {
        Self::default().with_operation(
            "description",
            serde_json::json!({ "set": description.into() }),
        )
    }

    /// Add one label, leaving existing labels untouched
    pub fn add_label(label: impl Into<String>) -> Self {
        Self::default().with_operation("labels", serde_json::json!({ "add": label.into() }))
    }

    pub fn with_operation(mut self, field: &str, operation: serde_json::Value) -> Self {
        self.update
            .entry(field.to_string())
            .or_default()
            .push(operation);
        self
    }
}

/// Request body for linking two issues
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueLink {
    #[serde(rename = "type")]
    pub link_type: NameRef,
    pub inward_issue: KeyRef,
    pub outward_issue: KeyRef,
}

impl IssueLink {
    /// `key` duplicates `original`
    pub fn duplicate(key: impl Into<String>, original: impl Into<String>) -> Self {
        Self {
            link_type: NameRef {
                name: "Duplicate".to_string(),
            },
            inward_issue: KeyRef { key: key.into() },
            outward_issue: KeyRef {
                key: original.into(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct JiraCommentCreate<'a> {
    body: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct JiraTransitionRequest<'a> {
    transition: JiraTransitionId<'a>,
}

#[derive(Debug, Clone, Serialize)]
struct JiraTransitionId<'a> {
    id: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct JiraSearchRequest<'a> {
    jql: &'a str,
    #[serde(rename = "startAt")]
    start_at: u32,
    #[serde(rename = "maxResults")]
    max_results: u32,
    fields: &'a [&'a str],
}

#[derive(Debug, Clone, Serialize)]
struct JiraAssigneeRequest<'a> {
    name: &'a str,
}

/// JIRA API client bound to one Jira instance
pub struct JiraClient {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl JiraClient {
    /// Create a new JIRA client
    ///
    /// The bearer token is read from the configured environment variable.
    /// With `strict_ssl` only https URLs with verified certificates are used.
    pub fn new(config: &JiraConfig) -> Result<Self> {
        let builder = Client::builder().timeout(Duration::from_secs(config.timeout_secs));
        let builder = if config.strict_ssl {
            builder.https_only(true)
        } else {
            builder.danger_accept_invalid_certs(true)
        };
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url(),
            auth_token: config.api_token(),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_token.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        let request = self.client.request(method, url);
        match self.auth_token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn issue_path(key: &str) -> String {
        format!("issue/{}", urlencoding::encode(key))
    }
}

/// Map a non-success response onto the error taxonomy
async fn check_status(response: Response, resource: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::NOT_FOUND => Err(HelpdeskError::NotFound(resource.to_string())),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(HelpdeskError::Auth(format!(
            "JIRA rejected credentials for {}: HTTP {}",
            resource, status
        ))),
        status => {
            let body = response.text().await.unwrap_or_default();
            Err(HelpdeskError::Api {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl TicketingClient for JiraClient {
    async fn transition_issue(&self, key: &str, transition_id: &str) -> Result<()> {
        let body = JiraTransitionRequest {
            transition: JiraTransitionId { id: transition_id },
        };

        info!(key = %key, transition_id = %transition_id, "Transitioning JIRA issue");

        let response = self
            .request(Method::POST, &format!("{}/transitions", Self::issue_path(key)))
            .json(&body)
            .timeout(WRITE_TIMEOUT)
            .send()
            .await?;
        check_status(response, key).await?;
        Ok(())
    }

    async fn link_issues(&self, link: &IssueLink) -> Result<()> {
        info!(
            inward = %link.inward_issue.key,
            outward = %link.outward_issue.key,
            link_type = %link.link_type.name,
            "Linking JIRA issues"
        );

        let response = self
            .request(Method::POST, "issueLink")
            .json(link)
            .timeout(WRITE_TIMEOUT)
            .send()
            .await?;
        check_status(response, &link.inward_issue.key).await?;
        Ok(())
    }

    async fn get_issue(&self, key: &str, fields: &[&str]) -> Result<JiraIssue> {
        debug!(key = %key, fields = ?fields, "Fetching JIRA issue");

        let response = self
            .request(Method::GET, &Self::issue_path(key))
            .query(&[("fields", fields.join(","))])
            .timeout(GET_TIMEOUT)
            .send()
            .await?;
        let response = check_status(response, key).await?;
        Ok(response.json().await?)
    }

    async fn search(&self, jql: &str, fields: &[&str]) -> Result<SearchResults> {
        let body = JiraSearchRequest {
            jql,
            start_at: 0,
            max_results: SEARCH_PAGE_SIZE,
            fields,
        };

        debug!(jql = %jql, "Searching JIRA issues");

        let response = self
            .request(Method::POST, "search")
            .json(&body)
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await?;
        let response = check_status(response, "search").await?;
        let results: SearchResults = response.json().await?;

        info!(
            total = results.total,
            returned = results.issues.len(),
            "JIRA search complete"
        );
        Ok(results)
    }

    async fn update_assignee(&self, key: &str, username: &str) -> Result<()> {
        info!(key = %key, assignee = %username, "Assigning JIRA issue");

        let response = self
            .request(Method::PUT, &format!("{}/assignee", Self::issue_path(key)))
            .json(&JiraAssigneeRequest { name: username })
            .timeout(WRITE_TIMEOUT)
            .send()
            .await?;
        check_status(response, key).await?;
        Ok(())
    }

    async fn search_users(&self, query: &str, max_results: u32) -> Result<Vec<JiraUser>> {
        debug!(max_results = max_results, "Searching JIRA users");

        let response = self
            .request(Method::GET, "user/search")
            .query(&[
                ("username", query.to_string()),
                ("maxResults", max_results.to_string()),
            ])
            .timeout(GET_TIMEOUT)
            .send()
            .await?;
        let response = check_status(response, "user/search").await?;
        Ok(response.json().await?)
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue> {
        info!(summary = %issue.fields.summary, "Creating JIRA issue");

        let response = self
            .request(Method::POST, "issue")
            .json(issue)
            .timeout(WRITE_TIMEOUT)
            .send()
            .await?;
        let response = check_status(response, "issue").await?;
        let created: CreatedIssue = response.json().await?;

        info!(key = %created.key, "Created JIRA issue");
        Ok(created)
    }

    async fn update_issue(&self, key: &str, update: &IssueUpdate) -> Result<()> {
        info!(
            key = %key,
            fields = ?update.update.keys().collect::<Vec<_>>(),
            "Updating JIRA issue"
        );

        let response = self
            .request(Method::PUT, &Self::issue_path(key))
            .json(update)
            .timeout(WRITE_TIMEOUT)
            .send()
            .await?;
        check_status(response, key).await?;
        Ok(())
    }

    async fn add_comment(&self, key: &str, body: &str) -> Result<()> {
        info!(key = %key, "Adding comment to JIRA issue");

        let response = self
            .request(Method::POST, &format!("{}/comment", Self::issue_path(key)))
            .json(&JiraCommentCreate { body })
            .timeout(WRITE_TIMEOUT)
            .send()
            .await?;
        check_status(response, key).await?;
        Ok(())
    }

    async fn get_project(&self, key: &str) -> Result<JiraProject> {
        debug!(project = %key, "Fetching JIRA project");

        let response = self
            .request(
                Method::GET,
                &format!("project/{}", urlencoding::encode(key)),
            )
            .timeout(GET_TIMEOUT)
            .send()
            .await?;
        let response = check_status(response, key).await?;
        Ok(response.json().await?)
    }
}
