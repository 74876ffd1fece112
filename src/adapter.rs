//! Help Request Adapter
//!
//! Translates help desk actions (create, start, resolve, comment, label...)
//! into Jira calls. Failures are logged and swallowed so the chat workflow
//! keeps going. The exceptions are [`HelpRequestAdapter::get_issue_description`]
//! and [`HelpRequestAdapter::extract_jira_id`], which hand errors back.

use crate::config::{validate_jira_config, JiraConfig};
use crate::integrations::{
    CreatedIssue, IdRef, IssueLink, IssueUpdate, JiraClient, JiraProject, NameRef, NewIssue,
    NewIssueFields, SearchResults, TicketingClient,
};
use crate::keys::{self, TicketKeyMatcher};
use crate::{HelpdeskError, Result};
use jira_markup::{MessageFields, MessageFormatter, ResolveFields, WikiMarkup};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Fields requested when listing unassigned issues
pub const SEARCH_FIELDS: [&str; 4] = ["created", "description", "summary", "updated"];

/// Label that keeps an issue out of the unassigned queue
pub const EXCLUDED_LABEL: &str = "Heritage";

/// Returned by block extraction when no ticket key is present
pub const NO_TICKET_KEY: &str = "undefined";

/// A help request raised from chat
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewHelpRequest {
    pub summary: String,
    /// Requester email; the system user reports the ticket when absent
    #[serde(default)]
    pub user_email: Option<String>,
    /// Extra labels on top of the platform labels
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Label recorded when a help request is resolved under `category`
///
/// "Needs More Info" becomes "resolution-needs-more-info".
pub fn resolution_label(category: &str) -> String {
    format!("resolution-{}", category.to_lowercase().replace(' ', "-"))
}

/// Platform labels followed by caller labels, without duplicates
pub fn help_request_labels(platform: &[String], extra: &[String]) -> Vec<String> {
    let mut labels: Vec<String> = Vec::with_capacity(platform.len() + extra.len());
    for label in platform.iter().chain(extra) {
        if !labels.contains(label) {
            labels.push(label.clone());
        }
    }
    labels
}

/// Jira adapter for the help request workflow
pub struct HelpRequestAdapter<C, F = WikiMarkup> {
    client: C,
    formatter: F,
    config: JiraConfig,
    keys: TicketKeyMatcher,
}

impl HelpRequestAdapter<JiraClient, WikiMarkup> {
    /// Build an adapter backed by the Jira REST API and the wiki markup formatter
    pub fn connect(config: JiraConfig) -> Result<Self> {
        let client = JiraClient::new(&config)?;
        Self::new(client, WikiMarkup, config)
    }
}

impl<C, F> HelpRequestAdapter<C, F>
where
    C: TicketingClient,
    F: MessageFormatter,
{
    /// # Errors
    /// [`HelpdeskError::Config`] when the Jira settings fail validation.
    pub fn new(client: C, formatter: F, config: JiraConfig) -> Result<Self> {
        validate_jira_config(&config)?;
        let keys = TicketKeyMatcher::new(&config.project)?;
        Ok(Self {
            client,
            formatter,
            config,
            keys,
        })
    }

    pub fn config(&self) -> &JiraConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Move the help request to "Done"
    pub async fn resolve_help_request(&self, key: &str) {
        if let Err(e) = self
            .client
            .transition_issue(key, &self.config.done_transition_id)
            .await
        {
            error!(key = %key, error = %e, "Error resolving help request in jira");
        }
    }

    /// Move the help request to "In Progress"
    pub async fn start_help_request(&self, key: &str) {
        if let Err(e) = self
            .client
            .transition_issue(key, &self.config.start_transition_id)
            .await
        {
            error!(key = %key, error = %e, "Error starting help request in jira");
        }
    }

    /// Link `key` as a duplicate of `parent_key` and close it
    ///
    /// A failed link skips the transition; a failed transition leaves the link in place.
    pub async fn mark_as_duplicate(&self, key: &str, parent_key: &str) {
        let result = async {
            self.client
                .link_issues(&IssueLink::duplicate(key, parent_key))
                .await?;
            self.client
                .transition_issue(key, &self.config.done_transition_id)
                .await
        }
        .await;

        if let Err(e) = result {
            error!(
                key = %key,
                parent = %parent_key,
                error = %e,
                "Error marking help request as duplicate in jira"
            );
        }
    }

    /// Current description, or `None` when the issue does not exist
    ///
    /// # Errors
    /// Any failure other than a missing issue.
    pub async fn get_issue_description(&self, key: &str) -> Result<Option<String>> {
        match self.client.get_issue(key, &["description"]).await {
            Ok(issue) => Ok(issue.fields.description),
            Err(e) if e.is_not_found() => {
                debug!(key = %key, "Help request not found in jira");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// JQL for open, unassigned help requests, oldest first
    pub fn unassigned_open_jql(&self) -> String {
        format!(
            "project = {} AND type = \"{}\" AND status = Open and assignee is EMPTY AND labels not in (\"{}\") ORDER BY created ASC",
            self.config.project, self.config.issue_type_name, EXCLUDED_LABEL
        )
    }

    /// Open help requests nobody has picked up; empty on failure
    pub async fn search_for_unassigned_open_issues(&self) -> SearchResults {
        let jql = self.unassigned_open_jql();
        match self.client.search(&jql, &SEARCH_FIELDS).await {
            Ok(results) => results,
            Err(e) => {
                error!(error = %e, "Error searching for issues in jira");
                SearchResults::empty()
            }
        }
    }

    /// Assign the help request to the Jira user behind `email`
    pub async fn assign_help_request(&self, key: &str, email: Option<&str>) {
        let user = self.convert_email(email).await;

        if let Err(e) = self.client.update_assignee(key, &user).await {
            error!(key = %key, assignee = %user, error = %e, "Error assigning help request in jira");
        }
    }

    /// Jira username for an email, falling back to the system user
    pub async fn convert_email(&self, email: Option<&str>) -> String {
        let email = match email.filter(|e| !e.is_empty()) {
            Some(email) => email,
            None => return self.config.username.clone(),
        };

        match self.client.search_users(email, 1).await {
            Ok(users) => match users.into_iter().next() {
                Some(user) => user.name,
                None => {
                    warn!(email = %email, "Querying username failed: no matching jira user");
                    self.config.username.clone()
                }
            },
            Err(e) => {
                warn!(email = %email, error = %e, "Querying username failed");
                self.config.username.clone()
            }
        }
    }

    /// Create a help request and return its key
    ///
    /// The ticket is reported by the requester when Jira knows them. If Jira
    /// rejects that, creation is retried once as the system user. Returns
    /// `None` when no ticket could be created.
    pub async fn create_help_request(&self, request: &NewHelpRequest) -> Option<String> {
        let user = self.convert_email(request.user_email.as_deref()).await;

        let project = match self.client.get_project(&self.config.project).await {
            Ok(project) => project,
            Err(e) => {
                error!(project = %self.config.project, error = %e, "Error fetching project from jira");
                return None;
            }
        };

        let first_attempt = self
            .create_help_request_in_jira(&request.summary, &project, &user, &request.labels)
            .await;

        let created = match first_attempt {
            Ok(created) => created,
            Err(e) => {
                warn!(
                    reporter = %user,
                    error = %e,
                    "Unable to create help request as requester, retrying as system user"
                );
                match self
                    .create_help_request_in_jira(
                        &request.summary,
                        &project,
                        &self.config.username,
                        &request.labels,
                    )
                    .await
                {
                    Ok(created) => created,
                    Err(e) => {
                        error!(error = %e, "Error creating help request in jira");
                        return None;
                    }
                }
            }
        };

        Some(created.key)
    }

    /// Creation payload for a help request reported by `user`
    pub fn new_issue(
        &self,
        summary: &str,
        project: &JiraProject,
        user: &str,
        labels: &[String],
    ) -> NewIssue {
        NewIssue {
            fields: NewIssueFields {
                summary: summary.to_string(),
                issue_type: IdRef {
                    id: self.config.issue_type_id.clone(),
                },
                project: IdRef {
                    id: project.id.clone(),
                },
                labels: help_request_labels(&self.config.platform_labels, labels),
                description: None,
                reporter: NameRef {
                    name: user.to_string(),
                },
                fix_versions: self
                    .config
                    .fix_versions
                    .iter()
                    .map(|name| NameRef { name: name.clone() })
                    .collect(),
                custom_fields: self.config.custom_fields.clone(),
            },
        }
    }

    /// Create the ticket, then move it to "Up Next"
    ///
    /// Only the creation itself can fail; a failed follow-up transition is logged.
    pub async fn create_help_request_in_jira(
        &self,
        summary: &str,
        project: &JiraProject,
        user: &str,
        labels: &[String],
    ) -> Result<CreatedIssue> {
        info!(reporter = %user, "Creating help request in Jira");

        let created = self
            .client
            .create_issue(&self.new_issue(summary, project, user, labels))
            .await?;

        if let Err(e) = self
            .client
            .transition_issue(&created.key, &self.config.up_next_transition_id)
            .await
        {
            warn!(key = %created.key, error = %e, "Unable to transition new issue");
        }

        Ok(created)
    }

    /// Replace the description with one rendered from `fields`
    pub async fn update_help_request_description(&self, key: &str, fields: &MessageFields) {
        let description = self.formatter.description(fields);

        if let Err(e) = self
            .client
            .update_issue(key, &IssueUpdate::set_description(description))
            .await
        {
            error!(key = %key, error = %e, "Error updating help request description in jira");
        }
    }

    pub async fn add_comment_to_help_request(&self, key: &str, fields: &MessageFields) {
        let body = self.formatter.comment(fields);

        if let Err(e) = self.client.add_comment(key, &body).await {
            error!(key = %key, error = %e, "Error creating comment in jira");
        }
    }

    /// Comment with the what/where/how answers given on resolution
    pub async fn add_comment_to_help_request_resolve(&self, key: &str, fields: &ResolveFields) {
        let body = self.formatter.resolve_comment(fields);

        if let Err(e) = self.client.add_comment(key, &body).await {
            error!(key = %key, error = %e, "Error creating resolution comment in jira");
        }
    }

    /// Add the resolution label for `category`; existing labels are kept
    pub async fn add_label(&self, key: &str, category: &str) {
        let label = resolution_label(category);

        if let Err(e) = self
            .client
            .update_issue(key, &IssueUpdate::add_label(label.as_str()))
            .await
        {
            error!(key = %key, label = %label, error = %e, "Error adding label to help request in jira");
        }
    }

    /// Ticket key from a posted help request message, or "undefined"
    pub fn extract_jira_id_from_blocks(&self, blocks: &[serde_json::Value]) -> String {
        keys::reference_text(blocks)
            .and_then(|text| self.keys.find(text))
            .unwrap_or_else(|| NO_TICKET_KEY.to_string())
    }

    /// First ticket key in `text`
    ///
    /// # Errors
    /// [`HelpdeskError::NoTicketKey`] when the text holds no key for the project.
    pub fn extract_jira_id(&self, text: &str) -> Result<String> {
        self.keys
            .find(text)
            .ok_or_else(|| HelpdeskError::NoTicketKey(text.to_string()))
    }
}
