//! External Integrations
//!
//! The ticketing backend the help request adapter talks to.
//!
//! # Overview
//!
//! [`TicketingClient`] is the seam between the adapter and the tracker: one
//! method per REST call the adapter needs. [`JiraClient`] implements it over
//! the Jira REST API; tests substitute an in-memory fake.

pub mod jira;

use crate::Result;
use async_trait::async_trait;

pub use jira::{
    CreatedIssue, IdRef, IssueLink, IssueUpdate, JiraClient, JiraFields, JiraIssue, JiraProject,
    JiraStatus, JiraUser, KeyRef, NameRef, NewIssue, NewIssueFields, SearchResults,
};

/// Operations the help request adapter needs from an issue tracker
#[async_trait]
pub trait TicketingClient: Send + Sync {
    /// Move an issue through a workflow transition
    async fn transition_issue(&self, key: &str, transition_id: &str) -> Result<()>;

    async fn link_issues(&self, link: &IssueLink) -> Result<()>;

    /// Fetch an issue, restricted to the given fields
    async fn get_issue(&self, key: &str, fields: &[&str]) -> Result<JiraIssue>;

    /// Run a JQL query, restricted to the given fields
    async fn search(&self, jql: &str, fields: &[&str]) -> Result<SearchResults>;

    async fn update_assignee(&self, key: &str, username: &str) -> Result<()>;

    /// Look up users by username or email
    async fn search_users(&self, query: &str, max_results: u32) -> Result<Vec<JiraUser>>;

    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue>;

    async fn update_issue(&self, key: &str, update: &IssueUpdate) -> Result<()>;

    async fn add_comment(&self, key: &str, body: &str) -> Result<()>;

    async fn get_project(&self, key: &str) -> Result<JiraProject>;
}
