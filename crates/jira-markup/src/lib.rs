//! Jira wiki markup for help requests
//!
//! Turns the structured fields collected from a chat help request into the
//! text bodies Jira stores: issue descriptions, update comments, and
//! resolution comments.
//!
//! # Example
//!
//! ```
//! use jira_markup::{MessageFields, MessageFormatter, WikiMarkup};
//!
//! let fields = MessageFields::new()
//!     .with_field("Environment", "AAT")
//!     .with_field("Service affected", "Payments");
//!
//! let description = WikiMarkup.description(&fields);
//! assert!(description.contains("*Environment*: AAT"));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Placeholder rendered for fields the requester left blank
pub const EMPTY_VALUE: &str = "N/A";

/// A single titled value from a help request form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageField {
    pub title: String,
    #[serde(default)]
    pub value: String,
}

/// Ordered set of titled values
///
/// Order is preserved when rendering so the ticket reads the same way as the
/// form the requester filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageFields {
    pub fields: Vec<MessageField>,
}

impl MessageFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a titled value
    pub fn with_field(mut self, title: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(MessageField {
            title: title.into(),
            value: value.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MessageField> {
        self.fields.iter()
    }
}

/// The three answers collected when a help request is resolved
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveFields {
    pub what: String,
    #[serde(rename = "where")]
    pub where_: String,
    pub how: String,
}

impl ResolveFields {
    pub fn new(what: impl Into<String>, where_: impl Into<String>, how: impl Into<String>) -> Self {
        Self {
            what: what.into(),
            where_: where_.into(),
            how: how.into(),
        }
    }
}

/// Builds the text bodies sent to Jira
pub trait MessageFormatter: Send + Sync {
    /// Full issue description; replaces whatever the issue had before
    fn description(&self, fields: &MessageFields) -> String;

    /// Body of an update comment
    fn comment(&self, fields: &MessageFields) -> String;

    /// Body of the comment added when a request is resolved
    fn resolve_comment(&self, fields: &ResolveFields) -> String;
}

/// Default formatter producing Jira wiki markup
#[derive(Debug, Clone, Copy, Default)]
pub struct WikiMarkup;

impl WikiMarkup {
    fn render_fields(out: &mut String, fields: &MessageFields) {
        for field in fields.iter() {
            let _ = writeln!(out, "*{}*: {}", field.title, or_empty(&field.value));
        }
    }
}

impl MessageFormatter for WikiMarkup {
    fn description(&self, fields: &MessageFields) -> String {
        let mut out = String::new();
        Self::render_fields(&mut out, fields);
        out.trim_end().to_string()
    }

    fn comment(&self, fields: &MessageFields) -> String {
        let mut out = String::from("h6. Update from Slack\n");
        Self::render_fields(&mut out, fields);
        out.trim_end().to_string()
    }

    fn resolve_comment(&self, fields: &ResolveFields) -> String {
        format!(
            "h6. Resolution\n*What was the issue?*: {}\n*Where was the issue?*: {}\n*How was it resolved?*: {}",
            or_empty(&fields.what),
            or_empty(&fields.where_),
            or_empty(&fields.how),
        )
    }
}

fn or_empty(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        EMPTY_VALUE
    } else {
        trimmed
    }
}
