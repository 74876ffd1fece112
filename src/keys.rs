//! Ticket key extraction
//!
//! Finds project-scoped ticket keys (e.g. "SBOX-61") in chat text, and pulls
//! the "View on Jira" text out of a posted help request message.

use crate::{HelpdeskError, Result};
use regex::Regex;
use serde_json::Value;

/// Matches `<PROJECT>-<digits>` for a single project
#[derive(Debug, Clone)]
pub struct TicketKeyMatcher {
    pattern: Regex,
}

impl TicketKeyMatcher {
    /// Build a matcher for the given project key
    pub fn new(project: &str) -> Result<Self> {
        let pattern = Regex::new(&format!(r"({}-\d+)", regex::escape(project))).map_err(|e| {
            HelpdeskError::Config(format!("Invalid project key '{}': {}", project, e))
        })?;
        Ok(Self { pattern })
    }

    /// First ticket key in `text`, if any
    pub fn find(&self, text: &str) -> Option<String> {
        self.pattern.find(text).map(|m| m.as_str().to_string())
    }
}

/// Text of the element that carries the ticket link in a help request message
///
/// Help request messages come in two layouts. The three block layout keeps
/// the link in the first field of the last section; the longer layout keeps
/// it in the first element of the fifth (context) block. Anything that does
/// not fit either shape yields `None`.
pub fn reference_text(blocks: &[Value]) -> Option<&str> {
    let element = if blocks.len() == 3 {
        blocks.get(2)?.get("fields")?.get(0)?
    } else {
        blocks.get(4)?.get("elements")?.get(0)?
    };
    element.get("text")?.as_str()
}
