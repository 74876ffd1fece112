//! helpdesk-jira - Jira backend for a chat help request workflow
//!
//! Turns help desk actions raised in chat (create a request, start it,
//! resolve it, comment, label, assign) into Jira REST calls and maps the
//! results back into simple outcomes for the chat bot.
//!
//! # Architecture
//!
//! - **adapter**: One operation per help desk action ([`HelpRequestAdapter`])
//! - **integrations**: The [`TicketingClient`] seam and its Jira REST implementation
//! - **keys**: Ticket key matching and message layout lookup
//! - **config**: YAML configuration, read once and injected
//! - **logging**: tracing subscriber setup
//!
//! # Example
//!
//! ```no_run
//! use helpdesk_jira::{HelpRequestAdapter, HelpdeskConfig, NewHelpRequest};
//!
//! # async fn run() -> helpdesk_jira::Result<()> {
//! let config = HelpdeskConfig::load_default()?;
//! let adapter = HelpRequestAdapter::connect(config.jira)?;
//!
//! let key = adapter
//!     .create_help_request(&NewHelpRequest {
//!         summary: "Payments failing in AAT".to_string(),
//!         user_email: Some("jane@example.com".to_string()),
//!         labels: vec![],
//!     })
//!     .await;
//!
//! if let Some(key) = key {
//!     adapter.start_help_request(&key).await;
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod integrations;
pub mod keys;
pub mod logging;

// Re-exports
pub use adapter::{resolution_label, HelpRequestAdapter, NewHelpRequest};
pub use config::{HelpdeskConfig, JiraConfig};
pub use error::{HelpdeskError, Result};
pub use integrations::{JiraClient, SearchResults, TicketingClient};
pub use jira_markup::{MessageFields, MessageFormatter, ResolveFields, WikiMarkup};
