//! Configuration system
//!
//! Loads ~/.config/helpdesk-jira/config.yaml with:
//! - Jira connection settings (URL, bearer token env var, strict SSL)
//! - Project, issue type and workflow transition identifiers
//! - Fixed creation fields (platform labels, custom fields, fix versions)

mod helpdesk_config;
pub mod validation;

pub use helpdesk_config::{HelpdeskConfig, JiraConfig};
pub use validation::{
    validate_config, validate_config_result, validate_jira_config, ValidationError,
};
