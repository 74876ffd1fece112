//! Configuration validation
//!
//! Validates the help desk configuration before the adapter is built:
//! - Jira URL is http(s), and https when strict SSL is on
//! - Project key looks like a Jira project key
//! - Workflow identifiers are present and numeric
//! - The token environment variable is set (warning only)

use super::helpdesk_config::{HelpdeskConfig, JiraConfig};
use crate::HelpdeskError;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate a help desk configuration
pub fn validate_config(config: &HelpdeskConfig) -> ValidationResult {
    let errors = validate_jira(&config.jira);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_jira(jira: &JiraConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if jira.strict_ssl {
        if !jira.url.starts_with("https://") {
            errors.push(ValidationError::new(
                "jira.url",
                format!("Strict SSL requires an https URL: {}", jira.url),
            ));
        }
    } else if !jira.url.starts_with("http://") && !jira.url.starts_with("https://") {
        errors.push(ValidationError::new(
            "jira.url",
            format!("Invalid JIRA URL: {}", jira.url),
        ));
    }

    if !is_valid_project_key(&jira.project) {
        errors.push(ValidationError::new(
            "jira.project",
            format!(
                "Invalid JIRA project key '{}'. Expected uppercase letters and digits, starting with a letter",
                jira.project
            ),
        ));
    }

    let required = [
        ("jira.username", &jira.username),
        ("jira.issue_type_id", &jira.issue_type_id),
        ("jira.issue_type_name", &jira.issue_type_name),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(ValidationError::new(field, "Value cannot be empty"));
        }
    }

    let transitions = [
        ("jira.start_transition_id", &jira.start_transition_id),
        ("jira.done_transition_id", &jira.done_transition_id),
        ("jira.up_next_transition_id", &jira.up_next_transition_id),
    ];
    for (field, value) in transitions {
        if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
            errors.push(ValidationError::new(
                field,
                format!("Transition id must be numeric, got '{}'", value),
            ));
        }
    }

    if jira.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "jira.timeout_secs",
            "Timeout must be greater than 0",
        ));
    }

    if jira.api_token().is_none() {
        tracing::warn!(
            env_var = %jira.token_env,
            "Jira token environment variable not set (this may be intentional if set at runtime)"
        );
    }

    errors
}

/// Jira project keys: an uppercase letter followed by uppercase letters, digits or underscores
fn is_valid_project_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Validate configuration and return a Result
pub fn validate_config_result(config: &HelpdeskConfig) -> crate::Result<()> {
    validate_config(config).map_err(into_config_error)
}

/// Validate the Jira section on its own, as done when an adapter is built
pub fn validate_jira_config(jira: &JiraConfig) -> crate::Result<()> {
    let errors = validate_jira(jira);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(into_config_error(errors))
    }
}

fn into_config_error(errors: Vec<ValidationError>) -> HelpdeskError {
    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    HelpdeskError::Config(format!(
        "Configuration validation failed:\n  - {}",
        messages.join("\n  - ")
    ))
}
