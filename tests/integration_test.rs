//! Integration tests for helpdesk-jira
//!
//! Drive the adapter through the real reqwest client against a mock Jira
//! server, checking request payloads and how responses map to outcomes.

use helpdesk_jira::{
    HelpRequestAdapter, HelpdeskError, JiraClient, JiraConfig, MessageFields, NewHelpRequest,
    ResolveFields, WikiMarkup,
};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API: &str = "/rest/api/2";

struct TestContext {
    server: MockServer,
    adapter: HelpRequestAdapter<JiraClient>,
}

impl TestContext {
    async fn new() -> Self {
        helpdesk_jira::logging::init_test();

        let server = MockServer::start().await;
        let config = JiraConfig::new(server.uri(), "SBOX", "helpdesk-bot")
            .with_issue_type("10900", "Support")
            .with_transitions("41", "61")
            .with_token_env("HELPDESK_INTEGRATION_TOKEN_UNSET")
            .with_strict_ssl(false);

        let client = JiraClient::new(&config)
            .expect("Failed to create client")
            .with_token("test-token");
        let adapter =
            HelpRequestAdapter::new(client, WikiMarkup, config).expect("Failed to create adapter");

        Self { server, adapter }
    }

    async fn mock_transition(&self, key: &str, transition_id: &str, status: u16) {
        Mock::given(method("POST"))
            .and(path(format!("{}/issue/{}/transitions", API, key)))
            .and(body_json(json!({ "transition": { "id": transition_id } })))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    async fn mock_user(&self, email: &str, users: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("{}/user/search", API)))
            .and(query_param("username", email))
            .and(query_param("maxResults", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(users))
            .mount(&self.server)
            .await;
    }

    async fn mock_project(&self) {
        Mock::given(method("GET"))
            .and(path(format!("{}/project/SBOX", API)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "10001",
                "key": "SBOX",
                "name": "Sandbox"
            })))
            .mount(&self.server)
            .await;
    }
}

mod transition_tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_sends_done_transition_with_bearer_token() {
        let ctx = TestContext::new().await;

        Mock::given(method("POST"))
            .and(path(format!("{}/issue/SBOX-1/transitions", API)))
            .and(header("authorization", "Bearer test-token"))
            .and(body_json(json!({ "transition": { "id": "61" } })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&ctx.server)
            .await;

        ctx.adapter.resolve_help_request("SBOX-1").await;
    }

    #[tokio::test]
    async fn test_start_failure_does_not_propagate() {
        let ctx = TestContext::new().await;
        ctx.mock_transition("SBOX-1", "41", 400).await;

        ctx.adapter.start_help_request("SBOX-1").await;
    }

    #[tokio::test]
    async fn test_mark_as_duplicate() {
        let ctx = TestContext::new().await;

        Mock::given(method("POST"))
            .and(path(format!("{}/issueLink", API)))
            .and(body_json(json!({
                "type": { "name": "Duplicate" },
                "inwardIssue": { "key": "SBOX-2" },
                "outwardIssue": { "key": "SBOX-1" }
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&ctx.server)
            .await;
        ctx.mock_transition("SBOX-2", "61", 204).await;

        ctx.adapter.mark_as_duplicate("SBOX-2", "SBOX-1").await;
    }

    #[tokio::test]
    async fn test_mark_as_duplicate_skips_transition_when_link_fails() {
        let ctx = TestContext::new().await;

        Mock::given(method("POST"))
            .and(path(format!("{}/issueLink", API)))
            .respond_with(ResponseTemplate::new(404))
            .mount(&ctx.server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{}/issue/SBOX-2/transitions", API)))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&ctx.server)
            .await;

        ctx.adapter.mark_as_duplicate("SBOX-2", "SBOX-1").await;
    }
}

mod description_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_issue_description() {
        let ctx = TestContext::new().await;

        Mock::given(method("GET"))
            .and(path(format!("{}/issue/SBOX-1", API)))
            .and(query_param("fields", "description"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "10010",
                "key": "SBOX-1",
                "fields": { "description": "Payments failing" }
            })))
            .mount(&ctx.server)
            .await;

        let description = ctx.adapter.get_issue_description("SBOX-1").await.unwrap();
        assert_eq!(description.as_deref(), Some("Payments failing"));
    }

    #[tokio::test]
    async fn test_missing_issue_has_no_description() {
        let ctx = TestContext::new().await;

        Mock::given(method("GET"))
            .and(path(format!("{}/issue/SBOX-404", API)))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "errorMessages": ["Issue Does Not Exist"]
            })))
            .mount(&ctx.server)
            .await;

        let description = ctx.adapter.get_issue_description("SBOX-404").await.unwrap();
        assert_eq!(description, None);
    }

    #[tokio::test]
    async fn test_server_error_propagates() {
        let ctx = TestContext::new().await;

        Mock::given(method("GET"))
            .and(path(format!("{}/issue/SBOX-1", API)))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&ctx.server)
            .await;

        let err = ctx.adapter.get_issue_description("SBOX-1").await.unwrap_err();
        match err {
            HelpdeskError::Api { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_auth_failure_propagates() {
        let ctx = TestContext::new().await;

        Mock::given(method("GET"))
            .and(path(format!("{}/issue/SBOX-1", API)))
            .respond_with(ResponseTemplate::new(401))
            .mount(&ctx.server)
            .await;

        let err = ctx.adapter.get_issue_description("SBOX-1").await.unwrap_err();
        assert!(matches!(err, HelpdeskError::Auth(_)));
    }

    #[tokio::test]
    async fn test_update_description_replaces_field() {
        let ctx = TestContext::new().await;

        Mock::given(method("PUT"))
            .and(path(format!("{}/issue/SBOX-1", API)))
            .and(body_json(json!({
                "update": { "description": [{ "set": "*Environment*: AAT\n*Team*: Payments" }] }
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&ctx.server)
            .await;

        let fields = MessageFields::new()
            .with_field("Environment", "AAT")
            .with_field("Team", "Payments");
        ctx.adapter
            .update_help_request_description("SBOX-1", &fields)
            .await;
    }
}

mod search_tests {
    use super::*;

    #[tokio::test]
    async fn test_search_for_unassigned_open_issues() {
        let ctx = TestContext::new().await;

        Mock::given(method("POST"))
            .and(path(format!("{}/search", API)))
            .and(body_partial_json(json!({
                "jql": "project = SBOX AND type = \"Support\" AND status = Open and assignee is EMPTY AND labels not in (\"Heritage\") ORDER BY created ASC",
                "fields": ["created", "description", "summary", "updated"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "startAt": 0,
                "maxResults": 50,
                "total": 2,
                "issues": [
                    { "id": "1", "key": "SBOX-1", "fields": { "summary": "First", "created": "2024-01-01T09:00:00.000+0000" } },
                    { "id": "2", "key": "SBOX-2", "fields": { "summary": "Second" } }
                ]
            })))
            .expect(1)
            .mount(&ctx.server)
            .await;

        let results = ctx.adapter.search_for_unassigned_open_issues().await;
        assert_eq!(results.total, 2);
        let keys: Vec<&str> = results.issues.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["SBOX-1", "SBOX-2"]);
    }

    #[tokio::test]
    async fn test_search_failure_returns_no_issues() {
        let ctx = TestContext::new().await;

        Mock::given(method("POST"))
            .and(path(format!("{}/search", API)))
            .respond_with(ResponseTemplate::new(500))
            .mount(&ctx.server)
            .await;

        let results = ctx.adapter.search_for_unassigned_open_issues().await;
        assert!(results.issues.is_empty());
    }
}

mod create_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_help_request() {
        let ctx = TestContext::new().await;
        ctx.mock_user("jane@example.com", json!([{ "name": "jdoe", "displayName": "Jane Doe" }]))
            .await;
        ctx.mock_project().await;

        Mock::given(method("POST"))
            .and(path(format!("{}/issue", API)))
            .and(body_json(json!({
                "fields": {
                    "summary": "Payments failing in AAT",
                    "issuetype": { "id": "10900" },
                    "project": { "id": "10001" },
                    "labels": ["F&PPETTeam", "created-from-slack", "payments"],
                    "reporter": { "name": "jdoe" },
                    "fixVersions": [{ "name": "F&P No Release Required" }],
                    "customfield_10008": "PAY-6381"
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "10061",
                "key": "SBOX-61",
                "self": "https://jira.example.com/rest/api/2/issue/10061"
            })))
            .expect(1)
            .mount(&ctx.server)
            .await;
        ctx.mock_transition("SBOX-61", "361", 204).await;

        let key = ctx
            .adapter
            .create_help_request(&NewHelpRequest {
                summary: "Payments failing in AAT".to_string(),
                user_email: Some("jane@example.com".to_string()),
                labels: vec!["payments".to_string()],
            })
            .await;

        assert_eq!(key.as_deref(), Some("SBOX-61"));
    }

    #[tokio::test]
    async fn test_create_falls_back_to_system_user() {
        let ctx = TestContext::new().await;
        ctx.mock_user("jane@example.com", json!([{ "name": "jdoe" }]))
            .await;
        ctx.mock_project().await;

        Mock::given(method("POST"))
            .and(path(format!("{}/issue", API)))
            .and(body_partial_json(json!({ "fields": { "reporter": { "name": "jdoe" } } })))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "errors": { "reporter": "The reporter specified is not a user." }
            })))
            .expect(1)
            .mount(&ctx.server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{}/issue", API)))
            .and(body_partial_json(
                json!({ "fields": { "reporter": { "name": "helpdesk-bot" } } }),
            ))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "10062",
                "key": "SBOX-62"
            })))
            .expect(1)
            .mount(&ctx.server)
            .await;
        // The Up Next transition failing must not lose the new ticket
        ctx.mock_transition("SBOX-62", "361", 400).await;

        let key = ctx
            .adapter
            .create_help_request(&NewHelpRequest {
                summary: "Help".to_string(),
                user_email: Some("jane@example.com".to_string()),
                labels: vec![],
            })
            .await;

        assert_eq!(key.as_deref(), Some("SBOX-62"));
    }

    #[tokio::test]
    async fn test_create_with_unknown_email_uses_system_user() {
        let ctx = TestContext::new().await;
        ctx.mock_user("missing@x.com", json!([])).await;
        ctx.mock_project().await;

        Mock::given(method("POST"))
            .and(path(format!("{}/issue", API)))
            .and(body_partial_json(
                json!({ "fields": { "reporter": { "name": "helpdesk-bot" } } }),
            ))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "10063",
                "key": "SBOX-63"
            })))
            .mount(&ctx.server)
            .await;
        ctx.mock_transition("SBOX-63", "361", 204).await;

        let key = ctx
            .adapter
            .create_help_request(&NewHelpRequest {
                summary: "Help".to_string(),
                user_email: Some("missing@x.com".to_string()),
                labels: vec![],
            })
            .await;

        assert_eq!(key.as_deref(), Some("SBOX-63"));
    }
}

mod update_tests {
    use super::*;

    #[tokio::test]
    async fn test_assign_help_request() {
        let ctx = TestContext::new().await;
        ctx.mock_user("jane@example.com", json!([{ "name": "jdoe" }]))
            .await;

        Mock::given(method("PUT"))
            .and(path(format!("{}/issue/SBOX-1/assignee", API)))
            .and(body_json(json!({ "name": "jdoe" })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&ctx.server)
            .await;

        ctx.adapter
            .assign_help_request("SBOX-1", Some("jane@example.com"))
            .await;
    }

    #[tokio::test]
    async fn test_add_label() {
        let ctx = TestContext::new().await;

        Mock::given(method("PUT"))
            .and(path(format!("{}/issue/SBOX-1", API)))
            .and(body_json(json!({
                "update": { "labels": [{ "add": "resolution-needs-more-info" }] }
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&ctx.server)
            .await;

        ctx.adapter.add_label("SBOX-1", "Needs More Info").await;
    }

    #[tokio::test]
    async fn test_resolve_comment() {
        let ctx = TestContext::new().await;

        Mock::given(method("POST"))
            .and(path(format!("{}/issue/SBOX-1/comment", API)))
            .and(body_json(json!({
                "body": "h6. Resolution\n*What was the issue?*: Expired cert\n*Where was the issue?*: AAT\n*How was it resolved?*: Renewed"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "1" })))
            .expect(1)
            .mount(&ctx.server)
            .await;

        ctx.adapter
            .add_comment_to_help_request_resolve(
                "SBOX-1",
                &ResolveFields::new("Expired cert", "AAT", "Renewed"),
            )
            .await;
    }

    #[tokio::test]
    async fn test_comment_failure_is_swallowed() {
        let ctx = TestContext::new().await;

        Mock::given(method("POST"))
            .and(path(format!("{}/issue/SBOX-1/comment", API)))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&ctx.server)
            .await;

        ctx.adapter
            .add_comment_to_help_request("SBOX-1", &MessageFields::new().with_field("Note", "hi"))
            .await;
    }
}
