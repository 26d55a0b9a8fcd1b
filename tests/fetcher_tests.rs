//! Paginated fetcher and transport adapter tests against a mock provider.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use red_team_shell::audit::HttpAuditSink;
use red_team_shell::{Auditor, Error, IdpClient};

fn client_for(server: &MockServer) -> IdpClient {
    IdpClient::new(&format!("{}/api/v1", server.uri()), "tok123")
        .unwrap()
        .with_page_delay(Duration::ZERO)
}

#[tokio::test]
async fn fetcher_follows_next_links_and_preserves_order() {
    let server = MockServer::start().await;
    let base = format!("{}/api/v1", server.uri());

    Mock::given(method("GET"))
        .and(path("/api/v1/users"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Link", format!("<{base}/users-page2>; rel=\"next\"").as_str())
                .set_body_json(json!([{"id": "1"}, {"id": "2"}])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users-page2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Link", format!("<{base}/users-page3>; rel=\"next\"").as_str())
                .set_body_json(json!([{"id": "3"}, {"id": "4"}])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users-page3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "5"}])))
        .expect(1)
        .mount(&server)
        .await;

    let harvest = client_for(&server).get_all(&Auditor::disabled(), "/users", None, "users").await;

    assert!(!harvest.failed());
    let ids: Vec<&str> = harvest.records.iter().map(|r| r["id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["1", "2", "3", "4", "5"]);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn mid_harvest_api_error_preserves_earlier_pages() {
    let server = MockServer::start().await;
    let base = format!("{}/api/v1", server.uri());

    Mock::given(method("GET"))
        .and(path("/api/v1/users"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Link", format!("<{base}/users-page2>; rel=\"next\"").as_str())
                .set_body_json(json!([{"id": "1"}, {"id": "2"}])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users-page2"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "errorCode": "E0000009",
            "errorSummary": "Internal Server Error",
        })))
        .mount(&server)
        .await;

    let harvest = client_for(&server).get_all(&Auditor::disabled(), "/users", None, "users").await;

    assert!(harvest.failed());
    let ids: Vec<&str> = harvest.records.iter().map(|r| r["id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["1", "2"]);

    match harvest.error {
        Some(Error::Api { status, error_code, .. }) => {
            assert_eq!(status, 500);
            assert_eq!(error_code.as_deref(), Some("E0000009"));
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn first_page_failure_is_distinct_from_a_legitimately_empty_collection() {
    let failing = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "errorCode": "E0000006",
            "errorSummary": "You do not have permission to perform the requested action",
        })))
        .mount(&failing)
        .await;

    let harvest = client_for(&failing).get_all(&Auditor::disabled(), "/users", None, "users").await;
    assert!(harvest.failed());
    assert!(harvest.is_empty());

    let empty = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&empty)
        .await;

    let harvest = client_for(&empty).get_all(&Auditor::disabled(), "/users", None, "users").await;
    assert!(!harvest.failed());
    assert!(harvest.is_empty());
}

#[tokio::test]
async fn transport_failure_returns_empty_records_with_an_error() {
    // Nothing listens on port 1; the adapter exhausts its retries and the
    // harvest aborts with no partial results.
    let client = IdpClient::new("http://127.0.0.1:1/api/v1", "tok123")
        .unwrap()
        .with_page_delay(Duration::ZERO);

    let harvest = client.get_all(&Auditor::disabled(), "/users", None, "users").await;

    assert!(harvest.failed());
    assert!(harvest.is_empty());
    assert!(matches!(harvest.error, Some(Error::Transport(_))));
}

#[tokio::test]
async fn idempotent_requests_are_retried_three_times_at_the_transport_layer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "me"}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = IdpClient::new(&format!("{}/api/v1", server.uri()), "tok123")
        .unwrap()
        .with_request_timeout(Duration::from_millis(100))
        .unwrap();

    let result = client.current_user().await;

    assert!(matches!(result, Err(Error::Transport(_))));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn api_errors_carry_the_provider_error_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/me"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "errorCode": "E0000006",
            "errorSummary": "You do not have permission to perform the requested action",
        })))
        .mount(&server)
        .await;

    match client_for(&server).current_user().await {
        Err(Error::Api { status, reason, error_code, error_summary }) => {
            assert_eq!(status, 403);
            assert_eq!(reason, "Forbidden");
            assert_eq!(error_code.as_deref(), Some("E0000006"));
            assert!(error_summary.unwrap().contains("permission"));
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn requests_carry_the_token_auth_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/me"))
        .and(header("Authorization", "SSWS tok123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "me"})))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client_for(&server).current_user().await.is_ok());
}

#[tokio::test]
async fn audit_sink_failures_do_not_abort_the_harvest() {
    let provider = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "1"}])))
        .mount(&provider)
        .await;

    let audit = MockServer::start().await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(500)).mount(&audit).await;

    let auditor = Auditor::new(Arc::new(HttpAuditSink::new(&audit.uri()).unwrap()));
    let harvest = client_for(&provider).get_all(&auditor, "/users", None, "users").await;

    assert!(!harvest.failed());
    assert_eq!(harvest.len(), 1);
    // The sink did receive the page and summary events even though it
    // rejected them.
    assert!(!audit.received_requests().await.unwrap().is_empty());
}
