mod common;

use powerbi_mcp::errors::ToolErrorKind;
use powerbi_mcp::services::executor::{ApiExecutor, OperationHandle};
use powerbi_mcp::services::poller::OperationPoller;
use powerbi_mcp::services::token::TokenManager;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn poller(mock: &MockServer, max_attempts: u32) -> OperationPoller {
    let client = Client::new();
    let tokens = Arc::new(TokenManager::new(
        common::quiet_logger(),
        client.clone(),
        Ok(common::credential()),
        common::endpoints(mock),
    ));
    let executor = Arc::new(ApiExecutor::new(
        common::quiet_logger(),
        client,
        tokens,
        Duration::ZERO,
    ));
    OperationPoller::new(common::quiet_logger(), executor, max_attempts)
}

fn handle(mock: &MockServer) -> OperationHandle {
    OperationHandle {
        status_url: url::Url::parse(&format!("{}/op/7", mock.uri())).expect("url"),
        poll_interval: Duration::ZERO,
    }
}

#[tokio::test]
async fn never_finishing_operation_times_out_after_the_bound() {
    let mock = MockServer::start().await;
    common::mount_token(&mock, "tok").await;
    Mock::given(method("GET"))
        .and(path("/op/7"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "Running"})),
        )
        .expect(3)
        .mount(&mock)
        .await;

    let err = poller(&mock, 3)
        .await_completion(&handle(&mock))
        .await
        .expect_err("must time out");
    assert_eq!(err.kind, ToolErrorKind::Timeout);
    assert_eq!(err.message, "Operation timed out after 3 status checks");
}

#[tokio::test]
async fn missing_status_field_keeps_polling() {
    let mock = MockServer::start().await;
    common::mount_token(&mock, "tok").await;
    Mock::given(method("GET"))
        .and(path("/op/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .up_to_n_times(1)
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/op/7"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "Succeeded"})),
        )
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/op/7/result"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"definition": {"parts": []}})),
        )
        .expect(1)
        .mount(&mock)
        .await;

    let result = poller(&mock, 5)
        .await_completion(&handle(&mock))
        .await
        .expect("result");
    assert_eq!(result["definition"]["parts"], serde_json::json!([]));
}

#[tokio::test]
async fn failed_operation_surfaces_the_embedded_error() {
    let mock = MockServer::start().await;
    common::mount_token(&mock, "tok").await;
    Mock::given(method("GET"))
        .and(path("/op/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "Failed",
            "error": {"errorCode": "InvalidItem", "message": "Semantic model is not supported"}
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let err = poller(&mock, 5)
        .await_completion(&handle(&mock))
        .await
        .expect_err("must fail");
    assert_eq!(err.kind, ToolErrorKind::Api);
    assert_eq!(err.message, "Operation failed: Semantic model is not supported");
}

#[tokio::test]
async fn status_check_http_error_is_reported() {
    let mock = MockServer::start().await;
    common::mount_token(&mock, "tok").await;
    Mock::given(method("GET"))
        .and(path("/op/7"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such operation"))
        .expect(1)
        .mount(&mock)
        .await;

    let err = poller(&mock, 5)
        .await_completion(&handle(&mock))
        .await
        .expect_err("must fail");
    assert_eq!(err.status, Some(404));
    assert_eq!(
        err.message,
        "Failed to check status: HTTP 404: no such operation"
    );
}
