mod common;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use powerbi_mcp::mcp::envelope::{envelope_error, envelope_text};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn list_workspaces_formats_a_bulleted_listing() {
    let mock = MockServer::start().await;
    common::mount_token(&mock, "tok").await;
    Mock::given(method("GET"))
        .and(path("/v1.0/myorg/groups"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": [
            {"id": "A1", "name": "Sales"},
            {"id": "B2", "name": "Ops"}
        ]})))
        .mount(&mock)
        .await;

    let server = common::server(common::settings(&mock));
    let envelope = server.handle_tool_call("list_workspaces", json!({})).await;
    assert_eq!(
        envelope,
        json!({"content": [{"type": "text", "text": "Found 2 workspaces:\n\n• Sales (ID: A1)\n• Ops (ID: B2)\n"}]})
    );
}

#[tokio::test]
async fn empty_listings_have_fixed_messages() {
    let mock = MockServer::start().await;
    common::mount_token(&mock, "tok").await;
    Mock::given(method("GET"))
        .and(path("/v1.0/myorg/groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1.0/myorg/groups/A1/datasets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock)
        .await;

    let server = common::server(common::settings(&mock));
    let workspaces = server.handle_tool_call("list_workspaces", json!({})).await;
    assert_eq!(envelope_text(&workspaces), Some("No workspaces found"));
    let datasets = server
        .handle_tool_call("list_datasets", json!({"workspace_id": "A1"}))
        .await;
    assert_eq!(
        envelope_text(&datasets),
        Some("No datasets found in this workspace")
    );
}

#[tokio::test]
async fn list_datasets_without_workspace_makes_no_network_call() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::token_body("tok")))
        .expect(0)
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .expect(0)
        .mount(&mock)
        .await;

    let server = common::server(common::settings(&mock));
    let envelope = server.handle_tool_call("list_datasets", json!({})).await;
    assert_eq!(
        envelope,
        json!({"error": "Missing required argument for list_datasets: workspace_id"})
    );
}

#[tokio::test]
async fn dax_query_returns_pretty_tables_of_the_first_result() {
    let mock = MockServer::start().await;
    common::mount_token(&mock, "tok").await;
    let tables = json!([{"rows": [{"Sales[Region]": "EU", "[Total]": 1200}]}]);
    Mock::given(method("POST"))
        .and(path("/v1.0/myorg/groups/W1/datasets/D1/executeQueries"))
        .and(body_json(json!({"queries": [{"query": "EVALUATE Sales"}]})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"results": [{"tables": tables}]})),
        )
        .mount(&mock)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1.0/myorg/groups/W1/datasets/EMPTY/executeQueries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&mock)
        .await;

    let server = common::server(common::settings(&mock));
    let envelope = server
        .handle_tool_call(
            "execute_dax_query",
            json!({"workspace_id": "W1", "dataset_id": "D1", "query": "EVALUATE Sales"}),
        )
        .await;
    let text = envelope_text(&envelope).expect("text");
    assert_eq!(text, serde_json::to_string_pretty(&tables).expect("pretty"));

    let empty = server
        .handle_tool_call(
            "execute_dax_query",
            json!({"workspace_id": "W1", "dataset_id": "EMPTY", "query": "EVALUATE Sales"}),
        )
        .await;
    assert_eq!(envelope_text(&empty), Some("No data returned"));
}

#[tokio::test]
async fn model_definition_polls_then_renders_only_tmdl_parts() {
    let mock = MockServer::start().await;
    common::mount_token(&mock, "tok").await;
    Mock::given(method("POST"))
        .and(path("/v1/workspaces/W1/semanticModels/D1/getDefinition"))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header("Location", "/op/1")
                .insert_header("Retry-After", "0"),
        )
        .expect(1)
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/op/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Running"})))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/op/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Succeeded"})))
        .expect(1)
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/op/1/result"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "definition": {"parts": [
                {"path": "definition/tables/Sales.tmdl", "payload": STANDARD.encode("table Sales\n\tcolumn Region"), "payloadType": "InlineBase64"},
                {"path": "definition.pbism", "payload": STANDARD.encode(r#"{"version":"4.0"}"#), "payloadType": "InlineBase64"}
            ]}
        })))
        .expect(1)
        .mount(&mock)
        .await;

    let server = common::server(common::settings(&mock));
    let envelope = server
        .handle_tool_call(
            "get_model_definition",
            json!({"workspace_id": "W1", "dataset_id": "D1"}),
        )
        .await;
    let text = envelope_text(&envelope).expect("text");
    assert!(text.starts_with("Dataset Model Definition (TMDL Format)\n"));
    assert!(text.contains("File: definition/tables/Sales.tmdl\n"));
    assert!(text.contains("table Sales\n\tcolumn Region"));
    assert!(!text.contains("definition.pbism"));
    assert!(!text.contains("version"));
}

#[tokio::test]
async fn model_definition_reports_missing_dataset_id() {
    let mock = MockServer::start().await;
    let server = common::server(common::settings(&mock));
    let envelope = server
        .handle_tool_call("get_model_definition", json!({"workspace_id": "W1"}))
        .await;
    assert_eq!(
        envelope_error(&envelope),
        Some("Missing required argument for get_model_definition: dataset_id")
    );
}

#[tokio::test]
async fn api_failure_becomes_an_error_envelope_and_service_keeps_working() {
    let mock = MockServer::start().await;
    common::mount_token(&mock, "tok").await;
    Mock::given(method("GET"))
        .and(path("/v1.0/myorg/groups/BAD/datasets"))
        .respond_with(ResponseTemplate::new(404).set_body_string("PowerBIEntityNotFound"))
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1.0/myorg/groups/GOOD/datasets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": [
            {"id": "D1", "name": "Revenue"}
        ]})))
        .mount(&mock)
        .await;

    let server = common::server(common::settings(&mock));
    let failed = server
        .handle_tool_call("list_datasets", json!({"workspace_id": "BAD"}))
        .await;
    assert_eq!(
        envelope_error(&failed),
        Some("HTTP 404: PowerBIEntityNotFound")
    );

    let ok = server
        .handle_tool_call("list_datasets", json!({"workspace_id": "GOOD"}))
        .await;
    assert_eq!(
        envelope_text(&ok),
        Some("Found 1 datasets:\n\n• Revenue (ID: D1)\n")
    );
}

#[tokio::test]
async fn test_connection_forces_a_fresh_exchange() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::token_body("tok")))
        .expect(2)
        .mount(&mock)
        .await;

    let server = common::server(common::settings(&mock));
    for _ in 0..2 {
        let envelope = server.handle_tool_call("test_connection", json!({})).await;
        assert_eq!(
            envelope_text(&envelope),
            Some("Authentication successful! Token obtained and ready to use.")
        );
    }
}
