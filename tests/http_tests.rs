//! End-to-end tests of the HTTP surface against the real route table.

use actix_web::{App, http::StatusCode, test, web};
use futures_util::future::join_all;
use serde_json::{Value, json};

use math_mcp_server::core::config::FileConfig;
use math_mcp_server::core::registry::initialize_tools;
use math_mcp_server::core::server::{self, AppState};

macro_rules! test_app {
    () => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppState {
                    server_name: "math-mcp-server".to_string(),
                    server_version: "1.0.0".to_string(),
                }))
                .app_data(web::Data::from(initialize_tools(&FileConfig::default())))
                .configure(server::configure),
        )
        .await
    };
}

fn calculate(body: Value) -> test::TestRequest {
    test::TestRequest::post().uri("/calculate").set_json(body)
}

#[actix_rt::test]
async fn health_is_constant() {
    let app = test_app!();
    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "status": "healthy" }));
}

#[actix_rt::test]
async fn root_lists_endpoints() {
    let app = test_app!();
    let req = test::TestRequest::get().uri("/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "running");
    assert_eq!(body["version"], "1.0.0");
    assert_eq!(body["endpoints"]["calculate"], "/calculate");
}

#[actix_rt::test]
async fn multiply_end_to_end() {
    let app = test_app!();
    let req = calculate(json!({ "operation": "multiply", "a": 156, "b": 234 })).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({ "result": 36504.0, "message": "156.0 × 234.0 = 36504.0" })
    );
}

#[actix_rt::test]
async fn sqrt_end_to_end() {
    let app = test_app!();
    let req = calculate(json!({ "operation": "sqrt", "value": 625 })).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["result"], 25.0);
}

#[actix_rt::test]
async fn factorial_returns_exact_integer() {
    let app = test_app!();
    let req = calculate(json!({ "operation": "factorial", "n": 5 })).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["result"], 120);
    assert_eq!(body["message"], "5! = 120");
}

#[actix_rt::test]
async fn operation_is_case_insensitive() {
    let app = test_app!();
    let req = calculate(json!({ "operation": "Power", "base": 2, "exponent": 10 })).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["result"], 1024.0);
}

#[actix_rt::test]
async fn divide_by_zero_is_a_client_error() {
    let app = test_app!();
    let req = calculate(json!({ "operation": "divide", "a": 10, "b": 0 })).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Division by zero is not allowed" }));

    // the service keeps answering after a rejected request
    let req = test::TestRequest::get().uri("/health").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn validation_and_domain_errors() {
    let app = test_app!();
    let cases = [
        (json!({ "operation": "modulo", "a": 1, "b": 2 }), "Unknown operation: modulo"),
        (json!({ "operation": "add", "a": 1 }), "Parameter 'b' is required"),
        (json!({ "operation": "add", "a": "1", "b": 2 }), "Parameter 'a' must be a number"),
        (json!({ "a": 1, "b": 2 }), "Parameter 'operation' is required"),
        (
            json!({ "operation": "sqrt", "value": -4 }),
            "Cannot calculate square root of negative number",
        ),
        (
            json!({ "operation": "factorial", "n": -3 }),
            "Factorial is only defined for non-negative integers",
        ),
        (
            json!({ "operation": "factorial", "n": 2.5 }),
            "Factorial is only defined for non-negative integers",
        ),
    ];

    for (request, message) in cases {
        let req = calculate(request.clone()).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{request}");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], message, "{request}");
    }
}

#[actix_rt::test]
async fn malformed_body_is_a_validation_error() {
    let app = test_app!();
    let req = test::TestRequest::post()
        .uri("/calculate")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON body"));
}

#[actix_rt::test]
async fn tool_listing_is_stable() {
    let app = test_app!();

    for i in 0..3 {
        let req = test::TestRequest::get().uri("/mcp/tools").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let tools = body["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 8);
        assert_eq!(tools[0]["name"], "add");
        assert_eq!(tools[7]["name"], "factorial");
        assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));

        // interleave calculations, including failures
        let req = calculate(json!({ "operation": "divide", "a": i, "b": 0 })).to_request();
        test::call_service(&app, req).await;
        let req = calculate(json!({ "operation": "add", "a": i, "b": 1 })).to_request();
        test::call_service(&app, req).await;
    }
}

#[actix_rt::test]
async fn concurrent_requests_are_independent() {
    let app = test_app!();
    let responses = join_all((0..32).map(|i| {
        let req = calculate(json!({ "operation": "add", "a": i, "b": 1 })).to_request();
        test::call_and_read_body_json::<_, _, Value>(&app, req)
    }))
    .await;

    for (i, body) in responses.into_iter().enumerate() {
        assert_eq!(body["result"], (i + 1) as f64);
    }
}

#[actix_rt::test]
async fn sse_emits_tool_event() {
    let app = test_app!();
    let req = test::TestRequest::get().uri("/sse").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "text/event-stream"
    );

    let body = test::read_body(resp).await;
    let text = std::str::from_utf8(&body).unwrap();
    let payload = text
        .strip_prefix("data: ")
        .and_then(|rest| rest.strip_suffix("\n\n"))
        .unwrap();
    let event: Value = serde_json::from_str(payload).unwrap();
    assert_eq!(event["count"], 8);
}

#[actix_rt::test]
async fn json_rpc_over_http() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/mcp")
        .set_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": { "name": "sqrt", "arguments": { "value": 625 } }
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["id"], 1);
    assert_eq!(body["result"]["isError"], false);

    let req = test::TestRequest::post()
        .uri("/mcp")
        .set_json(json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    let req = test::TestRequest::post()
        .uri("/mcp")
        .set_payload("garbage")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["error"]["code"], -32700);
}
