//! End-to-end dispatcher scenarios, driven through `App::handle`.

use httpcapture::capture::files::{UploadField, Uploads};
use serde_json::{json, Map, Value};

mod common;

use common::{transport, TestApp};

fn parse(body: &str) -> Value {
    serde_json::from_str(body).expect("response body is JSON")
}

async fn capture(app: &TestApp, method: &str, target: &str, body: &str) -> Value {
    let response = app
        .app
        .handle(
            transport(method, target, &[("Host", "example.test")]),
            body.to_string(),
            Map::new(),
            Map::new(),
            Uploads::new(),
        )
        .await;
    parse(response.body())
}

#[tokio::test]
async fn test_captures_request_and_lists_it() {
    let app = TestApp::new();

    let response = app
        .app
        .handle(
            transport(
                "POST",
                "/webhook",
                &[
                    ("Host", "example.test"),
                    ("X-Forwarded-For", "203.0.113.9"),
                ],
            ),
            r#"{"status":"ok"}"#.to_string(),
            Map::new(),
            Map::new(),
            Uploads::new(),
        )
        .await;

    assert_eq!(response.status().as_u16(), 201);
    let payload = parse(response.body());
    assert_eq!(payload["message"], "Request captured");
    assert_eq!(payload["data"]["path"], "/webhook");
    assert_eq!(payload["data"]["client_ip"], "203.0.113.9");
    assert_eq!(payload["data"]["full_url"], "http://example.test/webhook");

    let list = app
        .app
        .handle(
            transport("GET", "/api/requests", &[]),
            String::new(),
            Map::new(),
            Map::new(),
            Uploads::new(),
        )
        .await;

    assert_eq!(list.status().as_u16(), 200);
    let listing = parse(list.body());
    assert_eq!(listing["meta"]["count"], 1);
    assert_eq!(listing["data"][0]["path"], "/webhook");
}

#[tokio::test]
async fn test_browser_navigation_returns_dashboard_without_capture() {
    let app = TestApp::new();

    let response = app
        .app
        .handle(
            transport(
                "GET",
                "/dashboard",
                &[("Accept", "text/html,application/xhtml+xml")],
            ),
            String::new(),
            Map::new(),
            Map::new(),
            Uploads::new(),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    assert!(response.content_type().starts_with("text/html"));
    assert!(response.body().contains("<!DOCTYPE html>"));

    let listing = capture(&app, "GET", "/api/requests", "").await;
    assert_eq!(listing["meta"]["count"], 0);
}

#[tokio::test]
async fn test_delete_all_resets_ids() {
    let app = TestApp::new();

    let first = capture(&app, "POST", "/capture-one", "first").await;
    assert_eq!(first["data"]["id"], 1);

    let cleared = capture(&app, "DELETE", "/api/requests", "").await;
    assert_eq!(cleared["message"], "All requests cleared");

    let second = capture(&app, "POST", "/capture-two", "second").await;
    assert_eq!(second["data"]["id"], 1);
}

#[tokio::test]
async fn test_multipart_form_body_is_reconstructed() {
    let app = TestApp::new();

    let mut form = Map::new();
    form.insert("name".into(), json!("Alice"));
    form.insert("age".into(), json!("30"));

    let mut uploads = Uploads::new();
    uploads.insert_field(
        "avatar",
        UploadField {
            name: json!("avatar.png"),
            content_type: json!("image/png"),
            size: json!(512),
            error: json!(0),
        },
    );

    let response = app
        .app
        .handle(
            transport(
                "POST",
                "/forms",
                &[
                    ("Host", "example.test"),
                    (
                        "Content-Type",
                        "multipart/form-data; boundary=----WebKitFormBoundary",
                    ),
                ],
            ),
            String::new(),
            Map::new(),
            form,
            uploads,
        )
        .await;

    assert_eq!(response.status().as_u16(), 201);
    let payload = parse(response.body());
    assert_eq!(payload["data"]["form_data"]["name"], "Alice");
    assert_eq!(payload["data"]["files"]["avatar"]["name"], "avatar.png");
    assert_eq!(payload["data"]["files"]["avatar"]["size"], 512);

    let body = payload["data"]["body"].as_str().expect("body is a string");
    let reconstructed: Value = serde_json::from_str(body).expect("body is JSON");
    assert_eq!(reconstructed["form"]["age"], "30");
}

#[tokio::test]
async fn test_pagination_metadata() {
    let app = TestApp::new();

    for i in 1..=3 {
        capture(&app, "POST", &format!("/page-test-{i}"), &format!("body-{i}")).await;
    }

    let listing = capture(&app, "GET", "/api/requests?page=1&per_page=2", "").await;
    assert_eq!(listing["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(listing["meta"]["total"], 3);
    assert_eq!(listing["meta"]["last_page"], 2);
    assert_eq!(listing["meta"]["per_page"], 2);

    // Newest first: page 2 holds the oldest record.
    let tail = capture(&app, "GET", "/api/requests?page=2&per_page=2", "").await;
    assert_eq!(tail["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(tail["data"][0]["path"], "/page-test-1");
}

#[tokio::test]
async fn test_pagination_clamps_malformed_input() {
    let app = TestApp::new();

    capture(&app, "POST", "/solo", "x").await;

    let listing = capture(
        &app,
        "GET",
        "/api/requests?page=abc&per_page=100000",
        "",
    )
    .await;
    assert_eq!(listing["meta"]["page"], 1);
    assert_eq!(listing["meta"]["per_page"], 100);
    assert_eq!(listing["meta"]["last_page"], 1);
}

#[tokio::test]
async fn test_get_fallback_stores_and_returns_ok() {
    let app = TestApp::new();

    let response = capture(&app, "GET", "/healthz", "").await;
    assert_eq!(response["message"], "OK");

    let listing = capture(&app, "GET", "/api/requests", "").await;
    assert_eq!(listing["data"][0]["path"], "/healthz");
    assert_eq!(listing["data"][0]["method"], "GET");
    assert_eq!(listing["data"][0]["body"], "");
}

#[tokio::test]
async fn test_show_and_destroy_lifecycle() {
    let app = TestApp::new();

    let created = capture(&app, "POST", "/to-inspect", "payload").await;
    let id = created["data"]["id"].as_i64().expect("record id");

    let shown = capture(&app, "GET", &format!("/api/requests/{id}"), "").await;
    assert_eq!(shown["data"]["path"], "/to-inspect");
    assert_eq!(shown["data"]["body"], "payload");

    let deleted = capture(&app, "DELETE", &format!("/api/requests/{id}"), "").await;
    assert_eq!(deleted["message"], "Request deleted");
    assert_eq!(deleted["data"]["id"], id);

    let app_ref = &app.app;
    let missing = app_ref
        .handle(
            transport("GET", &format!("/api/requests/{id}"), &[]),
            String::new(),
            Map::new(),
            Map::new(),
            Uploads::new(),
        )
        .await;
    assert_eq!(missing.status().as_u16(), 404);
    assert_eq!(parse(missing.body())["message"], "Request not found");
}

#[tokio::test]
async fn test_unknown_api_route_is_404_not_capture() {
    let app = TestApp::new();

    let response = app
        .app
        .handle(
            transport("GET", "/api/unknown", &[]),
            String::new(),
            Map::new(),
            Map::new(),
            Uploads::new(),
        )
        .await;

    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(parse(response.body())["message"], "Route not found");

    let listing = capture(&app, "GET", "/api/requests", "").await;
    assert_eq!(listing["meta"]["count"], 0);
}

#[tokio::test]
async fn test_noise_paths_are_filtered() {
    let app = TestApp::new();

    let response = capture(&app, "GET", "/favicon.ico", "").await;
    assert_eq!(response["message"], "OK");

    let listing = capture(&app, "GET", "/api/requests", "").await;
    assert_eq!(listing["meta"]["count"], 0);
}
