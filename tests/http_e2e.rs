//! Wire-level tests: a real listener driven with an HTTP client.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use httpcapture::app::App;
use httpcapture::config::CaptureConfig;
use httpcapture::storage::{Database, RequestRepository};
use httpcapture::HttpServer;
use serde_json::Value;

async fn spawn_server() -> (SocketAddr, PathBuf) {
    let db_path = std::env::temp_dir().join(format!(
        "httpcapture-e2e-{}.sqlite",
        uuid::Uuid::new_v4()
    ));

    let mut config = CaptureConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.storage.database_path = db_path.display().to_string();

    let database = Database::open(db_path.clone()).expect("open database");
    let repository = Arc::new(RequestRepository::new(database));
    let app = Arc::new(App::new(repository, &config.capture));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");

    let server = HttpServer::new(config, app);
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });

    (addr, db_path)
}

#[tokio::test]
async fn test_webhook_capture_over_the_wire() {
    let (addr, db_path) = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/webhook"))
        .header("X-Forwarded-For", "203.0.113.9")
        .body(r#"{"status":"ok"}"#)
        .send()
        .await
        .expect("server reachable");

    assert_eq!(response.status(), 201);
    assert!(response.headers().contains_key("x-request-id"));

    let payload: Value = response.json().await.expect("JSON body");
    assert_eq!(payload["message"], "Request captured");
    assert_eq!(payload["data"]["path"], "/webhook");
    assert_eq!(payload["data"]["client_ip"], "203.0.113.9");
    assert_eq!(payload["data"]["method"], "POST");

    let listing: Value = client
        .get(format!("http://{addr}/api/requests"))
        .send()
        .await
        .expect("server reachable")
        .json()
        .await
        .expect("JSON body");
    assert_eq!(listing["meta"]["count"], 1);
    assert_eq!(listing["data"][0]["path"], "/webhook");
    // Headers were canonicalized on the way in.
    assert_eq!(listing["data"][0]["headers"]["X-Forwarded-For"], "203.0.113.9");

    let _ = std::fs::remove_file(db_path);
}

#[tokio::test]
async fn test_dashboard_served_at_root() {
    let (addr, db_path) = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{addr}/"))
        .header("Accept", "text/html,application/xhtml+xml")
        .send()
        .await
        .expect("server reachable");

    assert_eq!(response.status(), 200);
    let body = response.text().await.expect("body");
    assert!(body.contains("<!DOCTYPE html>"));

    let _ = std::fs::remove_file(db_path);
}

#[tokio::test]
async fn test_multipart_upload_over_the_wire() {
    let (addr, db_path) = spawn_server().await;
    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new()
        .text("name", "Alice")
        .text("age", "30")
        .part(
            "avatar",
            reqwest::multipart::Part::bytes(vec![0u8; 512])
                .file_name("avatar.png")
                .mime_str("image/png")
                .expect("valid mime"),
        );

    let response = client
        .post(format!("http://{addr}/forms"))
        .multipart(form)
        .send()
        .await
        .expect("server reachable");

    assert_eq!(response.status(), 201);
    let payload: Value = response.json().await.expect("JSON body");
    assert_eq!(payload["data"]["form_data"]["name"], "Alice");
    assert_eq!(payload["data"]["files"]["avatar"]["name"], "avatar.png");
    assert_eq!(payload["data"]["files"]["avatar"]["type"], "image/png");
    assert_eq!(payload["data"]["files"]["avatar"]["size"], 512);

    let body = payload["data"]["body"].as_str().expect("body string");
    let reconstructed: Value = serde_json::from_str(body).expect("body is JSON");
    assert_eq!(reconstructed["form"]["age"], "30");

    let _ = std::fs::remove_file(db_path);
}

#[tokio::test]
async fn test_delete_endpoints_over_the_wire() {
    let (addr, db_path) = spawn_server().await;
    let client = reqwest::Client::new();

    for i in 0..2 {
        client
            .post(format!("http://{addr}/hook-{i}"))
            .body("x")
            .send()
            .await
            .expect("server reachable");
    }

    let missing = client
        .delete(format!("http://{addr}/api/requests/999"))
        .send()
        .await
        .expect("server reachable");
    assert_eq!(missing.status(), 404);

    let deleted = client
        .delete(format!("http://{addr}/api/requests/1"))
        .send()
        .await
        .expect("server reachable");
    assert_eq!(deleted.status(), 200);

    let cleared: Value = client
        .delete(format!("http://{addr}/api/requests"))
        .send()
        .await
        .expect("server reachable")
        .json()
        .await
        .expect("JSON body");
    assert_eq!(cleared["message"], "All requests cleared");

    let listing: Value = client
        .get(format!("http://{addr}/api/requests"))
        .send()
        .await
        .expect("server reachable")
        .json()
        .await
        .expect("JSON body");
    assert_eq!(listing["meta"]["total"], 0);

    let _ = std::fs::remove_file(db_path);
}
