//! End-to-end tests: a real listener on an ephemeral port, driven over TCP
//! with the crate's own client.

use std::fs;

use serde_json::json;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use hearth::client::{self, Client};
use hearth::config::Config;
use hearth::http::response::StatusCode;
use hearth::server::Server;

const INDEX_HTML: &str = "<h1>Welcome</h1>";
const ABOUT_HTML: &str = "<h1>About us</h1>";
const HANGUL: &str = "안녕하세요";

struct TestServer {
    client: Client,
    addr: std::net::SocketAddr,
}

fn test_config(dir: &TempDir) -> Config {
    let static_root = dir.path().join("static");
    fs::create_dir_all(&static_root).unwrap();
    fs::write(static_root.join("index.html"), INDEX_HTML).unwrap();
    fs::write(static_root.join("about.html"), ABOUT_HTML).unwrap();
    fs::write(static_root.join("hangul.html"), HANGUL).unwrap();

    let mut cfg = Config::default();
    cfg.server.listen_addr = "127.0.0.1:0".to_string();
    cfg.static_files.root = static_root;
    cfg.store.path = dir.path().join("users.json");
    cfg
}

fn start_with(cfg: &Config) -> TestServer {
    let server = Server::bind(cfg).unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());

    TestServer {
        client: Client::new("127.0.0.1", addr.port()),
        addr,
    }
}

fn start(dir: &TempDir) -> TestServer {
    start_with(&test_config(dir))
}

#[tokio::test]
async fn test_get_root_serves_index_page() {
    let dir = TempDir::new().unwrap();
    let server = start(&dir);

    let resp = server.client.send(&client::get("/")).await.unwrap();

    assert_eq!(resp.status, StatusCode::Ok);
    assert_eq!(resp.headers.get("Content-Type").unwrap(), "text/html");
    assert_eq!(resp.body, INDEX_HTML);
}

#[tokio::test]
async fn test_create_then_list_user() {
    let dir = TempDir::new().unwrap();
    let server = start(&dir);

    let created = server
        .client
        .send(&client::post("/users", &json!({"name": "Kim"})))
        .await
        .unwrap();

    assert_eq!(created.status, StatusCode::Created);
    let created_body: serde_json::Value = serde_json::from_str(&created.body).unwrap();
    assert_eq!(
        created_body,
        json!({"message": "User created", "user": {"name": "Kim", "id": 1}})
    );

    let listed = server.client.send(&client::get("/users")).await.unwrap();
    assert_eq!(listed.status, StatusCode::Ok);
    let listed_body: serde_json::Value = serde_json::from_str(&listed.body).unwrap();
    assert_eq!(listed_body, json!({"users": [{"name": "Kim", "id": 1}]}));
}

#[tokio::test]
async fn test_delete_unknown_user_mentions_id() {
    let dir = TempDir::new().unwrap();
    let server = start(&dir);

    let resp = server
        .client
        .send(&client::delete("/users/999"))
        .await
        .unwrap();

    assert_eq!(resp.status, StatusCode::NotFound);
    assert!(resp.body.contains("999"));
}

#[tokio::test]
async fn test_get_about_without_extension() {
    let dir = TempDir::new().unwrap();
    let server = start(&dir);

    let resp = server.client.send(&client::get("/about")).await.unwrap();

    assert_eq!(resp.status, StatusCode::Ok);
    assert_eq!(resp.body, ABOUT_HTML);
}

#[tokio::test]
async fn test_content_length_counts_utf8_bytes() {
    let dir = TempDir::new().unwrap();
    let server = start(&dir);

    let resp = server
        .client
        .send(&client::get("/hangul.html"))
        .await
        .unwrap();

    assert_eq!(resp.status, StatusCode::Ok);
    assert_eq!(resp.body, HANGUL);

    let content_length: usize = resp
        .headers
        .get("Content-Length")
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(content_length, HANGUL.len());
    assert_ne!(content_length, HANGUL.chars().count());
}

#[tokio::test]
async fn test_sequential_posts_assign_increasing_ids() {
    let dir = TempDir::new().unwrap();
    let server = start(&dir);

    for expected_id in 1..=4u64 {
        let resp = server
            .client
            .send(&client::post("/users", &json!({"name": "user"})))
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_str(&resp.body).unwrap();
        assert_eq!(body["user"]["id"], expected_id);
    }
}

#[tokio::test]
async fn test_put_is_idempotent_over_the_wire() {
    let dir = TempDir::new().unwrap();
    let server = start(&dir);

    server
        .client
        .send(&client::post("/users", &json!({"name": "Kim"})))
        .await
        .unwrap();

    let update = client::put("/users/1", &json!({"name": "Lee"}));
    let first = server.client.send(&update).await.unwrap();
    let second = server.client.send(&update).await.unwrap();

    assert_eq!(first.status, StatusCode::Ok);
    assert_eq!(second.status, StatusCode::Ok);
    let first_body: serde_json::Value = serde_json::from_str(&first.body).unwrap();
    let second_body: serde_json::Value = serde_json::from_str(&second.body).unwrap();
    assert_eq!(first_body, second_body);
}

#[tokio::test]
async fn test_head_returns_headers_without_body() {
    let dir = TempDir::new().unwrap();
    let server = start(&dir);

    let resp = server.client.send(&client::head("/")).await.unwrap();

    assert_eq!(resp.status, StatusCode::Ok);
    assert_eq!(resp.headers.get("Content-Type").unwrap(), "text/html");
    assert_eq!(resp.body, "");
}

#[tokio::test]
async fn test_responses_identify_the_server() {
    let dir = TempDir::new().unwrap();
    let server = start(&dir);

    let resp = server.client.send(&client::get("/")).await.unwrap();

    assert!(resp.headers.get("Server").unwrap().starts_with("hearth/"));
    assert!(resp.headers.get("Date").unwrap().ends_with(" GMT"));
}

#[tokio::test]
async fn test_malformed_request_line_gets_400() {
    let dir = TempDir::new().unwrap();
    let server = start(&dir);

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.write_all(b"NONSENSE\r\n\r\n").await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let raw = String::from_utf8_lossy(&raw);

    assert!(raw.starts_with("HTTP/1.1 400 Bad Request\r\n"));
}

#[tokio::test]
async fn test_unknown_method_gets_400() {
    let dir = TempDir::new().unwrap();
    let server = start(&dir);

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.write_all(b"FETCH / HTTP/1.1\r\n\r\n").await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();

    assert!(String::from_utf8_lossy(&raw).starts_with("HTTP/1.1 400 Bad Request\r\n"));
}

#[tokio::test]
async fn test_oversized_request_gets_400() {
    let dir = TempDir::new().unwrap();
    let mut cfg = test_config(&dir);
    cfg.server.max_request_size = 2048;
    let server = start_with(&cfg);

    // Headers that never terminate, past the size cap
    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.write_all(&vec![b'X'; 4096]).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();

    assert!(String::from_utf8_lossy(&raw).starts_with("HTTP/1.1 400 Bad Request\r\n"));
}

#[tokio::test]
async fn test_connection_closes_after_one_response() {
    let dir = TempDir::new().unwrap();
    let server = start(&dir);

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();

    // read_to_end only returns once the server has closed the connection
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();

    assert!(String::from_utf8_lossy(&raw).starts_with("HTTP/1.1 200 OK\r\n"));
}

#[tokio::test]
async fn test_early_disconnect_leaves_server_healthy() {
    let dir = TempDir::new().unwrap();
    let server = start(&dir);

    // Connect and leave without sending a request
    let stream = TcpStream::connect(server.addr).await.unwrap();
    drop(stream);

    let resp = server.client.send(&client::get("/")).await.unwrap();
    assert_eq!(resp.status, StatusCode::Ok);
}

#[tokio::test]
async fn test_patch_updates_one_field_over_the_wire() {
    let dir = TempDir::new().unwrap();
    let server = start(&dir);

    server
        .client
        .send(&client::post("/users", &json!({"name": "Kim", "role": "user"})))
        .await
        .unwrap();

    let resp = server
        .client
        .send(&client::patch("/users/1", &json!({"name": "Lee"})))
        .await
        .unwrap();

    assert_eq!(resp.status, StatusCode::Ok);
    let body: serde_json::Value = serde_json::from_str(&resp.body).unwrap();
    assert_eq!(
        body,
        json!({"message": "User patched", "user": {"name": "Lee", "role": "user", "id": 1}})
    );
}

#[tokio::test]
async fn test_client_addressed_by_url() {
    let dir = TempDir::new().unwrap();
    let server = start(&dir);

    let by_url = Client::from_url(&format!("http://127.0.0.1:{}", server.addr.port())).unwrap();
    let resp = by_url.send(&client::get("/")).await.unwrap();

    assert_eq!(resp.status, StatusCode::Ok);
    assert_eq!(resp.body, INDEX_HTML);
}

#[tokio::test]
async fn test_missing_asset_gets_404_over_the_wire() {
    let dir = TempDir::new().unwrap();
    let server = start(&dir);

    let resp = server.client.send(&client::get("/nothing")).await.unwrap();

    assert_eq!(resp.status, StatusCode::NotFound);
    assert_eq!(resp.body, "File not found: /nothing.html");
}
