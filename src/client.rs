//! Wire-protocol peer: builds requests, sends them, and reads the response
//! with exactly one bounded read.
//!
//! This is the client side of the protocol the server speaks. A response
//! larger than the receive buffer comes back truncated; the caller sees
//! whatever arrived, which is all a single read can promise.

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use url::Url;

use crate::http::headers::Headers;
use crate::http::parser::parse_response;
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::http::writer::serialize_request;

/// Value of the `User-Agent` header stamped on outgoing requests.
pub const USER_AGENT: &str = concat!("hearth-client/", env!("CARGO_PKG_VERSION"));

const RECV_BUFFER_SIZE: usize = 4096;

/// Builds a GET request for the given path.
pub fn get(path: impl Into<String>) -> Request {
    bare(Method::GET, path)
}

/// Builds a HEAD request for the given path.
pub fn head(path: impl Into<String>) -> Request {
    bare(Method::HEAD, path)
}

/// Builds a DELETE request for the given path.
pub fn delete(path: impl Into<String>) -> Request {
    bare(Method::DELETE, path)
}

/// Builds a POST request carrying a JSON body.
pub fn post(path: impl Into<String>, body: &Value) -> Request {
    with_json(Method::POST, path, body)
}

/// Builds a PUT request carrying a JSON body.
pub fn put(path: impl Into<String>, body: &Value) -> Request {
    with_json(Method::PUT, path, body)
}

/// Builds a PATCH request carrying a JSON body.
pub fn patch(path: impl Into<String>, body: &Value) -> Request {
    with_json(Method::PATCH, path, body)
}

fn bare(method: Method, path: impl Into<String>) -> Request {
    Request {
        method,
        path: path.into(),
        version: "HTTP/1.1".to_string(),
        headers: Headers::new(),
        body: String::new(),
    }
}

fn with_json(method: Method, path: impl Into<String>, body: &Value) -> Request {
    let mut request = bare(method, path);
    request.headers.insert("Content-Type", "application/json");
    request.body = body.to_string();
    request
}

/// A client addressed at one server.
pub struct Client {
    host: String,
    port: u16,
}

impl Client {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Builds a client from a URL such as `http://localhost:8080`.
    pub fn from_url(url: &str) -> Result<Self> {
        let url = Url::parse(url).context("invalid server URL")?;
        let host = url.host_str().context("server URL missing host")?.to_string();
        let port = url.port().unwrap_or(80);
        Ok(Self { host, port })
    }

    /// Sends one request over a fresh connection and reads the response
    /// once.
    ///
    /// `Host` and `User-Agent` headers are injected when absent, never
    /// overwritten. The connection closes when this returns; the server
    /// does not reuse connections.
    pub async fn send(&self, request: &Request) -> Result<Response> {
        let mut request = request.clone();
        if request.header("Host").is_none() {
            request
                .headers
                .insert("Host", format!("{}:{}", self.host, self.port));
        }
        if request.header("User-Agent").is_none() {
            request.headers.insert("User-Agent", USER_AGENT);
        }

        let addr = format!("{}:{}", self.host, self.port);
        let mut stream = TcpStream::connect(&addr)
            .await
            .with_context(|| format!("connecting to {addr}"))?;

        stream
            .write_all(serialize_request(&request).as_bytes())
            .await?;
        stream.flush().await?;

        let mut buf = vec![0u8; RECV_BUFFER_SIZE];
        let n = stream.read(&mut buf).await?;

        parse_response(&buf[..n]).map_err(|e| anyhow::anyhow!("malformed response: {e:?}"))
    }
}
