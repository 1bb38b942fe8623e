use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::http::request::Request;
use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Serializes a response to its wire form: status line, headers in
/// insertion order, blank line, body.
///
/// If the body is non-empty and no explicit Content-Length was set, one is
/// emitted with the UTF-8 byte length of the body (not the character count).
pub fn serialize_response(resp: &Response) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    ));

    for (key, value) in resp.headers.iter() {
        out.push_str(&format!("{key}: {value}\r\n"));
    }

    if !resp.body.is_empty() && !resp.headers.contains_key("Content-Length") {
        out.push_str(&format!("Content-Length: {}\r\n", resp.body.len()));
    }

    out.push_str("\r\n");
    out.push_str(&resp.body);

    out
}

/// Serializes a request to its wire form, mirroring [`serialize_response`].
pub fn serialize_request(req: &Request) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} {} {}\r\n",
        req.method.as_str(),
        req.path,
        req.version
    ));

    for (key, value) in req.headers.iter() {
        out.push_str(&format!("{key}: {value}\r\n"));
    }

    if !req.body.is_empty() && !req.headers.contains_key("Content-Length") {
        out.push_str(&format!("Content-Length: {}\r\n", req.body.len()));
    }

    out.push_str("\r\n");
    out.push_str(&req.body);

    out
}

/// Owns a serialized response and writes it to the peer, resuming across
/// short writes.
pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            buffer: serialize_response(response).into_bytes(),
            written: 0,
        }
    }

    pub async fn write_to_stream(&mut self, stream: &mut TcpStream) -> anyhow::Result<()> {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        Ok(())
    }
}
