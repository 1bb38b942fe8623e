use crate::http::headers::Headers;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, StatusCode};

#[derive(Debug)]
pub enum ParseError {
    InvalidRequestLine,
    InvalidMethod,
    InvalidStatusLine,
    InvalidEncoding,
    Incomplete,
}

/// Parses an HTTP request from a byte buffer.
///
/// Returns the request and the number of bytes consumed. `Incomplete` means
/// the buffer does not yet hold a full message (headers not terminated, or
/// fewer body bytes than Content-Length declares) and the caller should read
/// more; every other error is a client-visible 400.
///
/// The body is everything after the header-terminating empty line. A
/// declared Content-Length acts only as a lower bound before parsing
/// succeeds; the body is never truncated to it.
pub fn parse_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    let headers_end = find_headers_end(buf).ok_or(ParseError::Incomplete)?;
    let header_bytes = &buf[..headers_end];
    let body_bytes = &buf[headers_end + 4..];

    let headers_str =
        std::str::from_utf8(header_bytes).map_err(|_| ParseError::InvalidEncoding)?;

    let mut lines = headers_str.split("\r\n");

    // Request line: exactly three space-separated tokens
    let request_line = lines.next().ok_or(ParseError::InvalidRequestLine)?;
    let parts: Vec<&str> = request_line.split(' ').collect();
    if parts.len() != 3 {
        return Err(ParseError::InvalidRequestLine);
    }

    let method = Method::from_str(parts[0]).ok_or(ParseError::InvalidMethod)?;
    let path = parts[1];
    let version = parts[2];

    // Headers: lines without a colon are skipped, duplicates overwrite
    let mut headers = Headers::new();
    for line in lines {
        if let Some((key, value)) = line.split_once(':') {
            headers.insert(key.trim(), value.trim());
        }
    }

    let content_length = headers
        .get("Content-Length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);

    if body_bytes.len() < content_length {
        return Err(ParseError::Incomplete);
    }

    let body =
        String::from_utf8(body_bytes.to_vec()).map_err(|_| ParseError::InvalidEncoding)?;

    let request = Request {
        method,
        path: path.to_string(),
        version: version.to_string(),
        headers,
        body,
    };

    Ok((request, buf.len()))
}

/// Parses an HTTP response from a byte buffer.
///
/// The symmetric operation to [`parse_request`], used by the client side.
/// No body-completeness check is performed: the client reads once and
/// renders whatever arrived, so a truncated body stays truncated.
pub fn parse_response(buf: &[u8]) -> Result<Response, ParseError> {
    let headers_end = find_headers_end(buf).ok_or(ParseError::Incomplete)?;
    let header_bytes = &buf[..headers_end];
    let body_bytes = &buf[headers_end + 4..];

    let headers_str =
        std::str::from_utf8(header_bytes).map_err(|_| ParseError::InvalidEncoding)?;

    let mut lines = headers_str.split("\r\n");

    // Status line: "HTTP/1.1 200 OK" (reason phrase may contain spaces)
    let status_line = lines.next().ok_or(ParseError::InvalidStatusLine)?;
    let mut parts = status_line.splitn(3, ' ');
    let _version = parts.next().ok_or(ParseError::InvalidStatusLine)?;
    let code = parts
        .next()
        .and_then(|c| c.parse::<u16>().ok())
        .ok_or(ParseError::InvalidStatusLine)?;
    let status = StatusCode::from_u16(code).ok_or(ParseError::InvalidStatusLine)?;

    let mut headers = Headers::new();
    for line in lines {
        if let Some((key, value)) = line.split_once(':') {
            headers.insert(key.trim(), value.trim());
        }
    }

    let body = String::from_utf8_lossy(body_bytes).into_owned();

    Ok(Response {
        status,
        headers,
        body,
    })
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";

        let (parsed, consumed) = parse_request(req).unwrap();

        assert_eq!(parsed.path, "/");
        assert_eq!(parsed.headers.get("Host").unwrap(), "example.com");
        assert_eq!(consumed, req.len());
    }

    #[test]
    fn parse_simple_response() {
        let raw = b"HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\n\r\nFile not found: /x";

        let parsed = parse_response(raw).unwrap();

        assert_eq!(parsed.status, StatusCode::NotFound);
        assert_eq!(parsed.body, "File not found: /x");
    }
}
