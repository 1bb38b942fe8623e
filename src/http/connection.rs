use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

use crate::http::parser::{ParseError, parse_request};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;
use crate::router::Router;

pub struct Connection {
    stream: TcpStream,
    buffer: BytesMut,
    state: ConnectionState,
    router: Arc<Router>,
    recv_buffer_size: usize,
    max_request_size: usize,
}

pub enum ConnectionState {
    Reading,
    Handling(Request),
    Writing(ResponseWriter),
    Closed,
}

/// Outcome of the read phase.
enum ReadOutcome {
    /// A complete, well-formed request
    Request(Box<Request>),
    /// Peer closed before sending anything; close without responding
    PeerClosed,
    /// Malformed, oversized, or truncated input; answer 400 without routing
    Malformed,
}

impl Connection {
    pub fn new(
        stream: TcpStream,
        router: Arc<Router>,
        recv_buffer_size: usize,
        max_request_size: usize,
    ) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(recv_buffer_size),
            state: ConnectionState::Reading,
            router,
            recv_buffer_size,
            max_request_size,
        }
    }

    /// Serves exactly one request, then closes.
    ///
    /// The socket is closed on every exit path: success, parse failure,
    /// handler error, and write failure alike (it drops with the
    /// connection).
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match &mut self.state {
                ConnectionState::Reading => match self.read_request().await? {
                    ReadOutcome::Request(req) => {
                        self.state = ConnectionState::Handling(*req);
                    }
                    ReadOutcome::PeerClosed => {
                        self.state = ConnectionState::Closed;
                    }
                    ReadOutcome::Malformed => {
                        let response = Response::bad_request("Bad Request");
                        self.state = ConnectionState::Writing(ResponseWriter::new(&response));
                    }
                },

                ConnectionState::Handling(req) => {
                    let response = self.router.handle(req).await;

                    tracing::info!(
                        status = response.status.as_u16(),
                        method = req.method.as_str(),
                        path = %req.path,
                        "request handled"
                    );

                    self.state = ConnectionState::Writing(ResponseWriter::new(&response));
                }

                ConnectionState::Writing(writer) => {
                    writer.write_to_stream(&mut self.stream).await?;
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Accumulates bounded reads until the parser stops reporting
    /// `Incomplete`, the peer hangs up, or the size cap is hit.
    async fn read_request(&mut self) -> anyhow::Result<ReadOutcome> {
        loop {
            match parse_request(&self.buffer) {
                Ok((request, consumed)) => {
                    let _ = self.buffer.split_to(consumed);
                    return Ok(ReadOutcome::Request(Box::new(request)));
                }

                Err(ParseError::Incomplete) => {
                    // Need more data → fall through to read
                }

                Err(e) => {
                    tracing::warn!(error = ?e, "rejecting malformed request");
                    return Ok(ReadOutcome::Malformed);
                }
            }

            if self.buffer.len() >= self.max_request_size {
                tracing::warn!(
                    limit = self.max_request_size,
                    "rejecting request over size limit"
                );
                return Ok(ReadOutcome::Malformed);
            }

            let mut chunk = vec![0u8; self.recv_buffer_size];
            let n = self.stream.read(&mut chunk).await?;

            if n == 0 {
                if self.buffer.is_empty() {
                    // Client connected and left without a request
                    return Ok(ReadOutcome::PeerClosed);
                }
                tracing::warn!("peer closed mid-request");
                return Ok(ReadOutcome::Malformed);
            }

            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }
}
