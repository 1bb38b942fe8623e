//! HTTP protocol implementation.
//!
//! This module implements the HTTP/1.1 wire engine: one request per
//! connection, no keep-alive, no chunked encoding.
//!
//! # Architecture
//!
//! The HTTP layer is organized into several submodules:
//!
//! - **`connection`**: The main connection handler implementing the request-response state machine
//! - **`parser`**: Parses incoming HTTP requests from byte buffers
//! - **`request`**: HTTP request representation and builder
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: Serializes and writes HTTP messages to the peer
//! - **`headers`**: Insertion-ordered header map
//! - **`mime`**: Content-type detection based on file extensions
//!
//! # Connection State Machine
//!
//! Each client connection goes through a state machine:
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Accumulate reads until a full request parses
//!        └──────┬──────┘
//!               │ Parsed            │ Malformed → Writing (400)
//!               ▼                   │ Peer gone → Closed
//!        ┌──────────────────┐
//!        │    Handling      │ ← Router produces the response
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               └─ Closed (always; connections are not reused)
//! ```

pub mod connection;
pub mod headers;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
