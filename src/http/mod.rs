//! HTTP protocol implementation.
//!
//! This module implements a complete HTTP/1.1 server with support for keep-alive connections.
//!
//! # Architecture
//!
//! The HTTP layer is organized into several submodules:
//!
//! - **`transport`**: byte-level reads and writes over one client socket
//! - **`framer`**: splits the incoming byte stream into complete requests
//! - **`parser`**: parses a request head (start line and headers)
//! - **`request`**: HTTP request representation, methods and targets
//! - **`headers`**: case-insensitive, insertion-ordered header maps
//! - **`response`**: HTTP response representation with builder pattern
//! - **`cookie`**: `Set-Cookie` values
//! - **`writer`**: Serializes and writes finalized responses to the client
//! - **`mime`**: MIME type detection based on file extensions
//! - **`connection`**: The per-connection worker implementing the request-response state machine
//!
//! # Connection State Machine
//!
//! Each client connection goes through a state machine:
//!
//! ```text
//!        ┌─────────────────┐
//!        │  AwaitRequest   │ ← Frame the next request from the socket
//!        └──────┬──────────┘
//!               │ Request framed
//!               ├─ EOF / Connection: close / framing error → Closed
//!               ▼
//!        ┌──────────────────┐
//!        │    Dispatch      │ ← Run the method handler (405 fallback)
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Respond       │ ← Finalize and send to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ → AwaitRequest (same connection)
//!               └─ write error → Closed
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tinyserve::http::connection::ConnectionWorker;
//! use tinyserve::http::framer::FrameLimits;
//! use tinyserve::http::transport::Connection;
//! use tinyserve::server::ServerContext;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     let context = Arc::new(ServerContext::default());
//!
//!     loop {
//!         let (socket, peer) = listener.accept().await?;
//!         let worker = ConnectionWorker::new(
//!             Connection::new(socket, peer),
//!             Arc::clone(&context),
//!             FrameLimits::default(),
//!         );
//!         tokio::spawn(async move {
//!             if let Err(e) = worker.run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod connection;
pub mod cookie;
pub mod framer;
pub mod headers;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod transport;
pub mod writer;
