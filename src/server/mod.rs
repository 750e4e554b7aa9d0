//! Server runtime.
//!
//! - **`listener`**: opens the listening socket for the configured family
//! - **`dispatch`**: [`HttpServer`], the accept loop and its lifecycle
//! - **`handlers`**: per-method request handlers and the shared context
//! - **`tracker`**: live connection accounting used when draining

pub mod dispatch;
pub mod handlers;
pub mod listener;
pub mod tracker;

pub use dispatch::{HttpServer, ServerError};
pub use handlers::{
    HandlerTable, MethodNotAllowed, RequestHandler, ServerContext, StaticFileHandler, handler_fn,
};
