use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::http::framer::{FrameLimits, RequestFramer};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::transport::Connection;
use crate::http::writer::ResponseWriter;
use crate::server::handlers::{MethodNotAllowed, ServerContext};

/// Serves requests from one client until it closes or misbehaves.
pub struct ConnectionWorker<S = TcpStream> {
    connection: Connection<S>,
    framer: RequestFramer,
    context: Arc<ServerContext>,
    state: ConnectionState,
}

pub enum ConnectionState {
    AwaitRequest,
    Dispatch(Request),
    Respond(Response),
    Closed,
}

impl<S> ConnectionWorker<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(connection: Connection<S>, context: Arc<ServerContext>, limits: FrameLimits) -> Self {
        Self {
            connection,
            framer: RequestFramer::new(limits),
            context,
            state: ConnectionState::AwaitRequest,
        }
    }

    /// Runs the request/response cycle. The connection is always closed on
    /// return; an error describes why it ended early.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let result = self.drive().await;
        self.connection.close().await;
        result
    }

    async fn drive(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::AwaitRequest => {
                    let request = self
                        .framer
                        .next_request(&mut self.connection)
                        .await
                        .context("failed to read request")?;

                    self.state = match request {
                        Some(req) if req.wants_close() => {
                            tracing::debug!(peer = %self.connection.peer(), "Client asked to close");
                            ConnectionState::Closed
                        }
                        Some(req) => ConnectionState::Dispatch(req),
                        None => ConnectionState::Closed,
                    };
                }

                ConnectionState::Dispatch(req) => {
                    tracing::debug!(method = %req.method, path = req.path(), "Dispatching request");
                    let response = self.dispatch(&req).await;
                    self.state = ConnectionState::Respond(response);
                }

                ConnectionState::Respond(mut response) => {
                    response.finalize();
                    let writer = ResponseWriter::new(&response)?;
                    writer
                        .write_to(&mut self.connection)
                        .await
                        .context("failed to write response")?;

                    tracing::debug!(status = response.status().as_u16(), "Response sent");
                    self.state = ConnectionState::AwaitRequest;
                }

                ConnectionState::Closed => return Ok(()),
            }
        }
    }

    async fn dispatch(&self, req: &Request) -> Response {
        let ctx = self.context.as_ref();
        if let Some(handler) = ctx.handlers.get(req.method) {
            if let Some(response) = handler.handle(ctx, req).await {
                return response;
            }
            tracing::debug!(method = %req.method, "Handler declined, falling back to 405");
        }
        MethodNotAllowed::response(ctx)
    }
}
