use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinHandle;
use tracing::{Instrument, info, warn};

use crate::http::connection::ConnectionWorker;
use crate::http::framer::FrameLimits;
use crate::http::request::Method;
use crate::http::transport::Connection;
use crate::resource::{ResourceRegistry, ResourceStats};
use crate::server::handlers::{RequestHandler, ServerContext};
use crate::server::tracker::ConnectionTracker;

pub const DEFAULT_MAX_CONNECTIONS: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerError {
    AlreadyRunning,
    NotBound,
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::AlreadyRunning => write!(f, "server is already running"),
            ServerError::NotBound => write!(f, "server has no listening socket"),
        }
    }
}

impl std::error::Error for ServerError {}

struct Running {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Accepts connections and hands each one to a [`ConnectionWorker`].
///
/// Handlers and resource proxies are configured before [`start`](Self::start);
/// the context is frozen for as long as the server runs.
pub struct HttpServer {
    context: Arc<ServerContext>,
    limits: FrameLimits,
    max_connections: usize,
    listener: Option<TcpListener>,
    local_addr: Option<SocketAddr>,
    tracker: ConnectionTracker,
    running: Option<Running>,
}

impl HttpServer {
    pub fn new(registry: ResourceRegistry) -> Self {
        Self {
            context: Arc::new(ServerContext {
                registry,
                ..ServerContext::default()
            }),
            limits: FrameLimits::default(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            listener: None,
            local_addr: None,
            tracker: ConnectionTracker::new(),
            running: None,
        }
    }

    pub fn with_limits(mut self, limits: FrameLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max.max(1);
        self
    }

    /// Attaches the listening socket. A later call replaces an unused one.
    pub fn bind(&mut self, listener: TcpListener) -> Result<(), ServerError> {
        if self.is_running() {
            return Err(ServerError::AlreadyRunning);
        }
        self.local_addr = listener.local_addr().ok();
        self.listener = Some(listener);
        Ok(())
    }

    pub fn set_request_handler(
        &mut self,
        method: Method,
        handler: impl RequestHandler + 'static,
    ) -> Result<(), ServerError> {
        self.context_mut()?.handlers.set(method, Arc::new(handler));
        Ok(())
    }

    pub fn create_resource_proxy(&mut self, from: &str, to: &str) -> Result<(), ServerError> {
        self.context_mut()?.registry.add_proxy(from, to);
        Ok(())
    }

    fn context_mut(&mut self) -> Result<&mut ServerContext, ServerError> {
        if self.is_running() {
            return Err(ServerError::AlreadyRunning);
        }
        // Workers from a previous run may still hold the old context
        Ok(Arc::make_mut(&mut self.context))
    }

    pub fn start(&mut self) -> Result<(), ServerError> {
        if self.is_running() {
            return Err(ServerError::AlreadyRunning);
        }
        let listener = self.listener.take().ok_or(ServerError::NotBound)?;

        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(accept_loop(
            listener,
            Arc::clone(&self.context),
            self.limits,
            Arc::new(Semaphore::new(self.max_connections)),
            self.tracker.clone(),
            shutdown_rx,
        ));

        info!(
            address = ?self.local_addr,
            max_connections = self.max_connections,
            "Server started"
        );
        self.running = Some(Running { shutdown, task });
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }

    /// Stops accepting and waits for the accept loop to exit. Connections
    /// already being served keep running.
    pub async fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.shutdown.send(true);
            if let Err(e) = running.task.await {
                warn!(error = %e, "Accept loop ended abnormally");
            }
            info!("Server stopped");
        }
    }

    /// Stops accepting, then waits up to `timeout` for live connections to
    /// finish. Returns whether they all did.
    pub async fn stop_and_drain(&mut self, timeout: Duration) -> bool {
        self.stop().await;

        let active = self.tracker.active_count();
        if active > 0 {
            info!(active, "Waiting for connections to finish");
        }
        match tokio::time::timeout(timeout, self.tracker.wait_idle()).await {
            Ok(()) => true,
            Err(_) => {
                warn!(
                    active = self.tracker.active_count(),
                    "Drain timed out, abandoning connections"
                );
                false
            }
        }
    }

    /// Signals the accept loop without waiting for it.
    pub fn force_stop(&mut self) {
        if let Some(running) = &self.running {
            let _ = running.shutdown.send(true);
            info!("Server stop requested");
        }
    }

    /// Resolves when the accept loop exits on its own or after a stop.
    pub async fn await_termination(&mut self) {
        if let Some(running) = self.running.as_mut() {
            if let Err(e) = (&mut running.task).await {
                warn!(error = %e, "Accept loop ended abnormally");
            }
            self.running = None;
        }
    }

    pub fn active_connections(&self) -> usize {
        self.tracker.active_count()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn context(&self) -> &ServerContext {
        &self.context
    }

    pub async fn resource_stats(&self) -> Vec<ResourceStats> {
        self.context.registry.stats().await
    }
}

async fn accept_loop(
    listener: TcpListener,
    context: Arc<ServerContext>,
    limits: FrameLimits,
    permits: Arc<Semaphore>,
    tracker: ConnectionTracker,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        // Hold a permit before accepting; excess clients wait in the backlog
        let permit = tokio::select! {
            _ = shutdown.changed() => break,
            permit = Arc::clone(&permits).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let (stream, peer) = tokio::select! {
            _ = shutdown.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "Accept failed");
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    continue;
                }
            },
        };

        let guard = tracker.track();
        let span = tracing::info_span!("connection", id = %guard.id(), peer = %peer);
        let worker = ConnectionWorker::new(Connection::new(stream, peer), Arc::clone(&context), limits);

        tokio::spawn(
            async move {
                tracing::debug!("Accepted connection");
                if let Err(e) = worker.run().await {
                    tracing::debug!(error = ?e, "Connection ended with error");
                }
                tracing::debug!("Connection closed");
                drop(permit);
                drop(guard);
            }
            .instrument(span),
        );
    }

    info!("Accept loop exited");
}
