use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tinyserve::cli::Cli;
use tinyserve::config::Config;
use tinyserve::console;
use tinyserve::http::request::Method;
use tinyserve::resource::ResourceRegistry;
use tinyserve::server::{HttpServer, StaticFileHandler, listener};

const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start async runtime");
            std::process::exit(1);
        }
    };

    let code = match runtime.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            1
        }
    };

    // A pending stdin read would otherwise block runtime shutdown
    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let mut cfg = Config::load(&cli.settings)?;
    cli.apply_to(&mut cfg);
    cfg.validate()?;

    let mut registry = ResourceRegistry::scan(&cfg.server.files)?;
    for (from, to) in &cfg.resource_proxies {
        registry.add_proxy(from.as_str(), to.as_str());
    }

    let socket = listener::bind(&cfg.server).await?;

    let mut server = HttpServer::new(registry)
        .with_limits(cfg.frame_limits())
        .with_max_connections(cfg.server.max_connections);
    server.bind(socket)?;
    server.set_request_handler(Method::GET, StaticFileHandler)?;
    server.start().context("failed to start server")?;

    console::run(&mut server, DRAIN_TIMEOUT).await
}
