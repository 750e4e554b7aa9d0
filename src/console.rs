//! Operator console read from stdin while the server runs.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::resource::ResourceStats;
use crate::server::HttpServer;

pub const HELP: &str = "\
commands:
  shutdown, exit  stop accepting, finish open connections and exit
  quit            stop immediately without cleanup
  rstat           show resource cache statistics
  help            show this message";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Shutdown,
    Quit,
    Stats,
    Help,
    Unknown,
}

impl Command {
    /// Parses one console line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let word = line.split_whitespace().next()?;
        let command = match word.to_ascii_lowercase().as_str() {
            "shutdown" | "exit" => Command::Shutdown,
            "quit" => Command::Quit,
            "rstat" => Command::Stats,
            "help" => Command::Help,
            _ => Command::Unknown,
        };
        Some(command)
    }
}

pub fn format_stats(stats: &[ResourceStats]) -> String {
    let width = stats
        .iter()
        .map(|s| s.name.len())
        .max()
        .unwrap_or(0)
        .max("RESOURCE".len());

    let mut out = format!("{:<width$}  {:>6}  {:>12}\n", "RESOURCE", "REFS", "CACHED");
    for s in stats {
        out.push_str(&format!(
            "{:<width$}  {:>6}  {:>12}\n",
            s.name, s.refs, s.cached_bytes
        ));
    }
    out.push_str(&format!("{} resource(s)", stats.len()));
    out
}

/// Serves console commands until the server should exit and returns the
/// process exit code. EOF and Ctrl-C count as `shutdown`.
pub async fn run(server: &mut HttpServer, drain_timeout: Duration) -> anyhow::Result<i32> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received");
                None
            }
        };

        let command = match line {
            Some(line) => match Command::parse(&line) {
                Some(command) => command,
                None => continue,
            },
            None => Command::Shutdown,
        };

        match command {
            Command::Shutdown => {
                info!("Shutting down");
                if !server.stop_and_drain(drain_timeout).await {
                    warn!("Some connections were still open at exit");
                }
                return Ok(0);
            }
            Command::Quit => {
                server.force_stop();
                return Ok(1);
            }
            Command::Stats => println!("{}", format_stats(&server.resource_stats().await)),
            Command::Help => println!("{}", HELP),
            Command::Unknown => println!("?"),
        }
    }
}
