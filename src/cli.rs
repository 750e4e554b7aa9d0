//! Command-line flags.
//!
//! ```bash
//! tinyserve --settings settings.yaml --port 8080 --files ./public --internet
//! TINYSERVE_PORT=8080 tinyserve
//! ```
//!
//! Flags and their environment variables override the settings file.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{AddressFamily, Config};

#[derive(Debug, Clone, Parser)]
#[command(name = "tinyserve")]
#[command(about = "Small HTTP/1.1 static file server")]
#[command(version)]
pub struct Cli {
    /// YAML settings file; a missing file means defaults
    #[arg(short, long, default_value = "settings.yaml", env = "TINYSERVE_SETTINGS")]
    pub settings: PathBuf,

    /// Port to listen on
    #[arg(short, long, env = "TINYSERVE_PORT")]
    pub port: Option<u16>,

    /// Address family of the listening socket
    #[arg(short = 'a', long = "address", value_enum, env = "TINYSERVE_ADDRESS")]
    pub family: Option<AddressFamily>,

    /// Directory whose files are served
    #[arg(short, long, env = "TINYSERVE_FILES")]
    pub files: Option<PathBuf>,

    /// Listen on every interface instead of loopback only
    #[arg(short, long, env = "TINYSERVE_INTERNET")]
    pub internet: bool,
}

impl Cli {
    pub fn apply_to(&self, cfg: &mut Config) {
        if let Some(port) = self.port {
            cfg.server.port = port;
        }
        if let Some(family) = self.family {
            cfg.server.family = family;
        }
        if let Some(files) = &self.files {
            cfg.server.files = files.clone();
        }
        if self.internet {
            cfg.server.internet = true;
        }
    }
}
