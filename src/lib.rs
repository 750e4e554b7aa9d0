//! tinyserve - a small HTTP/1.1 static file server
//!
//! Core library: request framing and parsing, responses, the resource
//! cache and the server runtime. The binary adds configuration, the
//! command line and the operator console.

pub mod cli;
pub mod config;
pub mod console;
pub mod http;
pub mod resource;
pub mod server;
