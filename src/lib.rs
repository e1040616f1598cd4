//! HFTP Library
//!
//! Single-directory file server: clients list files, query sizes and fetch
//! base64-encoded byte ranges over a `\r\n`-delimited text protocol.

pub mod cli;
pub mod command;
pub mod config;
pub mod connection;
pub mod frame;
pub mod handlers;
pub mod logger;
pub mod paths;
pub mod protocol;
pub mod response;
pub mod server;
pub mod status;

pub use connection::serve;
