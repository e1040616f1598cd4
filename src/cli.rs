//! Command-line options for hftpd

use clap::Parser;
use std::path::PathBuf;

/// Serve one directory over the HFTP line protocol.
///
/// Flags left unset fall back to the config file, then to built-in defaults
/// (localhost:19500, ./testdata).
#[derive(Clone, Debug, Parser)]
#[command(author, version, about)]
pub struct DaemonOpts {
    /// Address to listen on
    #[arg(short, long)]
    pub address: Option<String>,

    /// TCP port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Shared directory
    #[arg(short, long)]
    pub datadir: Option<PathBuf>,

    /// Config file (default: ~/.config/hftp/hftpd.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Append connection events to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Do not log connection events
    #[arg(short, long)]
    pub quiet: bool,

    /// Close connections idle for this many seconds (0 = never)
    #[arg(long)]
    pub idle_timeout: Option<u64>,

    /// Answer FILE_NOT_FOUND for names that resolve outside the directory
    #[arg(long)]
    pub confine_paths: bool,

    /// Runtime worker threads (0 = auto)
    #[arg(short = 't', long)]
    pub threads: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_flags() {
        let opts = DaemonOpts::parse_from(["hftpd", "-a", "0.0.0.0", "-p", "2121", "-d", "/srv"]);
        assert_eq!(opts.address.as_deref(), Some("0.0.0.0"));
        assert_eq!(opts.port, Some(2121));
        assert_eq!(opts.datadir, Some(PathBuf::from("/srv")));
        assert!(!opts.confine_paths);
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(DaemonOpts::try_parse_from(["hftpd", "-p", "http"]).is_err());
        assert!(DaemonOpts::try_parse_from(["hftpd", "-p", "70000"]).is_err());
    }
}
