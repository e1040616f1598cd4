//! Daemon configuration: TOML file merged with command-line flags

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::DaemonOpts;
use crate::connection::ConnSettings;
use crate::protocol::{timeouts, DEFAULT_ADDR, DEFAULT_DIR, DEFAULT_PORT, MAX_REQUEST_BYTES};
use crate::status::{StatusCatalog, StatusCode};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub datadir: PathBuf,
    pub idle_timeout_secs: u64,     // 0 = wait forever
    pub max_request_bytes: usize,
    pub confine_paths: bool,
    pub log_file: Option<PathBuf>,
    pub quiet: bool,
    pub threads: usize,             // 0 = auto
    pub status: BTreeMap<String, String>, // symbol -> text
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDR.to_string(),
            port: DEFAULT_PORT,
            datadir: PathBuf::from(DEFAULT_DIR),
            idle_timeout_secs: timeouts::IDLE_SECS,
            max_request_bytes: MAX_REQUEST_BYTES,
            confine_paths: false,
            log_file: None,
            quiet: false,
            threads: 0,
            status: BTreeMap::new(),
        }
    }
}

pub fn config_dir() -> PathBuf {
    #[cfg(windows)]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("hftp");
        }
    }
    // Unix-like default
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config").join("hftp");
    }
    PathBuf::from(".hftp")
}

pub fn default_config_path() -> PathBuf {
    config_dir().join("hftpd.toml")
}

impl ServerConfig {
    pub fn from_toml(data: &str) -> Result<Self> {
        let cfg: ServerConfig = toml::from_str(data)?;
        cfg.catalog()?;
        Ok(cfg)
    }

    /// Load `path`, or the default location when `None`. Only an explicitly
    /// named file has to exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let data = std::fs::read_to_string(p)
                    .with_context(|| format!("read config {}", p.display()))?;
                Self::from_toml(&data).with_context(|| format!("parse config {}", p.display()))
            }
            None => {
                let p = default_config_path();
                if let Ok(data) = std::fs::read_to_string(&p) {
                    Self::from_toml(&data)
                        .with_context(|| format!("parse config {}", p.display()))
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Flags given on the command line win over the file
    pub fn apply_cli(&mut self, opts: &DaemonOpts) {
        if let Some(address) = &opts.address {
            self.address = address.clone();
        }
        if let Some(port) = opts.port {
            self.port = port;
        }
        if let Some(dir) = &opts.datadir {
            self.datadir = dir.clone();
        }
        if let Some(secs) = opts.idle_timeout {
            self.idle_timeout_secs = secs;
        }
        if let Some(threads) = opts.threads {
            self.threads = threads;
        }
        if let Some(log_file) = &opts.log_file {
            self.log_file = Some(log_file.clone());
        }
        if opts.confine_paths {
            self.confine_paths = true;
        }
        if opts.quiet {
            self.quiet = true;
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    pub fn worker_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }

    /// Status texts with the `[status]` overrides applied
    pub fn catalog(&self) -> Result<StatusCatalog> {
        let mut overrides = BTreeMap::new();
        for (symbol, text) in &self.status {
            let code = StatusCode::from_symbol(symbol)
                .ok_or_else(|| anyhow!("unknown status {:?} in [status]", symbol))?;
            // Texts go straight onto the status line
            if !text.is_ascii() || text.contains(['\r', '\n']) {
                bail!("status text for {} must be ASCII on one line: {:?}", symbol, text);
            }
            overrides.insert(code, text.clone());
        }
        Ok(StatusCatalog::new(overrides))
    }

    pub fn conn_settings(&self) -> Result<Arc<ConnSettings>> {
        Ok(Arc::new(ConnSettings {
            idle_timeout: timeouts::idle_timeout(self.idle_timeout_secs),
            max_request_bytes: self.max_request_bytes,
            catalog: self.catalog()?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults_match_reference_server() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.bind_addr(), "localhost:19500");
        assert_eq!(cfg.datadir, PathBuf::from("testdata"));
        assert!(!cfg.confine_paths);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg = ServerConfig::from_toml(
            r#"
port = 2121
confine_paths = true

[status]
FILE_NOT_FOUND = "NO SUCH FILE"
"#,
        )
        .unwrap();
        assert_eq!(cfg.port, 2121);
        assert_eq!(cfg.address, "localhost");
        assert!(cfg.confine_paths);
        let settings = cfg.conn_settings().unwrap();
        assert_eq!(
            settings.catalog.status_line(StatusCode::FileNotFound),
            "202 NO SUCH FILE\r\n"
        );
        assert!(settings.idle_timeout.is_none());
    }

    #[test]
    fn test_unknown_status_key_is_rejected() {
        assert!(ServerConfig::from_toml("[status]\nNOT_A_CODE = \"x\"\n").is_err());
    }

    #[test]
    fn test_status_text_must_fit_status_line() {
        assert!(ServerConfig::from_toml("[status]\nOK = \"BIEN ✓\"\n").is_err());
        assert!(ServerConfig::from_toml("[status]\nFILE_NOT_FOUND = \"X\\r\\n0 OK\"\n").is_err());
        assert!(ServerConfig::from_toml("[status]\nBAD_OFFSET = \"A\\nB\"\n").is_err());
        assert!(ServerConfig::from_toml("[status]\nOK = \"FINE\"\n").is_ok());
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut cfg = ServerConfig::from_toml("port = 2121\naddress = \"0.0.0.0\"\n").unwrap();
        let opts = DaemonOpts::parse_from(["hftpd", "-p", "3000", "--idle-timeout", "5"]);
        cfg.apply_cli(&opts);
        assert_eq!(cfg.bind_addr(), "0.0.0.0:3000");
        assert_eq!(cfg.idle_timeout_secs, 5);
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(ServerConfig::load(Some(tmp.path().join("nope.toml").as_path())).is_err());
    }

    #[test]
    fn test_worker_threads_auto() {
        let mut cfg = ServerConfig::default();
        assert!(cfg.worker_threads() >= 1);
        cfg.threads = 3;
        assert_eq!(cfg.worker_threads(), 3);
    }
}
