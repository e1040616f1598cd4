use anyhow::Result;
use chrono::Utc;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use uuid::Uuid;

use crate::status::StatusCode;

/// Connection lifecycle events. Every method defaults to doing nothing.
pub trait Logger: Send + Sync {
    fn listening(&self, _bind: &str, _root: &Path) {}
    fn connected(&self, _id: Uuid, _peer: &str) {}
    /// `accept()` failed; the listener keeps running
    fn accept_error(&self, _msg: &str) {}
    fn request(&self, _id: Uuid, _frames: &[String]) {}
    fn response(&self, _id: Uuid, _status: StatusCode, _bytes: usize) {}
    fn closed(&self, _id: Uuid, _reason: &str) {}
    fn error(&self, _id: Uuid, _context: &str, _msg: &str) {}
    fn shutdown(&self) {}
}

pub struct NoopLogger;
impl Logger for NoopLogger {}

/// Human-readable lines on stderr
pub struct StderrLogger;

impl Logger for StderrLogger {
    fn listening(&self, bind: &str, root: &Path) {
        eprintln!("hftpd listening on {} root={}", bind, root.display());
    }
    fn connected(&self, id: Uuid, peer: &str) {
        eprintln!("conn {} from {}", id, peer);
    }
    fn accept_error(&self, msg: &str) {
        eprintln!("accept error: {}", msg);
    }
    fn request(&self, id: Uuid, frames: &[String]) {
        eprintln!("conn {} request: {}", id, frames.join(" | "));
    }
    fn response(&self, id: Uuid, status: StatusCode, bytes: usize) {
        eprintln!("conn {} response: {} ({} bytes)", id, status, bytes);
    }
    fn closed(&self, id: Uuid, reason: &str) {
        eprintln!("conn {} closing ({})", id, reason);
    }
    fn error(&self, id: Uuid, context: &str, msg: &str) {
        eprintln!("conn {} error during {}: {}", id, context, msg);
    }
    fn shutdown(&self) {
        eprintln!("hftpd shutting down");
    }
}

/// Append-only log file, one timestamped line per event
pub struct TextLogger {
    file: Mutex<File>,
}

impl TextLogger {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(f),
        })
    }

    fn line(&self, s: &str) {
        let mut f = self.file.lock();
        let _ = writeln!(f, "[{}] {}", Utc::now().to_rfc3339(), s);
    }
}

impl Logger for TextLogger {
    fn listening(&self, bind: &str, root: &Path) {
        self.line(&format!("LISTEN bind={} root={}", bind, root.display()));
    }
    fn connected(&self, id: Uuid, peer: &str) {
        self.line(&format!("CONNECT id={} peer={}", id, peer));
    }
    fn accept_error(&self, msg: &str) {
        self.line(&format!("ACCEPT_ERROR msg={}", msg));
    }
    fn request(&self, id: Uuid, frames: &[String]) {
        self.line(&format!("REQUEST id={} frames={:?}", id, frames));
    }
    fn response(&self, id: Uuid, status: StatusCode, bytes: usize) {
        self.line(&format!(
            "RESPONSE id={} code={} bytes={}",
            id,
            status.code(),
            bytes
        ));
    }
    fn closed(&self, id: Uuid, reason: &str) {
        self.line(&format!("CLOSE id={} reason={}", id, reason));
    }
    fn error(&self, id: Uuid, context: &str, msg: &str) {
        self.line(&format!("ERROR id={} ctx={} msg={}", id, context, msg));
    }
    fn shutdown(&self) {
        self.line("SHUTDOWN");
    }
}
