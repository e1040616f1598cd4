//! Request handlers and the served-directory collaborator they read from

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::command::CommandKind;
use crate::paths::{confine_under_root, join_unchecked};
use crate::protocol::EOL;
use crate::status::StatusCode;

/// Status plus payload produced by one handler. The payload is already
/// delimiter-terminated per line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub status: StatusCode,
    pub payload: String,
}

impl Reply {
    pub fn ok(payload: String) -> Self {
        Self {
            status: StatusCode::Ok,
            payload,
        }
    }

    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            payload: String::new(),
        }
    }
}

/// Read-only view of the directory being served. Shared by every
/// connection.
#[derive(Clone, Debug)]
pub struct ServedDir {
    root: PathBuf,
    confine: bool,
}

impl ServedDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            confine: false,
        }
    }

    /// Refuse names that resolve outside the root
    pub fn confined(mut self, confine: bool) -> Self {
        self.confine = confine;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `None` when confinement is on and `name` would escape the root
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        if self.confine {
            confine_under_root(&self.root, name).ok()
        } else {
            Some(join_unchecked(&self.root, name))
        }
    }

    /// Names of the immediate entries, in filesystem order. A missing root
    /// lists as empty.
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut rd = match tokio::fs::read_dir(&self.root).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("read_dir {}", self.root.display()))
            }
        };
        let mut names = Vec::new();
        while let Some(entry) = rd
            .next_entry()
            .await
            .with_context(|| format!("read_dir {}", self.root.display()))?
        {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    /// Byte length of `name` if it is a regular file
    pub async fn file_size(&self, name: &str) -> Option<u64> {
        let path = self.resolve(name)?;
        match tokio::fs::metadata(&path).await {
            Ok(md) if md.is_file() => Some(md.len()),
            _ => None,
        }
    }

    pub async fn read_range(&self, name: &str, offset: u64, size: usize) -> Result<Vec<u8>> {
        let path = self
            .resolve(name)
            .with_context(|| format!("resolve {}", name))?;
        let mut file = tokio::fs::File::open(&path)
            .await
            .with_context(|| format!("open {}", path.display()))?;
        file.seek(SeekFrom::Start(offset))
            .await
            .with_context(|| format!("seek {} to {}", path.display(), offset))?;
        let mut buf = vec![0u8; size];
        file.read_exact(&mut buf)
            .await
            .with_context(|| format!("read {} bytes of {}", size, path.display()))?;
        Ok(buf)
    }
}

/// Run the handler for `kind`. Arity has already been checked by the
/// dispatcher. `Err` means an unexpected filesystem failure.
pub async fn run(kind: CommandKind, dir: &ServedDir, args: &[String]) -> Result<Reply> {
    match kind {
        CommandKind::GetFileListing => get_file_listing(dir).await,
        CommandKind::GetMetadata => Ok(get_metadata(dir, &args[0]).await),
        CommandKind::GetSlice => get_slice(dir, &args[0], &args[1], &args[2]).await,
        CommandKind::Quit => Ok(quit()),
    }
}

pub async fn get_file_listing(dir: &ServedDir) -> Result<Reply> {
    let mut payload = String::new();
    for name in dir.list().await? {
        payload.push_str(&name);
        payload.push_str(EOL);
    }
    payload.push_str(EOL);
    Ok(Reply::ok(payload))
}

pub async fn get_metadata(dir: &ServedDir, name: &str) -> Reply {
    match dir.file_size(name).await {
        Some(len) => Reply::ok(format!("{}{}", len, EOL)),
        None => Reply::status(StatusCode::FileNotFound),
    }
}

pub async fn get_slice(dir: &ServedDir, name: &str, offset: &str, size: &str) -> Result<Reply> {
    let (Some(offset), Some(size)) = (parse_int(offset), parse_int(size)) else {
        return Ok(Reply::status(StatusCode::InvalidArguments));
    };
    let Some(len) = dir.file_size(name).await else {
        return Ok(Reply::status(StatusCode::FileNotFound));
    };
    if offset < 0 || size < 0 {
        return Ok(Reply::status(StatusCode::InvalidArguments));
    }
    let (offset, size) = (offset as u64, size as u64);
    match offset.checked_add(size) {
        Some(end) if end <= len => {}
        _ => return Ok(Reply::status(StatusCode::BadOffset)),
    }
    let size = usize::try_from(size).context("slice size exceeds address space")?;
    let bytes = dir.read_range(name, offset, size).await?;
    Ok(Reply::ok(format!("{}{}", STANDARD.encode(bytes), EOL)))
}

/// Never contributes payload; the dispatcher closes the connection
pub fn quit() -> Reply {
    Reply::ok(String::new())
}

/// Base-10 integer: optional leading `-`, then ASCII digits only
fn parse_int(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
