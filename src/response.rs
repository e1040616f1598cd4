//! Batch response accumulator and wire encoder

use anyhow::Result;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::status::{StatusCatalog, StatusCode};

/// One status line plus the payloads gathered while a batch runs.
/// A failure replaces the whole thing with a bare status line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    body: String,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: StatusCode::Ok,
            body: String::new(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn append(&mut self, payload: &str) {
        self.body.push_str(payload);
    }

    /// Discard accumulated payload and answer with `status` alone
    pub fn replace(&mut self, status: StatusCode) {
        self.status = status;
        self.body.clear();
    }

    /// Render to single-byte ASCII. Text that cannot be represented turns
    /// the response into `INTERNAL_ERROR`.
    pub fn encode(&self, catalog: &StatusCatalog) -> (StatusCode, Vec<u8>) {
        let mut text = catalog.status_line(self.status);
        text.push_str(&self.body);
        if text.is_ascii() {
            (self.status, text.into_bytes())
        } else {
            let status = StatusCode::InternalError;
            (status, catalog.status_line(status).into_bytes())
        }
    }
}

/// Full response in a single write
pub async fn write_encoded<W>(writer: &mut W, bytes: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(bytes).await?;
    writer.flush().await?;
    Ok(())
}
