//! Frame reader: turns transport bytes into delimiter-terminated request lines
//!
//! One call to [`FrameReader::read_batch`] reads until the buffer holds at
//! least one `\r\n`, then hands back every complete line as a batch. Bytes
//! after the last delimiter stay buffered and prefix the next batch.

use anyhow::Result;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::timeout;

use crate::protocol::{EOL, RECV_CHUNK};

/// Result of one accumulation-and-split cycle
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// One or more complete lines, delimiters stripped
    Frames(Vec<String>),
    /// Peer closed the stream before a delimiter arrived
    Closed,
    /// Received bytes outside the ASCII range
    Undecodable,
    /// Buffered more than the request cap without a delimiter
    Oversized,
    /// No bytes arrived within the idle timeout
    IdleTimeout,
}

pub struct FrameReader {
    buf: String,
    max_request_bytes: usize,
}

impl FrameReader {
    pub fn new(max_request_bytes: usize) -> Self {
        Self {
            buf: String::new(),
            max_request_bytes,
        }
    }

    /// Bytes held over from the previous cycle (a partial next line)
    pub fn pending(&self) -> &str {
        &self.buf
    }

    pub async fn read_batch<R>(
        &mut self,
        reader: &mut R,
        idle: Option<Duration>,
    ) -> Result<ReadOutcome>
    where
        R: AsyncRead + Unpin,
    {
        let mut chunk = [0u8; RECV_CHUNK];
        while !self.buf.contains(EOL) {
            let n = match idle {
                Some(limit) => match timeout(limit, reader.read(&mut chunk)).await {
                    Ok(res) => res?,
                    Err(_) => return Ok(ReadOutcome::IdleTimeout),
                },
                None => reader.read(&mut chunk).await?,
            };
            if n == 0 {
                return Ok(ReadOutcome::Closed);
            }
            let data = &chunk[..n];
            if !data.is_ascii() {
                return Ok(ReadOutcome::Undecodable);
            }
            // ASCII is always valid UTF-8
            self.buf.push_str(std::str::from_utf8(data)?);
            if !self.buf.contains(EOL) && self.buf.len() > self.max_request_bytes {
                return Ok(ReadOutcome::Oversized);
            }
        }
        Ok(ReadOutcome::Frames(take_frames(&mut self.buf)))
    }
}

/// Remove every complete line from `buf`, leaving any trailing fragment.
pub fn take_frames(buf: &mut String) -> Vec<String> {
    let Some(last) = buf.rfind(EOL) else {
        return Vec::new();
    };
    let rest = buf.split_off(last + EOL.len());
    let complete = std::mem::replace(buf, rest);
    let mut frames: Vec<String> = complete.split(EOL).map(str::to_string).collect();
    // `complete` always ends with EOL, so split yields one empty tail
    frames.pop();
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn test_take_frames_splits_batch() {
        let mut buf = "get_file_listing\r\nquit\r\n".to_string();
        assert_eq!(take_frames(&mut buf), vec!["get_file_listing", "quit"]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_take_frames_keeps_trailing_fragment() {
        let mut buf = "get_metadata a.txt\r\nget_sl".to_string();
        assert_eq!(take_frames(&mut buf), vec!["get_metadata a.txt"]);
        assert_eq!(buf, "get_sl");
    }

    #[test]
    fn test_take_frames_blank_line() {
        let mut buf = "\r\n".to_string();
        assert_eq!(take_frames(&mut buf), vec![""]);
    }

    #[test]
    fn test_take_frames_keeps_bare_lf_in_line() {
        let mut buf = "quit\nfoo\r\n".to_string();
        assert_eq!(take_frames(&mut buf), vec!["quit\nfoo"]);
    }

    #[tokio::test]
    async fn test_read_batch_across_chunks() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let mut reader = FrameReader::new(1024);
        client.write_all(b"get_meta").await.unwrap();
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            client.write_all(b"data a.txt\r\nqu").await.unwrap();
            client
        });
        let outcome = reader.read_batch(&mut server, None).await.unwrap();
        assert_eq!(outcome, ReadOutcome::Frames(vec!["get_metadata a.txt".to_string()]));
        assert_eq!(reader.pending(), "qu");

        let mut client = writer.await.unwrap();
        client.write_all(b"it\r\n").await.unwrap();
        let outcome = reader.read_batch(&mut server, None).await.unwrap();
        assert_eq!(outcome, ReadOutcome::Frames(vec!["quit".to_string()]));
    }

    #[tokio::test]
    async fn test_read_batch_eof_without_delimiter() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(b"get_file_listing").await.unwrap();
        drop(client);
        let mut reader = FrameReader::new(1024);
        let outcome = reader.read_batch(&mut server, None).await.unwrap();
        assert_eq!(outcome, ReadOutcome::Closed);
    }

    #[tokio::test]
    async fn test_read_batch_rejects_non_ascii() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all("get_metadata ñ\r\n".as_bytes()).await.unwrap();
        let mut reader = FrameReader::new(1024);
        let outcome = reader.read_batch(&mut server, None).await.unwrap();
        assert_eq!(outcome, ReadOutcome::Undecodable);
    }

    #[tokio::test]
    async fn test_read_batch_oversized() {
        let (mut client, mut server) = tokio::io::duplex(256);
        client.write_all(&[b'a'; 100]).await.unwrap();
        let mut reader = FrameReader::new(16);
        let outcome = reader.read_batch(&mut server, None).await.unwrap();
        assert_eq!(outcome, ReadOutcome::Oversized);
    }

    #[tokio::test]
    async fn test_read_batch_idle_timeout() {
        let (_client, mut server) = tokio::io::duplex(64);
        let mut reader = FrameReader::new(16);
        let outcome = reader
            .read_batch(&mut server, Some(Duration::from_millis(20)))
            .await
            .unwrap();
        assert_eq!(outcome, ReadOutcome::IdleTimeout);
    }
}
