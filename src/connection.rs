//! Per-connection protocol engine
//!
//! A [`Connection`] owns its transport and loops read -> parse -> dispatch ->
//! respond until it reaches [`ConnState::Closed`]. Each read cycle is one
//! batch: payloads accumulate behind a single `OK` status line and the first
//! failing command replaces the whole response with its own status line.

use anyhow::Error;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use uuid::Uuid;

use crate::command::{parse_batch, Command, CommandKind};
use crate::frame::{FrameReader, ReadOutcome};
use crate::handlers::{self, ServedDir};
use crate::logger::{Logger, NoopLogger};
use crate::protocol::MAX_REQUEST_BYTES;
use crate::response::{write_encoded, Response};
use crate::status::{StatusCatalog, StatusCode};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseReason {
    Quit,
    PeerClosed,
    IdleTimeout,
    /// A fatal status line was sent
    Fatal(StatusCode),
    Transport,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::Quit => write!(f, "quit"),
            CloseReason::PeerClosed => write!(f, "peer closed"),
            CloseReason::IdleTimeout => write!(f, "idle timeout"),
            CloseReason::Fatal(status) => write!(f, "fatal {}", status),
            CloseReason::Transport => write!(f, "transport error"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnState {
    Open,
    Closed(CloseReason),
}

/// Per-server knobs shared by every connection
#[derive(Clone, Debug)]
pub struct ConnSettings {
    pub idle_timeout: Option<Duration>,
    pub max_request_bytes: usize,
    pub catalog: StatusCatalog,
}

impl Default for ConnSettings {
    fn default() -> Self {
        Self {
            idle_timeout: None,
            max_request_bytes: MAX_REQUEST_BYTES,
            catalog: StatusCatalog::default(),
        }
    }
}

/// Outcome of running one batch
pub struct Batch {
    pub response: Response,
    /// `quit` was executed
    pub quit: bool,
    /// Unexpected failure behind an `INTERNAL_ERROR` response
    pub error: Option<Error>,
}

/// Run `commands` in order, stopping at the first failure or at `quit`.
pub async fn dispatch(commands: &[Command], dir: &ServedDir) -> Batch {
    let mut batch = Batch {
        response: Response::new(),
        quit: false,
        error: None,
    };
    for cmd in commands {
        let Some(kind) = CommandKind::lookup(&cmd.name) else {
            batch.response.replace(StatusCode::InvalidCommand);
            break;
        };
        if cmd.args.len() != kind.arity() {
            batch.response.replace(StatusCode::InvalidArguments);
            break;
        }
        match handlers::run(kind, dir, &cmd.args).await {
            Ok(reply) if reply.status == StatusCode::Ok => batch.response.append(&reply.payload),
            Ok(reply) => {
                batch.response.replace(reply.status);
                break;
            }
            Err(e) => {
                batch.response.replace(StatusCode::InternalError);
                batch.error = Some(e);
                break;
            }
        }
        if kind == CommandKind::Quit {
            batch.quit = true;
            break;
        }
    }
    batch
}

pub struct Connection<S> {
    stream: S,
    dir: Arc<ServedDir>,
    settings: Arc<ConnSettings>,
    logger: Arc<dyn Logger>,
    id: Uuid,
    reader: FrameReader,
    state: ConnState,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        stream: S,
        dir: Arc<ServedDir>,
        settings: Arc<ConnSettings>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let reader = FrameReader::new(settings.max_request_bytes);
        Self {
            stream,
            dir,
            settings,
            logger,
            id: Uuid::new_v4(),
            reader,
            state: ConnState::Open,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> ConnState {
        self.state
    }

    /// Serve requests until the connection closes. The transport is shut
    /// down and dropped on every path out.
    pub async fn handle(mut self) -> CloseReason {
        while self.state == ConnState::Open {
            self.step().await;
        }
        let reason = match self.state {
            ConnState::Closed(reason) => reason,
            ConnState::Open => CloseReason::Transport,
        };
        let _ = self.stream.shutdown().await;
        self.logger.closed(self.id, &reason.to_string());
        reason
    }

    /// One read-dispatch-respond cycle
    async fn step(&mut self) {
        let outcome = match self
            .reader
            .read_batch(&mut self.stream, self.settings.idle_timeout)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                self.logger.error(self.id, "read", &format!("{:#}", e));
                self.state = ConnState::Closed(CloseReason::Transport);
                return;
            }
        };
        let lines = match outcome {
            ReadOutcome::Frames(lines) => lines,
            ReadOutcome::Closed => {
                self.state = ConnState::Closed(CloseReason::PeerClosed);
                return;
            }
            ReadOutcome::IdleTimeout => {
                self.state = ConnState::Closed(CloseReason::IdleTimeout);
                return;
            }
            ReadOutcome::Undecodable | ReadOutcome::Oversized => {
                self.send_status(StatusCode::BadRequest).await;
                return;
            }
        };
        self.logger.request(self.id, &lines);

        let commands = match parse_batch(&lines) {
            Ok(commands) => commands,
            Err(_) => {
                self.send_status(StatusCode::BadEol).await;
                return;
            }
        };

        let batch = dispatch(&commands, &self.dir).await;
        if let Some(e) = &batch.error {
            self.logger.error(self.id, "dispatch", &format!("{:#}", e));
        }
        let (status, bytes) = batch.response.encode(&self.settings.catalog);
        if !self.send(status, &bytes).await {
            return;
        }
        if status.is_fatal() {
            self.state = ConnState::Closed(CloseReason::Fatal(status));
        } else if batch.quit {
            self.state = ConnState::Closed(CloseReason::Quit);
        }
    }

    /// Send a bare status line; fatal codes close the connection
    async fn send_status(&mut self, status: StatusCode) {
        let line = self.settings.catalog.status_line(status);
        if self.send(status, line.as_bytes()).await && status.is_fatal() {
            self.state = ConnState::Closed(CloseReason::Fatal(status));
        }
    }

    async fn send(&mut self, status: StatusCode, bytes: &[u8]) -> bool {
        match write_encoded(&mut self.stream, bytes).await {
            Ok(()) => {
                self.logger.response(self.id, status, bytes.len());
                true
            }
            Err(e) => {
                self.logger.error(self.id, "write", &format!("{:#}", e));
                self.state = ConnState::Closed(CloseReason::Transport);
                false
            }
        }
    }
}

/// Serve one connected stream against `root` with default settings until it
/// closes.
pub async fn serve<S>(stream: S, root: &Path) -> CloseReason
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let conn = Connection::new(
        stream,
        Arc::new(ServedDir::new(root)),
        Arc::new(ConnSettings::default()),
        Arc::new(NoopLogger),
    );
    conn.handle().await
}
