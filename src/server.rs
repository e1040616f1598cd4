//! Listening socket and per-connection task spawning

use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::connection::{ConnSettings, Connection};
use crate::handlers::ServedDir;
use crate::logger::Logger;

/// Everything a connection task borrows from the server
#[derive(Clone)]
pub struct ServerContext {
    pub dir: Arc<ServedDir>,
    pub settings: Arc<ConnSettings>,
    pub logger: Arc<dyn Logger>,
}

pub async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {}", addr))
}

/// Accept connections until `shutdown` resolves. Each connection runs on its
/// own task; they share nothing but the read-only context.
pub async fn serve_until<F>(
    listener: TcpListener,
    ctx: ServerContext,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let local = listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    ctx.logger.listening(&local, ctx.dir.root());
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        ctx.logger.accept_error(&e.to_string());
                        continue;
                    }
                };
                let _ = stream.set_nodelay(true);
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    let conn = Connection::new(stream, ctx.dir, ctx.settings, ctx.logger.clone());
                    ctx.logger.connected(conn.id(), &peer.to_string());
                    conn.handle().await;
                });
            }
        }
    }
    ctx.logger.shutdown();
    Ok(())
}
