use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;

use hftp::cli::DaemonOpts;
use hftp::config::ServerConfig;
use hftp::handlers::ServedDir;
use hftp::logger::{Logger, NoopLogger, StderrLogger, TextLogger};
use hftp::paths::ensure_dir_exists;
use hftp::server::{self, ServerContext};

fn main() -> Result<()> {
    let opts = DaemonOpts::parse();
    let mut cfg = ServerConfig::load(opts.config.as_deref())?;
    cfg.apply_cli(&opts);

    // Serve an empty directory rather than failing on a fresh install
    ensure_dir_exists(&cfg.datadir)
        .with_context(|| format!("Failed to create data directory: {}", cfg.datadir.display()))?;
    if !cfg.datadir.is_dir() {
        anyhow::bail!("Error: Data path is not a directory: {}", cfg.datadir.display());
    }

    let logger: Arc<dyn Logger> = if cfg.quiet {
        Arc::new(NoopLogger)
    } else if let Some(ref path) = cfg.log_file {
        Arc::new(
            TextLogger::new(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?,
        )
    } else {
        Arc::new(StderrLogger)
    };

    let bind = cfg.bind_addr();
    println!("Serving {} on {}.", cfg.datadir.display(), bind);
    if cfg.confine_paths {
        println!("  File names confined to the data directory");
    } else if cfg.address.starts_with("0.0.0.0") {
        eprintln!("⚠️  WARNING: Binding to 0.0.0.0 without --confine-paths lets any client");
        eprintln!("   read files outside {} via ../ names", cfg.datadir.display());
    }

    let ctx = ServerContext {
        dir: Arc::new(ServedDir::new(cfg.datadir.clone()).confined(cfg.confine_paths)),
        settings: cfg.conn_settings()?,
        logger,
    };

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(cfg.worker_threads())
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    rt.block_on(async move {
        let listener = server::bind(&bind).await?;
        server::serve_until(listener, ctx, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    })?;
    println!("Closing server...");
    Ok(())
}
