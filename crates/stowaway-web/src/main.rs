//! Stowaway Web - serve the assets embedded in a container
//!
//! By default the server reads the container it is running from, so a
//! binary built with `stowaway build` serves its own payload.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use stowaway_container::{RestoreConfig, Restorer};
use stowaway_core::{ContainerConfig, Error};
use stowaway_vfs::VirtualFileSystem;
use stowaway_web::{serve, FileServerExt, ServeConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stowaway-web")]
#[command(about = "Serve the assets embedded in a Stowaway container")]
#[command(version)]
struct Cli {
    /// Container to serve (defaults to this executable)
    #[arg(long, env = "STOWAWAY_CONTAINER")]
    container: Option<PathBuf>,

    /// Directories to load from disk when the container has no payload
    #[arg(long)]
    local: Vec<PathBuf>,

    /// Sub-path of the embedded tree to serve
    #[arg(long, default_value = "")]
    base_path: String,

    /// Address to bind
    #[arg(long, env = "STOWAWAY_BIND", default_value = "127.0.0.1")]
    bind: IpAddr,

    /// HTTP port
    #[arg(long, env = "STOWAWAY_PORT", default_value = "8080")]
    port: u16,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Maximum concurrent requests
    #[arg(long, default_value = "64")]
    max_concurrent: usize,

    /// Allow cross-origin requests
    #[arg(long)]
    cors: bool,

    /// Read the container with plain file I/O instead of a memory map
    #[arg(long)]
    no_mmap: bool,

    /// Log level
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log_level: String,

    /// Log at debug level (overrides --log-level)
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&cli))
        .init();

    let container = match cli.container.clone() {
        Some(path) => path,
        None => std::env::current_exe().context("cannot locate the running executable")?,
    };

    let vfs = load(&cli, &container)?;
    tracing::info!("Loaded {} ({} files)", vfs, vfs.len());

    let config = ServeConfig {
        bind: cli.bind,
        port: cli.port,
        base_path: cli.base_path,
        timeout_secs: cli.timeout,
        max_concurrent: cli.max_concurrent,
        cors: cli.cors,
    };

    tracing::info!("  Base path: {:?}", config.base_path);
    tracing::info!("  Timeout: {}s", config.timeout_secs);
    tracing::info!("  Max concurrent: {}", config.max_concurrent);

    let router = vfs
        .file_server(&config.base_path)
        .with_context(|| format!("cannot serve base path {:?}", config.base_path))?;
    serve(router, &config).await?;

    Ok(())
}

fn log_filter(cli: &Cli) -> EnvFilter {
    if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(&cli.log_level)
    }
}

fn load(cli: &Cli, container: &Path) -> Result<VirtualFileSystem> {
    let config = ContainerConfig::default();
    let restorer = Restorer::with_config(
        config.clone(),
        RestoreConfig {
            use_mmap: !cli.no_mmap,
        },
    );

    match restorer.restore(container) {
        Ok(vfs) => Ok(vfs),
        Err(Error::Format(reason)) if !cli.local.is_empty() => {
            tracing::warn!(
                "{} carries no payload ({}), serving local files instead",
                container.display(),
                reason
            );
            VirtualFileSystem::from_local(&config, None, &cli.local)
                .context("cannot load local files")
        }
        Err(e) => Err(e).with_context(|| format!("cannot restore {}", container.display())),
    }
}
