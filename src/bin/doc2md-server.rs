//! CLI binary for doc2md.
//!
//! A thin shim over the library crate that maps CLI flags to `ServerConfig`,
//! installs logging and serves until Ctrl-C.

use anyhow::{Context, Result};
use clap::Parser;
use doc2md::{backend, server, BackendKind, ServerConfig};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "doc2md-server",
    version,
    about = "Serve document-to-Markdown conversion over HTTP",
    long_about = "Accepts multipart uploads on POST /convert_to_markdown/ and returns the \
document as Markdown, using docling or pandoc as the converter."
)]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "DOC2MD_BIND", default_value = doc2md::config::DEFAULT_BIND_ADDR)]
    bind: SocketAddr,

    /// Directory for temporary upload files. Defaults to the OS temp dir.
    #[arg(long, env = "DOC2MD_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Maximum upload size in MiB.
    #[arg(long, env = "DOC2MD_MAX_UPLOAD_MB", default_value_t = 100)]
    max_upload_mb: usize,

    /// Maximum number of conversions running at once.
    #[arg(short, long, env = "DOC2MD_CONCURRENCY", default_value_t = doc2md::config::DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Per-conversion timeout in seconds. No limit when unset.
    #[arg(long, env = "DOC2MD_TIMEOUT")]
    timeout: Option<u64>,

    /// Converter backend.
    #[arg(long, env = "DOC2MD_BACKEND", value_enum, default_value = "docling")]
    backend: BackendArg,

    /// Path to the converter executable (defaults to the backend name on PATH).
    #[arg(long, env = "DOC2MD_CONVERTER")]
    converter: Option<String>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOC2MD_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum BackendArg {
    Docling,
    Pandoc,
}

impl From<BackendArg> for BackendKind {
    fn from(v: BackendArg) -> Self {
        match v {
            BackendArg::Docling => BackendKind::Docling,
            BackendArg::Pandoc => BackendKind::Pandoc,
        }
    }
}

impl Cli {
    fn to_config(&self) -> Result<ServerConfig> {
        let mut builder = ServerConfig::builder()
            .bind_addr(self.bind)
            .max_upload_bytes(self.max_upload_mb.saturating_mul(1024 * 1024))
            .concurrency(self.concurrency)
            .backend(self.backend.clone().into());

        if let Some(dir) = &self.temp_dir {
            builder = builder.temp_dir(dir);
        }
        if let Some(secs) = self.timeout {
            builder = builder.conversion_timeout(Duration::from_secs(secs));
        }
        if let Some(program) = &self.converter {
            builder = builder.converter_program(program);
        }

        builder.build().context("Invalid configuration")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = cli.to_config()?;
    info!(?config, "Configuration loaded");

    if !config.temp_dir.is_dir() {
        anyhow::bail!(
            "Temporary directory '{}' does not exist or is not a directory",
            config.temp_dir.display()
        );
    }

    let converter = backend::from_config(&config);

    server::serve(&config, converter, shutdown_signal())
        .await
        .with_context(|| format!("Server on {} failed", config.bind_addr))?;

    info!("doc2md shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_maps_to_config() {
        let cli = Cli::parse_from([
            "doc2md-server",
            "--bind",
            "0.0.0.0:9000",
            "--max-upload-mb",
            "5",
            "--concurrency",
            "3",
            "--timeout",
            "30",
            "--backend",
            "pandoc",
            "--converter",
            "/opt/pandoc/bin/pandoc",
        ]);
        let config = cli.to_config().unwrap();

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.conversion_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.backend, BackendKind::Pandoc);
        assert_eq!(
            config.converter_program.as_deref(),
            Some("/opt/pandoc/bin/pandoc")
        );
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let cli = Cli::parse_from(["doc2md-server", "--concurrency", "0"]);
        assert!(cli.to_config().is_err());
    }
}
