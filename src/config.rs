//! Server configuration.
//!
//! Everything the service needs at startup lives in [`ServerConfig`], built
//! through [`ServerConfigBuilder`]. Callers set only the knobs they care about
//! and get documented defaults for the rest; `build()` rejects combinations
//! that would make the service unusable.

use crate::error::Doc2MdError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

/// Default upload limit: 100 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Default number of conversions allowed to run at once.
pub const DEFAULT_CONCURRENCY: usize = 40;

/// Configuration for the conversion service.
///
/// # Example
/// ```rust
/// use doc2md::{BackendKind, ServerConfig};
///
/// let config = ServerConfig::builder()
///     .concurrency(4)
///     .backend(BackendKind::Pandoc)
///     .build()
///     .unwrap();
/// assert_eq!(config.concurrency, 4);
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to. Default: `127.0.0.1:8000`.
    pub bind_addr: SocketAddr,

    /// Directory where temporary artifacts are written. Default: the OS
    /// temporary directory.
    pub temp_dir: PathBuf,

    /// Largest accepted request body in bytes. Default: 100 MiB.
    pub max_upload_bytes: usize,

    /// Maximum number of conversions running on blocking workers at once.
    /// Default: 40.
    ///
    /// Requests beyond this wait for a free worker after their upload has
    /// been written; the accept loop is never blocked.
    pub concurrency: usize,

    /// Optional upper bound on a single conversion. Default: none.
    pub conversion_timeout: Option<Duration>,

    /// Which converter backend to construct. Default: [`BackendKind::Docling`].
    pub backend: BackendKind,

    /// Path or name of the converter executable. If None, the backend's
    /// default program name is looked up on `PATH`.
    pub converter_program: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            temp_dir: std::env::temp_dir(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            concurrency: DEFAULT_CONCURRENCY,
            conversion_timeout: None,
            backend: BackendKind::default(),
            converter_program: None,
        }
    }
}

impl ServerConfig {
    /// Create a new builder for `ServerConfig`.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.config.bind_addr = addr;
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = dir.into();
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn conversion_timeout(mut self, limit: Duration) -> Self {
        self.config.conversion_timeout = Some(limit);
        self
    }

    pub fn backend(mut self, kind: BackendKind) -> Self {
        self.config.backend = kind;
        self
    }

    pub fn converter_program(mut self, program: impl Into<String>) -> Self {
        self.config.converter_program = Some(program.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServerConfig, Doc2MdError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(Doc2MdError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(Doc2MdError::InvalidConfig(
                "Maximum upload size must be > 0".into(),
            ));
        }
        if c.conversion_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Doc2MdError::InvalidConfig(
                "Conversion timeout must be > 0".into(),
            ));
        }
        if c.temp_dir.as_os_str().is_empty() {
            return Err(Doc2MdError::InvalidConfig(
                "Temporary directory must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

/// The external tool used to turn a document into markdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// `docling` CLI: layout-aware conversion of PDF, Office and image
    /// documents. (default)
    #[default]
    Docling,
    /// `pandoc`: markup and office formats, markdown on stdout.
    Pandoc,
}

impl BackendKind {
    /// Program name looked up on `PATH` when no override is configured.
    pub fn default_program(self) -> &'static str {
        match self {
            BackendKind::Docling => "docling",
            BackendKind::Pandoc => "pandoc",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_program())
    }
}
