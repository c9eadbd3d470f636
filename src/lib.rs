//! # doc2md
//!
//! An HTTP service that converts uploaded documents to Markdown.
//!
//! The service does not parse documents itself. It owns the request
//! lifecycle around an external [`Converter`]: write the upload to a uniquely
//! named temporary file that keeps its extension, run the converter on a
//! blocking worker so slow conversions never stall the server, and delete the
//! temporary file on every exit path.
//!
//! ## Request Lifecycle
//!
//! ```text
//! POST /convert_to_markdown/  (multipart, field "file")
//!  │
//!  ├─ 1. Receive   derive extension, reject if none (400)
//!  ├─ 2. Write     stream bytes to <tmp>/<uuid>.<ext>
//!  ├─ 3. Convert   Converter::convert on spawn_blocking, bounded by a semaphore
//!  ├─ 4. Cleanup   artifact deleted on the worker, whatever the outcome
//!  └─ 5. Respond   200 text/plain markdown, or a JSON error (400/413/500)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doc2md::{backend, server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::builder().concurrency(8).build()?;
//!     let converter = backend::from_config(&config);
//!     server::serve(&config, converter, async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2md-server` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{ConvertedDocument, Converter, DoclingCli, PandocCli};
pub use config::{BackendKind, ServerConfig, ServerConfigBuilder};
pub use error::{ConverterError, Doc2MdError};
pub use pipeline::artifact::TemporaryArtifact;
pub use pipeline::invoke::ConversionInvoker;
pub use pipeline::receive::{derive_extension, receive, UploadedFile};
pub use server::{router, serve, AppState};
