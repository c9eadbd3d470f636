//! Conversion invoker: run the converter off the async runtime and clean up.
//!
//! ## Why spawn_blocking?
//!
//! Converters are external tools or heavy libraries that block for seconds.
//! `tokio::task::spawn_blocking` moves each call onto tokio's blocking pool so
//! the worker threads that accept and drive requests never stall.
//!
//! ## Who deletes the artifact?
//!
//! The artifact moves into the blocking closure and is released there, right
//! after the converter returns. That makes the ordering write → convert →
//! delete hold on every path:
//!
//! - success and converter error: `release()` runs before the closure returns;
//! - converter panic: unwinding drops the artifact;
//! - timeout: the converter is handed a deadline and stops itself there, and
//!   the request still waits for the worker, so the artifact is gone before
//!   the timeout is reported;
//! - request cancelled while converting: the worker still owns the artifact
//!   and deletes it once the converter finishes, never under a converter that
//!   is still reading it.
//!
//! Before dispatch (waiting for a permit) the request future owns the
//! artifact, and dropping the future deletes it.

use crate::backend::Converter;
use crate::error::{ConverterError, Doc2MdError};
use crate::pipeline::artifact::TemporaryArtifact;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Runs conversions on blocking workers, at most `concurrency` at a time.
#[derive(Clone)]
pub struct ConversionInvoker {
    converter: Arc<dyn Converter>,
    permits: Arc<Semaphore>,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for ConversionInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionInvoker")
            .field("converter", &self.converter.name())
            .field("available_permits", &self.permits.available_permits())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ConversionInvoker {
    pub fn new(converter: Arc<dyn Converter>, concurrency: usize, timeout: Option<Duration>) -> Self {
        Self {
            converter,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            timeout,
        }
    }

    pub fn converter(&self) -> &Arc<dyn Converter> {
        &self.converter
    }

    /// Convert `artifact` to markdown, consuming (and deleting) it.
    ///
    /// # Errors
    /// - [`Doc2MdError::Conversion`] when the converter fails
    /// - [`Doc2MdError::WorkerFailed`] when the converter panics
    /// - [`Doc2MdError::Timeout`] when the converter is stopped at the
    ///   configured limit; the artifact is already deleted at that point
    pub async fn convert(&self, artifact: TemporaryArtifact) -> Result<String, Doc2MdError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| Doc2MdError::WorkerFailed(e.to_string()))?;

        let converter = Arc::clone(&self.converter);
        let start = Instant::now();
        let deadline = self.timeout.map(|limit| start + limit);
        debug!(
            "Dispatching {} to {}",
            artifact.path().display(),
            converter.name()
        );

        let joined = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let outcome = converter
                .convert(artifact.path(), deadline)
                .map(|doc| doc.export_to_markdown());
            artifact.release();
            outcome
        })
        .await;

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match joined {
            Ok(Ok(markdown)) => {
                info!(
                    converter = %self.converter.name(),
                    elapsed_ms,
                    chars = markdown.len(),
                    "Conversion succeeded"
                );
                Ok(markdown)
            }
            Ok(Err(ConverterError::DeadlineExceeded { program })) => {
                let limit = self.timeout.unwrap_or_default();
                warn!(converter = %program, elapsed_ms, "Conversion stopped after {:?}", limit);
                Err(Doc2MdError::Timeout { limit })
            }
            Ok(Err(e)) => Err(Doc2MdError::Conversion(e)),
            Err(e) => Err(Doc2MdError::WorkerFailed(e.to_string())),
        }
    }
}
