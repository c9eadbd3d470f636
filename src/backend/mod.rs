//! Converter backends: the external tools that turn a document into markdown.
//!
//! The service never parses documents itself. It hands a file-system path to
//! a [`Converter`] and takes back a [`ConvertedDocument`]. Converters are
//! blocking by contract; [`crate::pipeline::invoke`] runs them on a
//! dedicated worker thread.
//!
//! Two command-line backends ship with the crate:
//!
//! | Backend | Tool | Output channel |
//! |---------|------|----------------|
//! | [`DoclingCli`] | `docling --to md` | `<stem>.md` in a scratch directory |
//! | [`PandocCli`]  | `pandoc --to gfm` | stdout |
//!
//! Anything else (an in-process library, a remote service, a test stub) only
//! needs to implement [`Converter`].
//!
//! ## Deadlines
//!
//! When a conversion timeout is configured, each call receives the instant
//! by which it must return. The command-line backends kill their child
//! process at that instant and report [`ConverterError::DeadlineExceeded`].
//! The request waits for the converter to actually return, so the artifact
//! is always gone before the client sees the timeout.

pub mod docling;
pub mod pandoc;

pub use docling::DoclingCli;
pub use pandoc::PandocCli;

use crate::config::{BackendKind, ServerConfig};
use crate::error::ConverterError;
use std::io::Read;
use std::path::Path;
use std::process::{Command, ExitStatus, Output, Stdio};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How often a child process with a deadline is checked for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A blocking document-to-markdown converter.
///
/// Implementations may be slow and may fail; they are always called from a
/// blocking worker, never from an async task.
pub trait Converter: Send + Sync + 'static {
    /// Short name used in logs and the health endpoint.
    fn name(&self) -> &str;

    /// Convert the document at `path`.
    ///
    /// With `Some(deadline)`, the implementation must give up by that instant
    /// and return [`ConverterError::DeadlineExceeded`]. The caller does not
    /// abandon a converter that overruns; it waits for it.
    fn convert(
        &self,
        path: &Path,
        deadline: Option<Instant>,
    ) -> Result<ConvertedDocument, ConverterError>;
}

/// The result of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedDocument {
    markdown: String,
}

impl ConvertedDocument {
    pub fn from_markdown(markdown: impl Into<String>) -> Self {
        Self {
            markdown: markdown.into(),
        }
    }

    /// Render the document as markdown text.
    pub fn export_to_markdown(&self) -> String {
        self.markdown.clone()
    }
}

/// Construct the backend selected in `config`.
pub fn from_config(config: &ServerConfig) -> Arc<dyn Converter> {
    let program = config
        .converter_program
        .clone()
        .unwrap_or_else(|| config.backend.default_program().to_string());

    match config.backend {
        BackendKind::Docling => Arc::new(DoclingCli::new(program)),
        BackendKind::Pandoc => Arc::new(PandocCli::new(program)),
    }
}

/// Run `cmd` to completion and fail unless it exits successfully.
///
/// With a deadline the child is killed once it passes, and
/// [`ConverterError::DeadlineExceeded`] is returned after the child has been
/// reaped.
fn run_command(
    program: &str,
    cmd: &mut Command,
    deadline: Option<Instant>,
) -> Result<Output, ConverterError> {
    debug!("Running converter: {:?}", cmd);
    let launch_err = |source: std::io::Error| ConverterError::Launch {
        program: program.to_string(),
        source,
    };

    let Some(deadline) = deadline else {
        let output = cmd.output().map_err(launch_err)?;
        return check_exit(program, output);
    };

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(launch_err)?;
    // Both pipes are drained concurrently so a chatty child cannot block on
    // a full pipe while we wait for it.
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status: ExitStatus = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        let now = Instant::now();
        if now >= deadline {
            if let Err(e) = child.kill() {
                warn!(program, error = %e, "Failed to kill converter past its deadline");
            }
            child.wait()?;
            return Err(ConverterError::DeadlineExceeded {
                program: program.to_string(),
            });
        }
        std::thread::sleep(POLL_INTERVAL.min(deadline - now));
    };

    let output = Output {
        status,
        stdout: stdout.join().unwrap_or_default(),
        stderr: stderr.join().unwrap_or_default(),
    };
    check_exit(program, output)
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(e) = pipe.read_to_end(&mut buf) {
                debug!("Converter pipe closed early: {}", e);
            }
        }
        buf
    })
}

fn check_exit(program: &str, output: Output) -> Result<Output, ConverterError> {
    if !output.status.success() {
        return Err(ConverterError::Exited {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::{Path, PathBuf};

    /// Write an executable shell script named `name` into `dir`.
    #[cfg(unix)]
    pub fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }
}
