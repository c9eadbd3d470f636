//! `docling` command-line backend.
//!
//! docling writes its result to `<output dir>/<input stem>.md` rather than to
//! stdout, so each conversion gets its own `TempDir` as output directory. The
//! directory is removed when the `TempDir` drops, whatever the outcome.

use super::{run_command, ConvertedDocument, Converter};
use crate::error::ConverterError;
use std::path::Path;
use std::process::Command;
use std::time::Instant;
use tempfile::TempDir;
use tracing::debug;

/// Converts documents by shelling out to the `docling` CLI.
#[derive(Debug, Clone)]
pub struct DoclingCli {
    program: String,
}

impl DoclingCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Converter for DoclingCli {
    fn name(&self) -> &str {
        "docling"
    }

    fn convert(
        &self,
        path: &Path,
        deadline: Option<Instant>,
    ) -> Result<ConvertedDocument, ConverterError> {
        let scratch = TempDir::new()?;

        let mut cmd = Command::new(&self.program);
        cmd.arg("--to")
            .arg("md")
            .arg("--output")
            .arg(scratch.path())
            .arg(path);
        run_command(&self.program, &mut cmd, deadline)?;

        let stem = path
            .file_stem()
            .ok_or_else(|| {
                ConverterError::Failed(format!("no file stem in '{}'", path.display()))
            })?;
        let md_path = scratch
            .path()
            .join(format!("{}.md", stem.to_string_lossy()));

        let bytes = match std::fs::read(&md_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConverterError::MissingOutput {
                    program: self.program.clone(),
                    path: md_path,
                });
            }
            Err(e) => return Err(e.into()),
        };
        debug!("docling wrote {} bytes to {}", bytes.len(), md_path.display());

        Ok(ConvertedDocument::from_markdown(String::from_utf8(bytes)?))
    }
}
