//! `pandoc` backend: GitHub-flavoured markdown on stdout.
//!
//! pandoc picks its reader from the input extension, which is why the
//! temporary artifact keeps the uploaded file's extension.

use super::{run_command, ConvertedDocument, Converter};
use crate::error::ConverterError;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

/// Converts documents by running `pandoc <input> --to gfm --wrap=none`.
#[derive(Debug, Clone)]
pub struct PandocCli {
    program: String,
}

impl PandocCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Converter for PandocCli {
    fn name(&self) -> &str {
        "pandoc"
    }

    fn convert(
        &self,
        path: &Path,
        deadline: Option<Instant>,
    ) -> Result<ConvertedDocument, ConverterError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg(path).arg("--to").arg("gfm").arg("--wrap=none");

        let output = run_command(&self.program, &mut cmd, deadline)?;
        Ok(ConvertedDocument::from_markdown(String::from_utf8(output.stdout)?))
    }
}
