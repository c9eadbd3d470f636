//! Upload receiver: validate the filename and write the upload to disk.
//!
//! The extension is checked before anything touches the file system, so a
//! rejected upload leaves no trace. Accepted uploads are streamed chunk by
//! chunk into a create-new file; the body is never buffered whole.

use crate::error::Doc2MdError;
use crate::pipeline::artifact::TemporaryArtifact;
use futures::stream::{Stream, StreamExt};
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// A single inbound upload: the client-supplied filename and its byte stream.
#[derive(Debug)]
pub struct UploadedFile<S> {
    /// Only used to derive the extension.
    pub filename: String,
    /// Consumed exactly once by [`receive`].
    pub content: S,
}

impl<S> UploadedFile<S> {
    pub fn new(filename: impl Into<String>, content: S) -> Self {
        Self {
            filename: filename.into(),
            content,
        }
    }
}

#[cfg(test)]
pub(crate) type BytesStream = futures::stream::Iter<
    std::iter::Once<Result<Vec<u8>, std::convert::Infallible>>,
>;

#[cfg(test)]
impl UploadedFile<BytesStream> {
    /// An upload whose content is already in memory.
    pub(crate) fn from_bytes(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(
            filename,
            futures::stream::iter(std::iter::once(Ok(bytes.into()))),
        )
    }
}

/// Derive the extension of `filename`: the text after the last `.` of its
/// final path component. Dot-files (`.bashrc`) and trailing dots (`report.`)
/// have no extension.
pub fn derive_extension(filename: &str) -> Result<String, Doc2MdError> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Doc2MdError::MissingExtension {
            filename: filename.to_string(),
        })
}

/// Validate `upload` and write its full content to a new artifact in `temp_dir`.
///
/// # Errors
/// - [`Doc2MdError::MissingExtension`] before any write happens
/// - whatever the upload stream reports if it fails mid-way
/// - [`Doc2MdError::ArtifactWrite`] if the file cannot be created or written
///
/// In the last two cases the partially written file is removed when the
/// artifact guard drops.
pub async fn receive<S, B, E>(
    temp_dir: &Path,
    upload: UploadedFile<S>,
) -> Result<TemporaryArtifact, Doc2MdError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<Doc2MdError>,
{
    let UploadedFile { filename, content } = upload;
    let extension = derive_extension(&filename)?;

    let artifact = TemporaryArtifact::allocate(temp_dir, &extension);
    let write_err = |source: std::io::Error| Doc2MdError::ArtifactWrite {
        path: artifact.path().to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(artifact.path())
        .await
        .map_err(write_err)?;

    let mut content = std::pin::pin!(content);
    let mut written: u64 = 0;
    while let Some(chunk) = content.next().await {
        let chunk = chunk.map_err(Into::<Doc2MdError>::into)?;
        let bytes = chunk.as_ref();
        file.write_all(bytes).await.map_err(write_err)?;
        written += bytes.len() as u64;
    }
    file.flush().await.map_err(write_err)?;
    drop(file);

    debug!("Upload '{}' written to {}", filename, artifact.path().display());
    info!(
        bytes = written,
        extension = %artifact.extension(),
        "Received upload"
    );

    Ok(artifact)
}
