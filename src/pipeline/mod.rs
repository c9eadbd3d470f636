//! Request pipeline stages.
//!
//! ```text
//! upload ──▶ receive ──▶ TemporaryArtifact ──▶ invoke ──▶ markdown
//!           (validate,                        (blocking worker,
//!            write file)                       delete file)
//! ```
//!
//! 1. [`receive`]  — derive the extension, stream the upload into a uniquely
//!    named file
//! 2. [`artifact`] — the drop guard that owns that file and deletes it once
//! 3. [`invoke`]   — run the converter on a blocking worker; the artifact is
//!    released on the worker as soon as the converter returns

pub mod artifact;
pub mod invoke;
pub mod receive;
