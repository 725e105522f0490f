//! Error types for the pdf-photo-sort library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SortError`] is **fatal**: the run cannot proceed at all (input file
//!   missing, PDF cannot be opened, output directory cannot be created).
//!   Returned as `Err(SortError)` from the top-level `sort*` functions.
//!
//! * [`PageError`] is **non-fatal**: one photo could not be downloaded or
//!   filed, but every other page is still processed. Collected into
//!   [`crate::output::SortReport::failures`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-photo-sort library.
///
/// Per-page failures use [`PageError`] and are stored in
/// [`crate::output::SortReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum SortError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Network errors ────────────────────────────────────────────────────
    /// A URL could not be retrieved.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Retrieval exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// A photo download failed and the run was configured to stop on the
    /// first failed download.
    #[error("Aborting: download for page {page} failed: {detail}")]
    DownloadAborted { page: usize, detail: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium could not hand out a page or its text.
    #[error("Text extraction failed for page {page}: {detail}")]
    TextExtractionFailed { page: usize, detail: String },

    /// A page carries several photo links and the run was configured to
    /// reject that layout.
    #[error("Page {page} has {count} hyperlinks; expected at most one")]
    MultipleLinks { page: usize, count: usize },

    /// Some pages were sorted but at least one failed.
    ///
    /// Returned by [`crate::output::SortReport::into_result`] when the
    /// caller wants to treat any page failure as an error.
    #[error("{failed} of {attempted} photos could not be sorted")]
    PartialFailure { attempted: usize, failed: usize },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the save directory.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Place libpdfium next to the binary, install it system-wide, or\n\
set PDFIUM_LIB_PATH=/path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single photo.
///
/// The run continues with the next page after one of these is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The photo URL could not be retrieved.
    #[error("Page {page}: download of '{url}' failed: {detail}")]
    FetchFailed {
        page: usize,
        url: String,
        detail: String,
    },

    /// The photo was retrieved but could not be written to disk.
    #[error("Page {page}: could not write '{path}': {detail}")]
    WriteFailed {
        page: usize,
        path: PathBuf,
        detail: String,
    },

    /// Renaming or moving the downloaded photo failed; the file is left at
    /// `path`.
    #[error("Page {page}: failed to rename {path:?}: {detail}")]
    FinalizeFailed {
        page: usize,
        path: PathBuf,
        detail: String,
    },

    /// A photo was downloaded for a page the metadata pass never produced.
    #[error("Page {page}: no metadata for downloaded photo {path:?}")]
    Orphaned { page: usize, path: PathBuf },
}

impl PageError {
    /// 1-based page the failure belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::FetchFailed { page, .. }
            | PageError::WriteFailed { page, .. }
            | PageError::FinalizeFailed { page, .. }
            | PageError::Orphaned { page, .. } => *page,
        }
    }
}
