//! Configuration types for a sort run.
//!
//! All run behaviour is controlled through [`SortConfig`], built via its
//! [`SortConfigBuilder`]. The two external collaborators, the PDF reader and
//! the HTTP fetcher, are injectable here so tests and embedders can replace
//! them without touching the pipeline.

use crate::error::SortError;
use crate::pipeline::fetch::Fetcher;
use crate::pipeline::walk::DocumentReader;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for a sort run.
///
/// Built via [`SortConfig::builder()`] or using [`SortConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf_photo_sort::{MultiLinkPolicy, SortConfig};
///
/// let config = SortConfig::builder()
///     .concurrency(4)
///     .multi_link(MultiLinkPolicy::LastWins)
///     .build()
///     .unwrap();
/// assert_eq!(config.concurrency, 4);
/// ```
#[derive(Clone)]
pub struct SortConfig {
    /// Number of photo downloads in flight at once. Default: 10.
    ///
    /// Downloads are network-bound. A hung request occupies one slot until it
    /// completes, so the run degrades to `concurrency - 1` parallel downloads
    /// rather than stalling.
    pub concurrency: usize,

    /// What to do with pages carrying more than one hyperlink.
    pub multi_link: MultiLinkPolicy,

    /// How absent taken dates and job numbers appear in file names.
    pub missing_fields: MissingFieldStyle,

    /// Stop the run after the first failed download. Default: false.
    ///
    /// Pending downloads are drained first; no photo is renamed.
    pub fail_fast: bool,

    /// Per-download timeout in seconds. Default: `None` (wait forever).
    pub fetch_timeout_secs: Option<u64>,

    /// Treat a non-2xx HTTP status as a failed download. Default: false,
    /// in which case the response body is written whatever the status.
    pub require_success_status: bool,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Explicit pdfium library file. Falls back to `PDFIUM_LIB_PATH`, the
    /// working directory and then the system library.
    pub pdfium_library_path: Option<PathBuf>,

    /// Pre-constructed fetcher. Default: [`crate::HttpFetcher`].
    pub fetcher: Option<Arc<dyn Fetcher>>,

    /// Pre-constructed PDF reader. Default: [`crate::PdfiumReader`].
    pub reader: Option<Arc<dyn DocumentReader>>,

    /// Optional progress callback for per-photo events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            multi_link: MultiLinkPolicy::default(),
            missing_fields: MissingFieldStyle::default(),
            fail_fast: false,
            fetch_timeout_secs: None,
            require_success_status: false,
            password: None,
            pdfium_library_path: None,
            fetcher: None,
            reader: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for SortConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortConfig")
            .field("concurrency", &self.concurrency)
            .field("multi_link", &self.multi_link)
            .field("missing_fields", &self.missing_fields)
            .field("fail_fast", &self.fail_fast)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("require_success_status", &self.require_success_status)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_library_path", &self.pdfium_library_path)
            .field("fetcher", &self.fetcher.as_ref().map(|_| "<dyn Fetcher>"))
            .field("reader", &self.reader.as_ref().map(|_| "<dyn DocumentReader>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn SortProgressCallback>"),
            )
            .finish()
    }
}

impl SortConfig {
    /// Create a new builder for `SortConfig`.
    pub fn builder() -> SortConfigBuilder {
        SortConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`SortConfig`].
#[derive(Debug)]
pub struct SortConfigBuilder {
    config: SortConfig,
}

impl SortConfigBuilder {
    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn multi_link(mut self, policy: MultiLinkPolicy) -> Self {
        self.config.multi_link = policy;
        self
    }

    pub fn missing_fields(mut self, style: MissingFieldStyle) -> Self {
        self.config.missing_fields = style;
        self
    }

    pub fn fail_fast(mut self, v: bool) -> Self {
        self.config.fail_fast = v;
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = Some(secs);
        self
    }

    pub fn require_success_status(mut self, v: bool) -> Self {
        self.config.require_success_status = v;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.config.fetcher = Some(fetcher);
        self
    }

    pub fn reader(mut self, reader: Arc<dyn DocumentReader>) -> Self {
        self.config.reader = Some(reader);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SortConfig, SortError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(SortError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.fetch_timeout_secs == Some(0) {
            return Err(SortError::InvalidConfig(
                "Fetch timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Handling of pages that carry more than one photo link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MultiLinkPolicy {
    /// Download every link; later links get a positional suffix. (default)
    #[default]
    KeepAll,
    /// Download only the last link on the page.
    LastWins,
    /// Fail the run before downloading anything.
    Reject,
}

/// Rendering of absent fields in the final file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MissingFieldStyle {
    /// Absent taken date is omitted, absent job number is empty. (default)
    #[default]
    Empty,
    /// Absent fields are written as the literal text `None`, matching file
    /// names produced by earlier tooling.
    LegacyNone,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = SortConfig::default();
        assert_eq!(c.concurrency, 10);
        assert_eq!(c.multi_link, MultiLinkPolicy::KeepAll);
        assert_eq!(c.missing_fields, MissingFieldStyle::Empty);
        assert!(!c.fail_fast);
        assert!(c.fetch_timeout_secs.is_none());
        assert!(!c.require_success_status);
    }

    #[test]
    fn zero_concurrency_rejected() {
        let err = SortConfig::builder().concurrency(0).build().unwrap_err();
        assert!(matches!(err, SortError::InvalidConfig(_)));
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = SortConfig::builder().fetch_timeout_secs(0).build().unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn debug_redacts_password() {
        let c = SortConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }
}
