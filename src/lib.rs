//! # pdf-photo-sort
//!
//! Download the photos linked from a PDF photo log and file them by their
//! metadata.
//!
//! A photo log is a PDF where every page carries one hyperlinked photo and a
//! block of text describing it:
//!
//! ```text
//! North Roof
//! Description
//! Uploaded By
//! Alice
//! Taken Date
//! 03/01/2020 at 10:00 AM
//! Upload Date
//! 03/02/2020 at 08:15 AM
//! Job #: 4711
//! ```
//!
//! Each photo is downloaded and ends up as
//! `{save_dir}/North-Roof/NorthRoof_3_03_01_2020_4711.jpeg`.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Links     walk pages for text + hyperlinks (pdfium, spawn_blocking)
//!  ├─ 3. Fetch     concurrent downloads to {label}_{page}.jpeg
//!  ├─ 4. Metadata  walk pages again for the authoritative text
//!  ├─ 5. Fields    regex extraction + sanitising per page
//!  └─ 6. File      rename, de-duplicate, move into {description}/
//! ```
//!
//! Downloads and metadata are matched by page number only. A photo whose
//! download, rename or move fails is logged and recorded in
//! [`SortReport::failures`]; the rest of the run carries on.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_photo_sort::{sort_pdf, SortConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SortConfig::default();
//!     let report = sort_pdf("site-log.pdf", "photos", &config).await?;
//!     eprintln!("{} filed, {} failed",
//!         report.stats.files_sorted,
//!         report.failures.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-photo-sort` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf-photo-sort = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod sort;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{MissingFieldStyle, MultiLinkPolicy, SortConfig, SortConfigBuilder};
pub use error::{PageError, SortError};
pub use output::{FetchedImage, PagePlan, ReorganizedFile, SortReport, SortStats};
pub use pipeline::fetch::{Fetcher, HttpFetcher};
pub use pipeline::fields::PageMetadata;
pub use pipeline::input::normalize_save_dir;
pub use pipeline::reader::PdfiumReader;
pub use pipeline::walk::{DocumentReader, RawPage};
pub use progress::{NoopProgressCallback, ProgressCallback, SortProgressCallback};
pub use sort::{inspect, sort_pdf, sort_pdf_bytes, sort_pdf_sync};
