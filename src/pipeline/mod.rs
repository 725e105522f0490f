//! Pipeline stages for sorting the photos of a PDF photo log.
//!
//! Each submodule implements one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ walk (links) ──▶ fetch ──▶ walk (metadata) ──▶ fields ──▶ reorganize
//! (path/URL)  (pdfium)      (HTTP)     (pdfium, again)   (regex)    (rename + move)
//! ```
//!
//! 1. [`input`]: canonicalise the PDF path or URL and the save directory
//! 2. [`walk`]: the two independent passes over the document, driven
//!    through a [`walk::DocumentReader`] in `spawn_blocking`; [`reader`]
//!    is the pdfium implementation
//! 3. [`fetch`]: download every hyperlinked photo with bounded
//!    concurrency, keyed by page number
//! 4. [`fields`]: parse a page's text into [`fields::PageMetadata`], using
//!    [`sanitize`] to turn each match into a path-safe token
//! 5. [`reorganize`]: rename each photo from its metadata and file it under
//!    its description directory

pub mod fetch;
pub mod fields;
pub mod input;
pub mod reader;
pub mod reorganize;
pub mod sanitize;
pub mod walk;
