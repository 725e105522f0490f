//! Page walking: the two independent passes over the document.
//!
//! The link pass yields every page's text and outbound hyperlinks; the
//! metadata pass re-opens the document and yields text per page for the
//! final field parse. Downloads are correlated with metadata purely by page
//! number, so page numbering for both passes is assigned here, 1-based and in
//! document order, never by a [`DocumentReader`] implementation.
//!
//! Readers are blocking (pdfium is not async-safe) and are driven from
//! `spawn_blocking`.

use crate::error::SortError;
use crate::pipeline::fields::PageMetadata;
use crate::pipeline::reorganize::is_safe_component;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Label used for provisional file names when a page has no usable
/// description.
pub const FALLBACK_LABEL: &str = "untitled";

/// One page as seen by the link pass, before numbering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPage {
    pub text: String,
    pub uris: Vec<String>,
}

/// Source of page text and hyperlinks.
///
/// Both methods must open the document independently and return pages in
/// document order. A document that cannot be opened is an error.
pub trait DocumentReader: Send + Sync {
    /// Text and hyperlink URIs of every page.
    fn read_linked_pages(&self, path: &Path) -> Result<Vec<RawPage>, SortError>;

    /// Text of every page, indexed by the document's page count.
    fn read_page_texts(&self, path: &Path) -> Result<Vec<String>, SortError>;
}

/// A numbered page from the link pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedPage {
    pub page_number: usize,
    pub text: String,
    pub uris: Vec<String>,
    /// Provisional file-name label from this pass's own field parse.
    pub label: String,
}

/// A numbered page from the metadata pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_number: usize,
    pub text: String,
}

/// Label for provisional download names: the page's description when it is
/// safe to use as a path component, [`FALLBACK_LABEL`] otherwise.
pub fn provisional_label(description: Option<&str>) -> String {
    match description {
        Some(d) if is_safe_component(d) => d.to_string(),
        _ => FALLBACK_LABEL.to_string(),
    }
}

/// Number raw link-pass pages and derive their labels.
pub fn number_linked_pages(raw: Vec<RawPage>) -> Vec<LinkedPage> {
    raw.into_iter()
        .enumerate()
        .map(|(idx, page)| {
            let page_number = idx + 1;
            let meta = PageMetadata::parse(page_number, &page.text);
            LinkedPage {
                page_number,
                label: provisional_label(meta.description.as_deref()),
                text: page.text,
                uris: page.uris,
            }
        })
        .collect()
}

/// Number raw metadata-pass pages.
pub fn number_page_texts(raw: Vec<String>) -> Vec<PageText> {
    raw.into_iter()
        .enumerate()
        .map(|(idx, text)| PageText {
            page_number: idx + 1,
            text,
        })
        .collect()
}

/// Link pass: every page's text, hyperlinks and provisional label.
pub async fn walk_for_links(
    reader: Arc<dyn DocumentReader>,
    pdf_path: &Path,
) -> Result<Vec<LinkedPage>, SortError> {
    let path: PathBuf = pdf_path.to_path_buf();
    let raw = tokio::task::spawn_blocking(move || reader.read_linked_pages(&path))
        .await
        .map_err(|e| SortError::Internal(format!("Link pass panicked: {}", e)))??;

    let pages = number_linked_pages(raw);
    debug!(
        "Link pass: {} pages, {} hyperlinks",
        pages.len(),
        pages.iter().map(|p| p.uris.len()).sum::<usize>()
    );
    Ok(pages)
}

/// Metadata pass: every page's text, read through a fresh document handle.
pub async fn walk_for_metadata(
    reader: Arc<dyn DocumentReader>,
    pdf_path: &Path,
) -> Result<Vec<PageText>, SortError> {
    let path: PathBuf = pdf_path.to_path_buf();
    let raw = tokio::task::spawn_blocking(move || reader.read_page_texts(&path))
        .await
        .map_err(|e| SortError::Internal(format!("Metadata pass panicked: {}", e)))??;

    debug!("Metadata pass: {} pages", raw.len());
    Ok(number_page_texts(raw))
}
