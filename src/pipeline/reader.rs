//! pdfium-backed [`DocumentReader`].
//!
//! Each pass binds pdfium and loads the document afresh, so the two passes
//! never share a handle. The link pass walks `pages().iter()`; the metadata
//! pass walks `0..pages().len()` by index. Both are document order.

use crate::error::SortError;
use crate::pipeline::walk::{DocumentReader, RawPage};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit pdfium library file.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Reads page text and URI link actions through pdfium.
#[derive(Debug, Clone, Default)]
pub struct PdfiumReader {
    password: Option<String>,
    library_path: Option<PathBuf>,
}

impl PdfiumReader {
    pub fn new(password: Option<String>, library_path: Option<PathBuf>) -> Self {
        Self {
            password,
            library_path,
        }
    }

    fn bind(&self) -> Result<Pdfium, SortError> {
        bind_pdfium(self.library_path.as_deref())
    }
}

/// Bind pdfium, trying in order: `explicit`, `$PDFIUM_LIB_PATH`, the working
/// directory, the system library.
pub fn bind_pdfium(explicit: Option<&Path>) -> Result<Pdfium, SortError> {
    let from_env = std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from);

    let bindings = match explicit.map(Path::to_path_buf).or(from_env) {
        Some(lib) => Pdfium::bind_to_library(&lib)
            .map_err(|e| SortError::PdfiumBindingFailed(format!("{}: {:?}", lib.display(), e)))?,
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| SortError::PdfiumBindingFailed(format!("{:?}", e)))?,
    };

    Ok(Pdfium::new(bindings))
}

fn load_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, SortError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                SortError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                SortError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            SortError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

/// Text of a page; pages without a text layer yield an empty string.
fn page_text(page: &PdfPage, page_num: usize) -> String {
    match page.text() {
        Ok(text) => text.all(),
        Err(e) => {
            warn!("Page {}: no extractable text ({:?})", page_num, e);
            String::new()
        }
    }
}

/// URIs of every link annotation on the page that carries a URI action.
fn page_uris(page: &PdfPage) -> Vec<String> {
    page.links()
        .iter()
        .filter_map(|link| match link.action() {
            Some(PdfAction::Uri(action)) => action.uri().ok(),
            _ => None,
        })
        .collect()
}

impl DocumentReader for PdfiumReader {
    fn read_linked_pages(&self, path: &Path) -> Result<Vec<RawPage>, SortError> {
        let pdfium = self.bind()?;
        let document = load_document(&pdfium, path, self.password.as_deref())?;
        info!("PDF loaded for link pass: {} pages", document.pages().len());

        let pages = document
            .pages()
            .iter()
            .enumerate()
            .map(|(idx, page)| {
                let raw = RawPage {
                    text: page_text(&page, idx + 1),
                    uris: page_uris(&page),
                };
                debug!("Page {}: {} links", idx + 1, raw.uris.len());
                raw
            })
            .collect();

        Ok(pages)
    }

    fn read_page_texts(&self, path: &Path) -> Result<Vec<String>, SortError> {
        let pdfium = self.bind()?;
        let document = load_document(&pdfium, path, self.password.as_deref())?;
        let pages = document.pages();
        let page_count = pages.len();
        info!("PDF loaded for metadata pass: {} pages", page_count);

        let mut texts = Vec::with_capacity(page_count as usize);
        for idx in 0..page_count {
            let page_num = idx as usize + 1;
            let page = pages
                .get(idx)
                .map_err(|e| SortError::TextExtractionFailed {
                    page: page_num,
                    detail: format!("{:?}", e),
                })?;
            texts.push(page_text(&page, page_num));
        }

        Ok(texts)
    }
}
