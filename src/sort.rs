//! Sort-run entry points.
//!
//! [`sort_pdf`] is the whole pipeline: resolve the input, walk the document
//! for links, download every photo concurrently, walk the document again for
//! metadata, then rename and file each photo. Only document-level problems
//! are returned as `Err`; everything that goes wrong with a single photo ends
//! up in [`SortReport::failures`].

use crate::config::SortConfig;
use crate::error::{PageError, SortError};
use crate::output::{PagePlan, ReorganizedFile, SortReport, SortStats};
use crate::pipeline::fetch::{self, FetchOutcome, Fetcher, HttpFetcher};
use crate::pipeline::fields::PageMetadata;
use crate::pipeline::input;
use crate::pipeline::reader::PdfiumReader;
use crate::pipeline::reorganize::{self, NameParts};
use crate::pipeline::walk::{self, DocumentReader};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Download the photos linked from a PDF photo log and file them under
/// `save_dir`.
///
/// # Arguments
/// * `input`: local path or HTTP/HTTPS URL of the PDF
/// * `save_dir`: created if absent; photos land in
///   `{save_dir}/{description}/`
/// * `config`: run configuration
///
/// # Returns
/// `Ok(SortReport)` even if some photos failed; use
/// [`SortReport::into_result`] to treat any failure as an error.
///
/// # Errors
/// - input missing, unreadable or not a PDF
/// - the document cannot be opened (corrupt, encrypted, pdfium missing)
/// - `save_dir` cannot be created
/// - a page has several links under [`crate::MultiLinkPolicy::Reject`]
/// - a download failed with `fail_fast` set
pub async fn sort_pdf(
    input_str: impl AsRef<str>,
    save_dir: impl AsRef<Path>,
    config: &SortConfig,
) -> Result<SortReport, SortError> {
    let start = Instant::now();
    let input_str = input_str.as_ref();
    let save_dir = save_dir.as_ref();
    info!("Sorting photos from {} into {}", input_str, save_dir.display());

    let fetcher = resolve_fetcher(config)?;
    let reader = resolve_reader(config);

    // ── Step 1: Resolve input and output ─────────────────────────────────
    let resolved = input::resolve_input(input_str, fetcher.as_ref()).await?;
    let pdf_path = resolved.path().to_path_buf();

    tokio::fs::create_dir_all(save_dir)
        .await
        .map_err(|e| SortError::OutputDirFailed {
            path: save_dir.to_path_buf(),
            source: e,
        })?;

    // ── Step 2: Link pass ────────────────────────────────────────────────
    let linked = walk::walk_for_links(Arc::clone(&reader), &pdf_path).await?;
    let jobs = fetch::plan_jobs(&linked, config.multi_link)?;
    info!("{} pages, {} photos to download", linked.len(), jobs.len());

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(jobs.len());
    }

    // ── Step 3: Download ─────────────────────────────────────────────────
    let FetchOutcome {
        images,
        failures: fetch_failures,
    } = fetch::fetch_all(
        fetcher.as_ref(),
        &jobs,
        save_dir,
        config.concurrency,
        config.progress_callback.as_ref(),
    )
    .await;

    if config.fail_fast {
        if let Some(first) = fetch_failures.first() {
            return Err(SortError::DownloadAborted {
                page: first.page(),
                detail: first.to_string(),
            });
        }
    }

    // ── Step 4: Metadata pass ────────────────────────────────────────────
    let texts: BTreeMap<usize, String> = walk::walk_for_metadata(reader, &pdf_path)
        .await?
        .into_iter()
        .map(|p| (p.page_number, p.text))
        .collect();

    // ── Step 5: Reconcile and file ───────────────────────────────────────
    let downloads_failed = fetch_failures.len();
    let mut files: Vec<ReorganizedFile> = Vec::new();
    let mut failures: Vec<PageError> = fetch_failures;
    let mut files_unsorted = 0usize;

    for (page_number, page_images) in &images {
        let Some(text) = texts.get(page_number) else {
            for img in page_images {
                warn!(
                    "Page {}: no metadata for {}; leaving it in place",
                    page_number,
                    img.temp_path.display()
                );
                record_failure(
                    config,
                    &mut failures,
                    PageError::Orphaned {
                        page: *page_number,
                        path: img.temp_path.clone(),
                    },
                );
                files_unsorted += 1;
            }
            continue;
        };

        let metadata = PageMetadata::parse(*page_number, text);
        let parts = NameParts::from(&metadata);

        for img in page_images {
            match reorganize::finalize(&img.temp_path, &parts, config.missing_fields).await {
                Ok(filed) => {
                    if let Some(ref cb) = config.progress_callback {
                        cb.on_page_sorted(filed.page_number, &filed.final_path);
                    }
                    files.push(filed);
                }
                Err(e) => {
                    record_failure(config, &mut failures, e);
                    files_unsorted += 1;
                }
            }
        }
    }

    // ── Step 6: Stats ────────────────────────────────────────────────────
    let stats = SortStats {
        total_pages: linked.len(),
        linked_pages: linked.iter().filter(|p| !p.uris.is_empty()).count(),
        downloads_attempted: jobs.len(),
        downloads_failed,
        files_sorted: files.len(),
        files_unsorted,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Sort complete: {}/{} photos filed, {}ms",
        stats.files_sorted, stats.downloads_attempted, stats.duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(files.len(), failures.len());
    }

    Ok(SortReport {
        files,
        failures,
        stats,
    })
}

/// Synchronous wrapper around [`sort_pdf`].
///
/// Creates a temporary tokio runtime internally.
pub fn sort_pdf_sync(
    input_str: impl AsRef<str>,
    save_dir: impl AsRef<Path>,
    config: &SortConfig,
) -> Result<SortReport, SortError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SortError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(sort_pdf(input_str, save_dir, config))
}

/// Sort the photos of a PDF held in memory.
///
/// `bytes` are written to a managed [`tempfile`] that is removed on return.
///
/// # Example
/// ```rust,no_run
/// use pdf_photo_sort::{sort_pdf_bytes, SortConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("site-log.pdf")?;
/// let report = sort_pdf_bytes(&bytes, "photos", &SortConfig::default()).await?;
/// println!("{} photos filed", report.stats.files_sorted);
/// # Ok(())
/// # }
/// ```
pub async fn sort_pdf_bytes(
    bytes: &[u8],
    save_dir: impl AsRef<Path>,
    config: &SortConfig,
) -> Result<SortReport, SortError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| SortError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| SortError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is deleted when it drops after the run
    sort_pdf(&path, save_dir, config).await
}

/// Describe what [`sort_pdf`] would do with each page, without downloading
/// or touching the filesystem beyond reading the input.
pub async fn inspect(
    input_str: impl AsRef<str>,
    config: &SortConfig,
) -> Result<Vec<PagePlan>, SortError> {
    let fetcher = resolve_fetcher(config)?;
    let reader = resolve_reader(config);

    let resolved = input::resolve_input(input_str.as_ref(), fetcher.as_ref()).await?;
    let pdf_path = resolved.path().to_path_buf();

    let linked = walk::walk_for_links(Arc::clone(&reader), &pdf_path).await?;
    let metadata: BTreeMap<usize, PageMetadata> = walk::walk_for_metadata(reader, &pdf_path)
        .await?
        .into_iter()
        .map(|p| (p.page_number, PageMetadata::parse(p.page_number, &p.text)))
        .collect();

    let links: BTreeMap<usize, Vec<String>> = linked
        .into_iter()
        .map(|p| (p.page_number, p.uris))
        .collect();
    let pages: BTreeSet<usize> = links.keys().chain(metadata.keys()).copied().collect();

    let plans = pages
        .into_iter()
        .map(|page_number| {
            let links = links.get(&page_number).cloned().unwrap_or_default();
            let metadata = metadata.get(&page_number).cloned();
            let directory = metadata
                .as_ref()
                .and_then(|m| m.description.clone())
                .filter(|d| reorganize::is_safe_component(d));
            let file_name = match (&metadata, &directory) {
                (Some(m), Some(_)) if !links.is_empty() => Some(reorganize::planned_file_name(
                    &NameParts::from(m),
                    config.missing_fields,
                )),
                _ => None,
            };
            PagePlan {
                page_number,
                links,
                metadata,
                directory,
                file_name,
            }
        })
        .collect::<Vec<_>>();

    debug!("Inspected {} pages", plans.len());
    Ok(plans)
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn resolve_fetcher(config: &SortConfig) -> Result<Arc<dyn Fetcher>, SortError> {
    match config.fetcher {
        Some(ref f) => Ok(Arc::clone(f)),
        None => Ok(Arc::new(HttpFetcher::from_config(config)?)),
    }
}

fn resolve_reader(config: &SortConfig) -> Arc<dyn DocumentReader> {
    match config.reader {
        Some(ref r) => Arc::clone(r),
        None => Arc::new(PdfiumReader::new(
            config.password.clone(),
            config.pdfium_library_path.clone(),
        )),
    }
}

fn record_failure(config: &SortConfig, failures: &mut Vec<PageError>, e: PageError) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_page_failed(e.page(), &e.to_string());
    }
    failures.push(e);
}
