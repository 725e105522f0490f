//! Photo retrieval: download every hyperlinked photo concurrently.
//!
//! Each link becomes a [`FetchJob`]; jobs run through
//! `buffer_unordered(concurrency)` and complete in any order. Results are
//! keyed by the page number each job carries, never by completion order, and
//! the page → photos map is only assembled once every job has finished.
//!
//! Bodies are written verbatim: unless `require_success_status` is set, an
//! error page is saved just like a photo would be.

use crate::config::{MultiLinkPolicy, SortConfig};
use crate::error::{PageError, SortError};
use crate::output::FetchedImage;
use crate::pipeline::reorganize::PHOTO_EXTENSION;
use crate::pipeline::walk::LinkedPage;
use crate::progress::ProgressCallback;
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Retrieves the bytes behind a URL.
pub trait Fetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, SortError>>;
}

/// [`Fetcher`] over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout_secs: Option<u64>,
    require_success: bool,
}

impl HttpFetcher {
    pub fn new(timeout_secs: Option<u64>, require_success: bool) -> Result<Self, SortError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| SortError::Internal(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout_secs,
            require_success,
        })
    }

    /// Fetcher configured from `config`.
    pub fn from_config(config: &SortConfig) -> Result<Self, SortError> {
        Self::new(config.fetch_timeout_secs, config.require_success_status)
    }

    fn map_err(&self, url: &str, e: reqwest::Error) -> SortError {
        match self.timeout_secs {
            Some(secs) if e.is_timeout() => SortError::DownloadTimeout {
                url: url.to_string(),
                secs,
            },
            _ => SortError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            },
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, SortError>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| self.map_err(url, e))?;

            let status = response.status();
            if !status.is_success() {
                if self.require_success {
                    return Err(SortError::DownloadFailed {
                        url: url.to_string(),
                        reason: format!("HTTP {}", status),
                    });
                }
                warn!("{} returned HTTP {}; saving body anyway", url, status);
            }

            let bytes = response.bytes().await.map_err(|e| self.map_err(url, e))?;
            Ok(bytes.to_vec())
        })
    }
}

/// One photo download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchJob {
    pub page_number: usize,
    /// 0-based position among the page's downloaded links.
    pub position: usize,
    pub url: String,
    pub label: String,
}

impl FetchJob {
    /// `{label}_{page}.jpeg` for the first link on a page,
    /// `{label}_{page}_{n}.jpeg` (n = 1-based position) for later ones.
    pub fn file_name(&self) -> String {
        if self.position == 0 {
            format!("{}_{}.{}", self.label, self.page_number, PHOTO_EXTENSION)
        } else {
            format!(
                "{}_{}_{}.{}",
                self.label,
                self.page_number,
                self.position + 1,
                PHOTO_EXTENSION
            )
        }
    }
}

/// Turn link-pass pages into download jobs. Pages without links produce none.
pub fn plan_jobs(pages: &[LinkedPage], policy: MultiLinkPolicy) -> Result<Vec<FetchJob>, SortError> {
    let mut jobs = Vec::new();
    for page in pages {
        let uris: &[String] = match policy {
            MultiLinkPolicy::KeepAll => &page.uris,
            MultiLinkPolicy::LastWins => match page.uris.split_last() {
                Some((last, _)) => std::slice::from_ref(last),
                None => &[],
            },
            MultiLinkPolicy::Reject if page.uris.len() > 1 => {
                return Err(SortError::MultipleLinks {
                    page: page.page_number,
                    count: page.uris.len(),
                });
            }
            MultiLinkPolicy::Reject => &page.uris,
        };

        jobs.extend(uris.iter().enumerate().map(|(position, url)| FetchJob {
            page_number: page.page_number,
            position,
            url: url.clone(),
            label: page.label.clone(),
        }));
    }
    Ok(jobs)
}

/// Download one photo into `directory` under its provisional name.
pub async fn fetch_image(
    fetcher: &dyn Fetcher,
    job: &FetchJob,
    directory: &Path,
) -> Result<FetchedImage, PageError> {
    let bytes = fetcher
        .fetch(&job.url)
        .await
        .map_err(|e| PageError::FetchFailed {
            page: job.page_number,
            url: job.url.clone(),
            detail: e.to_string(),
        })?;

    if !matches!(image::guess_format(&bytes), Ok(image::ImageFormat::Jpeg)) {
        warn!(
            "Page {}: body of {} ({} bytes) does not look like a JPEG",
            job.page_number,
            job.url,
            bytes.len()
        );
    }

    let path: PathBuf = directory.join(job.file_name());
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| PageError::WriteFailed {
            page: job.page_number,
            path: path.clone(),
            detail: e.to_string(),
        })?;

    debug!("Page {}: {} bytes → {}", job.page_number, bytes.len(), path.display());

    Ok(FetchedImage {
        page_number: job.page_number,
        position: job.position,
        url: job.url.clone(),
        temp_path: path,
        byte_len: bytes.len(),
    })
}

/// Downloads of a batch, keyed by page number.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Photos per page, ordered by link position.
    pub images: BTreeMap<usize, Vec<FetchedImage>>,
    /// Failed downloads, ordered by page and position.
    pub failures: Vec<PageError>,
}

/// Run every job with at most `concurrency` downloads in flight.
pub async fn fetch_all(
    fetcher: &dyn Fetcher,
    jobs: &[FetchJob],
    directory: &Path,
    concurrency: usize,
    progress: Option<&ProgressCallback>,
) -> FetchOutcome {
    info!("Downloading {} photos ({} at a time)", jobs.len(), concurrency);

    let mut results: Vec<(&FetchJob, Result<FetchedImage, PageError>)> =
        stream::iter(jobs.iter().map(|job| async move {
            if let Some(cb) = progress {
                cb.on_fetch_start(job.page_number, &job.url);
            }
            let result = fetch_image(fetcher, job, directory).await;
            if let Some(cb) = progress {
                match &result {
                    Ok(img) => cb.on_fetch_complete(img.page_number, img.byte_len),
                    Err(e) => cb.on_fetch_error(job.page_number, &e.to_string()),
                }
            }
            (job, result)
        }))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    // Every job has finished; order by page and link position from here on.
    results.sort_by_key(|(job, _)| (job.page_number, job.position));

    let mut outcome = FetchOutcome::default();
    for (_, result) in results {
        match result {
            Ok(img) => outcome.images.entry(img.page_number).or_default().push(img),
            Err(e) => {
                warn!("{}", e);
                outcome.failures.push(e);
            }
        }
    }
    outcome
}
