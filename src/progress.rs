//! Progress-callback trait for per-photo events.
//!
//! Inject an [`Arc<dyn SortProgressCallback>`] via
//! [`crate::config::SortConfigBuilder::progress_callback`] to receive events
//! while photos download and are filed. The library itself reports nothing
//! beyond `tracing` output; the CLI uses this hook to drive its progress bar.

use std::path::Path;
use std::sync::Arc;

/// Called by the pipeline as it downloads and files each photo.
///
/// Downloads run concurrently, so `on_fetch_*` may be called from several
/// tasks at once and in any order. Filing is sequential. All methods default
/// to no-ops.
pub trait SortProgressCallback: Send + Sync {
    /// Called once, after the link pass, with the number of downloads queued.
    fn on_run_start(&self, total_downloads: usize) {
        let _ = total_downloads;
    }

    /// Called just before a photo request is sent.
    fn on_fetch_start(&self, page_num: usize, url: &str) {
        let _ = (page_num, url);
    }

    /// Called when a photo has been written to its provisional file.
    fn on_fetch_complete(&self, page_num: usize, bytes: usize) {
        let _ = (page_num, bytes);
    }

    /// Called when a photo could not be downloaded or written.
    fn on_fetch_error(&self, page_num: usize, error: &str) {
        let _ = (page_num, error);
    }

    /// Called when a photo reached its final location.
    fn on_page_sorted(&self, page_num: usize, final_path: &Path) {
        let _ = (page_num, final_path);
    }

    /// Called when a downloaded photo could not be renamed or moved.
    fn on_page_failed(&self, page_num: usize, error: &str) {
        let _ = (page_num, error);
    }

    /// Called once after every photo has been attempted.
    fn on_run_complete(&self, sorted: usize, failed: usize) {
        let _ = (sorted, failed);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SortProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SortConfig`].
pub type ProgressCallback = Arc<dyn SortProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Tracking {
        fetched: AtomicUsize,
        fetch_errors: AtomicUsize,
        sorted: AtomicUsize,
    }

    impl SortProgressCallback for Tracking {
        fn on_fetch_complete(&self, _page_num: usize, _bytes: usize) {
            self.fetched.fetch_add(1, Ordering::SeqCst);
        }

        fn on_fetch_error(&self, _page_num: usize, _error: &str) {
            self.fetch_errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_sorted(&self, _page_num: usize, _final_path: &Path) {
            self.sorted.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(3);
        cb.on_fetch_start(1, "https://photos.example/1.jpg");
        cb.on_fetch_complete(1, 2048);
        cb.on_fetch_error(2, "timed out");
        cb.on_page_sorted(1, Path::new("/tmp/Roof/Roof_1_12.jpeg"));
        cb.on_page_failed(3, "permission denied");
        cb.on_run_complete(1, 2);
    }

    #[test]
    fn overridden_methods_receive_events() {
        let tracker = Arc::new(Tracking::default());
        let cb: ProgressCallback = tracker.clone();
        cb.on_fetch_complete(1, 10);
        cb.on_fetch_complete(2, 20);
        cb.on_fetch_error(3, "boom");
        cb.on_page_sorted(1, Path::new("a.jpeg"));
        cb.on_run_complete(1, 1);

        assert_eq!(tracker.fetched.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.fetch_errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.sorted.load(Ordering::SeqCst), 1);
    }
}
