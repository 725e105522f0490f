//! Result types produced by a sort run.

use crate::error::{PageError, SortError};
use crate::pipeline::fields::PageMetadata;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A photo written to its provisional `{label}_{page}.jpeg` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedImage {
    /// 1-based page the link was found on.
    pub page_number: usize,
    /// 0-based position of the link among the page's downloaded links.
    pub position: usize,
    pub url: String,
    pub temp_path: PathBuf,
    pub byte_len: usize,
}

/// A photo in its final location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorganizedFile {
    pub page_number: usize,
    /// Provisional path the photo was downloaded to.
    pub source_path: PathBuf,
    /// `{save_dir}/{description}/{name}.jpeg`
    pub final_path: PathBuf,
    pub description: String,
}

/// Run statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortStats {
    /// Pages seen by the link pass.
    pub total_pages: usize,
    /// Pages with at least one hyperlink.
    pub linked_pages: usize,
    pub downloads_attempted: usize,
    pub downloads_failed: usize,
    pub files_sorted: usize,
    /// Downloads that could not be renamed, moved or matched to metadata.
    pub files_unsorted: usize,
    pub duration_ms: u64,
}

/// Everything a sort run did.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SortReport {
    /// Sorted photos, in page order.
    pub files: Vec<ReorganizedFile>,
    /// Non-fatal failures, in the order they were recorded.
    pub failures: Vec<PageError>,
    pub stats: SortStats,
}

impl SortReport {
    /// `Err(PartialFailure)` if any photo failed, the report otherwise.
    pub fn into_result(self) -> Result<Self, SortError> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(SortError::PartialFailure {
                attempted: self.stats.downloads_attempted,
                failed: self.failures.len(),
            })
        }
    }
}

/// What a run would do with one page, without downloading anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagePlan {
    pub page_number: usize,
    /// Hyperlinks found by the link pass.
    pub links: Vec<String>,
    /// Metadata from the metadata pass; `None` if that pass had no such page.
    pub metadata: Option<PageMetadata>,
    /// Description subdirectory the photo would be filed under.
    pub directory: Option<String>,
    /// File name before any `_N` de-duplication suffix.
    pub file_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_report_into_result_is_ok() {
        let report = SortReport::default();
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn failed_report_into_result_is_partial_failure() {
        let report = SortReport {
            failures: vec![PageError::Orphaned {
                page: 9,
                path: PathBuf::from("x_9.jpeg"),
            }],
            stats: SortStats {
                downloads_attempted: 4,
                ..Default::default()
            },
            ..Default::default()
        };
        match report.into_result() {
            Err(SortError::PartialFailure { attempted, failed }) => {
                assert_eq!(attempted, 4);
                assert_eq!(failed, 1);
            }
            other => panic!("expected PartialFailure, got {other:?}"),
        }
    }
}
