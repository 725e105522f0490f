//! Final naming and filing of downloaded photos.
//!
//! A photo downloaded to `{dir}/{label}_{page}.jpeg` ends up as
//! `{dir}/{description}/{name}.jpeg`, where `name` is built from the page's
//! metadata:
//!
//! ```text
//! {description}_{page}_{job}            taken date known to be blank
//! {description}_{page}_{taken}_{job}    otherwise
//! ```
//!
//! with every non-word character stripped, and `_1`, `_2`, … appended until
//! the name is free both in `{dir}` and in `{dir}/{description}`.
//!
//! Failures are returned as [`PageError::FinalizeFailed`] for the caller to
//! log and skip; the photo stays wherever the failed step left it.

use crate::config::MissingFieldStyle;
use crate::error::PageError;
use crate::output::ReorganizedFile;
use crate::pipeline::fields::PageMetadata;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Extension of every downloaded and filed photo.
pub const PHOTO_EXTENSION: &str = "jpeg";

static RE_NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").unwrap());

/// The metadata that names a photo, already sanitised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameParts<'a> {
    pub description: Option<&'a str>,
    pub page_number: usize,
    pub taken_date: Option<&'a str>,
    pub job_number: Option<&'a str>,
}

impl<'a> From<&'a PageMetadata> for NameParts<'a> {
    fn from(meta: &'a PageMetadata) -> Self {
        Self {
            description: meta.description.as_deref(),
            page_number: meta.page_number,
            taken_date: meta.taken_date.as_deref(),
            job_number: meta.job_number.as_deref(),
        }
    }
}

/// Whether `name` can be used as exactly one directory level.
pub fn is_safe_component(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}

/// Remove every run of non-word characters. Underscores survive.
pub fn strip_non_word(s: &str) -> String {
    RE_NON_WORD.replace_all(s, "").into_owned()
}

/// Unsanitised base name, e.g. `North-Roof_3_03_01_2020_4711`.
pub fn base_name(parts: &NameParts<'_>, style: MissingFieldStyle) -> String {
    let render = |field: Option<&str>| -> String {
        match (field, style) {
            (Some(v), _) => v.to_string(),
            (None, MissingFieldStyle::Empty) => String::new(),
            (None, MissingFieldStyle::LegacyNone) => "None".to_string(),
        }
    };

    let description = render(parts.description);
    let job = render(parts.job_number);
    let taken = match (parts.taken_date, style) {
        (None, MissingFieldStyle::Empty) => String::new(),
        (other, _) => render(other),
    };

    if taken.is_empty() {
        format!("{}_{}_{}", description, parts.page_number, job)
    } else {
        format!("{}_{}_{}_{}", description, parts.page_number, taken, job)
    }
}

/// File name for `parts` before de-duplication, e.g. `NorthRoof_3_03_01_2020_4711.jpeg`.
pub fn planned_file_name(parts: &NameParts<'_>, style: MissingFieldStyle) -> String {
    format!("{}.{}", strip_non_word(&base_name(parts, style)), PHOTO_EXTENSION)
}

/// First of `{base}.jpeg`, `{base}_1.jpeg`, `{base}_2.jpeg`, … that exists
/// neither in `parent` nor in `destination`.
///
/// A lookup that cannot be answered (e.g. `destination` is a regular file) is
/// an error rather than "taken", so the search always terminates.
pub async fn unique_file_name(parent: &Path, destination: &Path, base: &str) -> io::Result<String> {
    let mut name = format!("{}.{}", base, PHOTO_EXTENSION);
    let mut suffix = 0usize;
    while tokio::fs::try_exists(parent.join(&name)).await?
        || tokio::fs::try_exists(destination.join(&name)).await?
    {
        suffix += 1;
        name = format!("{}_{}.{}", base, suffix, PHOTO_EXTENSION);
    }
    Ok(name)
}

/// Rename `temp_path` to its final name and move it into its description
/// subdirectory next to it.
pub async fn finalize(
    temp_path: &Path,
    parts: &NameParts<'_>,
    style: MissingFieldStyle,
) -> Result<ReorganizedFile, PageError> {
    let fail = |path: &Path, detail: String| {
        error!("Failed to rename {:?} due to {}", temp_path, detail);
        PageError::FinalizeFailed {
            page: parts.page_number,
            path: path.to_path_buf(),
            detail,
        }
    };

    let description = match parts.description {
        Some(d) if is_safe_component(d) => d,
        Some(d) => return Err(fail(temp_path, format!("description {d:?} is not a valid directory name"))),
        None => return Err(fail(temp_path, "page has no description".to_string())),
    };

    let parent = temp_path.parent().unwrap_or_else(|| Path::new("."));
    let destination_dir = parent.join(description);

    let base = strip_non_word(&base_name(parts, style));
    let name = unique_file_name(parent, &destination_dir, &base)
        .await
        .map_err(|e| fail(temp_path, e.to_string()))?;
    let renamed: PathBuf = parent.join(&name);

    tokio::fs::rename(temp_path, &renamed)
        .await
        .map_err(|e| fail(temp_path, e.to_string()))?;

    tokio::fs::create_dir_all(&destination_dir)
        .await
        .map_err(|e| fail(&renamed, e.to_string()))?;

    let final_path = destination_dir.join(&name);
    tokio::fs::rename(&renamed, &final_path)
        .await
        .map_err(|e| fail(&renamed, e.to_string()))?;

    debug!("Page {}: {:?} → {:?}", parts.page_number, temp_path, final_path);

    Ok(ReorganizedFile {
        page_number: parts.page_number,
        source_path: temp_path.to_path_buf(),
        final_path,
        description: description.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    fn parts<'a>(
        description: Option<&'a str>,
        page_number: usize,
        taken_date: Option<&'a str>,
        job_number: Option<&'a str>,
    ) -> NameParts<'a> {
        NameParts {
            description,
            page_number,
            taken_date,
            job_number,
        }
    }

    async fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        tokio::fs::write(&path, name.as_bytes()).await.unwrap();
        path
    }

    #[test]
    fn base_name_with_and_without_taken_date() {
        let style = MissingFieldStyle::Empty;
        assert_eq!(
            base_name(&parts(Some("Roof"), 3, Some("03_01_2020"), Some("4711")), style),
            "Roof_3_03_01_2020_4711"
        );
        assert_eq!(
            base_name(&parts(Some("Roof"), 3, Some(""), Some("4711")), style),
            "Roof_3_4711"
        );
    }

    #[test]
    fn missing_fields_empty_style() {
        let style = MissingFieldStyle::Empty;
        assert_eq!(base_name(&parts(Some("Roof"), 2, None, None), style), "Roof_2_");
    }

    #[test]
    fn missing_fields_legacy_style() {
        let style = MissingFieldStyle::LegacyNone;
        assert_eq!(
            base_name(&parts(Some("Roof"), 2, None, None), style),
            "Roof_2_None_None"
        );
        assert_eq!(
            base_name(&parts(Some("Roof"), 2, Some(""), None), style),
            "Roof_2_None"
        );
    }

    #[test]
    fn strip_removes_punctuation_but_keeps_underscores() {
        assert_eq!(strip_non_word("North-Roof_1_March_1,_2020_12"), "NorthRoof_1_March_1_2020_12");
        assert_eq!(strip_non_word("a -- b"), "ab");
        assert_eq!(
            planned_file_name(&parts(Some("East-Wall"), 1, Some(""), Some("9")), MissingFieldStyle::Empty),
            "EastWall_1_9.jpeg"
        );
    }

    #[test]
    fn safe_components() {
        assert!(is_safe_component("North-Roof"));
        assert!(!is_safe_component(""));
        assert!(!is_safe_component("."));
        assert!(!is_safe_component(".."));
        assert!(!is_safe_component("a/b"));
        assert!(!is_safe_component("a\\b"));
    }

    #[tokio::test]
    async fn finalize_moves_into_description_dir() {
        let dir = TempDir::new().unwrap();
        let temp = touch(dir.path(), "Roof_3.jpeg").await;

        let filed = assert_ok!(
            finalize(&temp, &parts(Some("Roof"), 3, Some("03_01_2020"), Some("4711")), MissingFieldStyle::Empty).await
        );

        assert_eq!(filed.final_path, dir.path().join("Roof").join("Roof_3_03_01_2020_4711.jpeg"));
        assert!(filed.final_path.exists());
        assert!(!temp.exists());
        assert!(!dir.path().join("Roof_3_03_01_2020_4711.jpeg").exists());
        assert_eq!(tokio::fs::read(&filed.final_path).await.unwrap(), b"Roof_3.jpeg");
    }

    #[tokio::test]
    async fn repeated_names_get_numeric_suffixes() {
        let dir = TempDir::new().unwrap();
        let p = parts(Some("Roof"), 1, Some(""), Some("7"));

        let first = touch(dir.path(), "Roof_1.jpeg").await;
        let second = touch(dir.path(), "Roof_1_2.jpeg").await;
        let third = touch(dir.path(), "Roof_1_3.jpeg").await;

        let a = finalize(&first, &p, MissingFieldStyle::Empty).await.unwrap();
        let b = finalize(&second, &p, MissingFieldStyle::Empty).await.unwrap();
        let c = finalize(&third, &p, MissingFieldStyle::Empty).await.unwrap();

        let sub = dir.path().join("Roof");
        assert_eq!(a.final_path, sub.join("Roof_1_7.jpeg"));
        assert_eq!(b.final_path, sub.join("Roof_1_7_1.jpeg"));
        assert_eq!(c.final_path, sub.join("Roof_1_7_2.jpeg"));
        for f in [&a, &b, &c] {
            assert!(f.final_path.exists());
        }
        assert_eq!(tokio::fs::read(&b.final_path).await.unwrap(), b"Roof_1_2.jpeg");
    }

    #[tokio::test]
    async fn unique_name_skips_names_taken_in_parent() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "X_1_.jpeg").await;
        let name = unique_file_name(dir.path(), &dir.path().join("X"), "X_1_")
            .await
            .unwrap();
        assert_eq!(name, "X_1__1.jpeg");
    }

    #[tokio::test]
    async fn description_path_taken_by_a_file_fails_instead_of_looping() {
        let dir = TempDir::new().unwrap();
        // A plain file where the description directory should go.
        touch(dir.path(), "Roof").await;
        let temp = touch(dir.path(), "Roof_1.jpeg").await;

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            finalize(&temp, &parts(Some("Roof"), 1, Some(""), Some("2")), MissingFieldStyle::Empty),
        )
        .await
        .expect("finalize must return");

        let err = assert_err!(result);
        assert!(matches!(err, PageError::FinalizeFailed { page: 1, .. }));
        assert!(temp.exists());
        assert!(dir.path().join("Roof").is_file());
    }

    #[tokio::test]
    async fn missing_description_leaves_file_in_place() {
        let dir = TempDir::new().unwrap();
        let temp = touch(dir.path(), "untitled_4.jpeg").await;

        let err = assert_err!(finalize(&temp, &parts(None, 4, None, Some("1")), MissingFieldStyle::Empty).await);
        assert_eq!(err.page(), 4);
        assert!(temp.exists());
    }

    #[tokio::test]
    async fn traversal_description_is_rejected() {
        let dir = TempDir::new().unwrap();
        let temp = touch(dir.path(), "untitled_5.jpeg").await;

        let err = finalize(&temp, &parts(Some(".."), 5, None, None), MissingFieldStyle::Empty)
            .await
            .unwrap_err();
        assert!(matches!(err, PageError::FinalizeFailed { .. }));
        assert!(temp.exists());
    }

    #[tokio::test]
    async fn vanished_source_is_reported_not_raised() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone_6.jpeg");

        let err = finalize(&missing, &parts(Some("Gone"), 6, None, None), MissingFieldStyle::Empty)
            .await
            .unwrap_err();
        match err {
            PageError::FinalizeFailed { page, path, .. } => {
                assert_eq!(page, 6);
                assert_eq!(path, missing);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
