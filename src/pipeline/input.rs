//! Input resolution: normalise the user-supplied PDF path or URL to a local
//! file, and the save directory to a usable path.
//!
//! pdfium opens documents by path, so a URL is downloaded into a `TempDir`
//! that lives as long as the [`ResolvedInput`]. The `%PDF` magic is checked
//! up front so a wrong file fails with [`SortError::NotAPdf`] instead of a
//! pdfium error.

use crate::error::SortError;
use crate::pipeline::fetch::Fetcher;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// The resolved input: either a local path or a downloaded temp file.
#[derive(Debug)]
pub enum ResolvedInput {
    Local(PathBuf),
    /// The `TempDir` is held until the run is over.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Clean a save directory typed on a Windows shell: doubled backslashes
/// become single ones and quote characters are dropped.
pub fn normalize_save_dir(raw: &str) -> PathBuf {
    PathBuf::from(raw.replace("\\\\", "\\").replace('"', ""))
}

/// Resolve `input` to a local PDF, downloading it through `fetcher` if it is
/// a URL.
pub async fn resolve_input(input: &str, fetcher: &dyn Fetcher) -> Result<ResolvedInput, SortError> {
    if is_url(input) {
        download_url(input, fetcher).await
    } else {
        resolve_local(input)
    }
}

fn resolve_local(path_str: &str) -> Result<ResolvedInput, SortError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(SortError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != PDF_MAGIC {
                return Err(SortError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(SortError::PermissionDenied { path });
        }
        Err(_) => return Err(SortError::FileNotFound { path }),
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

async fn download_url(url: &str, fetcher: &dyn Fetcher) -> Result<ResolvedInput, SortError> {
    info!("Downloading PDF from: {}", url);
    let bytes = fetcher.fetch(url).await?;

    let temp_dir = TempDir::new().map_err(|e| SortError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(file_name_from_url(url));

    if bytes.len() >= 4 && &bytes[..4] != PDF_MAGIC {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(SortError::NotAPdf {
            path: file_path,
            magic,
        });
    }

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| SortError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded to: {}", file_path.display());
    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last path segment of `url` if it looks like a file name.
fn file_name_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty() && last.contains('.') && last != ".." && last != ".")
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use tokio_test::assert_ok;

    struct OneBody(Vec<u8>);

    impl Fetcher for OneBody {
        fn fetch<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, SortError>> {
            Box::pin(async move { Ok(self.0.clone()) })
        }
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/log.pdf"));
        assert!(is_url("http://example.com/log.pdf"));
        assert!(!is_url("/tmp/log.pdf"));
        assert!(!is_url("log.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn save_dir_backslashes_and_quotes() {
        assert_eq!(
            normalize_save_dir(r#""C:\\Users\\me\\Photos""#),
            PathBuf::from(r"C:\Users\me\Photos")
        );
        assert_eq!(normalize_save_dir("/srv/photos"), PathBuf::from("/srv/photos"));
    }

    #[test]
    fn file_name_from_url_path() {
        assert_eq!(file_name_from_url("https://x.example/a/site-log.pdf"), "site-log.pdf");
        assert_eq!(file_name_from_url("https://x.example/a/"), "downloaded.pdf");
        assert_eq!(file_name_from_url("https://x.example/export"), "downloaded.pdf");
    }

    #[tokio::test]
    async fn missing_local_file() {
        let err = resolve_input("/definitely/not/here.pdf", &OneBody(Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, SortError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn local_file_magic_is_checked() {
        let dir = tempfile::TempDir::new().unwrap();
        let good = dir.path().join("good.pdf");
        let bad = dir.path().join("bad.pdf");
        std::fs::write(&good, b"%PDF-1.7\n").unwrap();
        std::fs::write(&bad, b"PK\x03\x04zip").unwrap();

        let resolved = assert_ok!(resolve_input(good.to_str().unwrap(), &OneBody(Vec::new())).await);
        assert_eq!(resolved.path(), good);

        let err = resolve_input(bad.to_str().unwrap(), &OneBody(Vec::new()))
            .await
            .unwrap_err();
        match err {
            SortError::NotAPdf { magic, .. } => assert_eq!(&magic, b"PK\x03\x04"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn url_is_downloaded_into_temp_dir() {
        let fetcher = OneBody(b"%PDF-1.4 body".to_vec());
        let resolved = resolve_input("https://x.example/logs/week1.pdf", &fetcher)
            .await
            .unwrap();
        assert!(matches!(resolved, ResolvedInput::Downloaded { .. }));
        assert!(resolved.path().ends_with("week1.pdf"));
        assert_eq!(std::fs::read(resolved.path()).unwrap(), b"%PDF-1.4 body");

        let kept = resolved.path().to_path_buf();
        drop(resolved);
        assert!(!kept.exists());
    }

    #[tokio::test]
    async fn downloaded_non_pdf_is_rejected() {
        let fetcher = OneBody(b"<html>".to_vec());
        let err = resolve_input("https://x.example/logs/week1.pdf", &fetcher)
            .await
            .unwrap_err();
        assert!(matches!(err, SortError::NotAPdf { .. }));
    }
}
