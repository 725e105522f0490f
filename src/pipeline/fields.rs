//! Field extraction: parse one page's text into [`PageMetadata`].
//!
//! Photo-log pages are laid out as label/value line pairs:
//!
//! ```text
//! Site visit
//! North Roof
//! Description
//! Uploaded By
//! Jane Doe
//! Taken Date
//! 03/01/2020 at 10:00 PM
//! Upload Date
//! 03/02/2020 at 08:15 AM
//! Job #: 4711
//! ```
//!
//! The extracted text is loose: labels may carry doubled spaces and any value
//! may be missing. Extraction therefore never fails; a field whose pattern
//! does not match is simply `None`.

use crate::pipeline::sanitize::{clean_date, clean_description, clean_field};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Width the uploader token is padded to.
pub const UPLOADER_WIDTH: usize = 5;

static RE_UPLOADED_BY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)Uploaded By\n(.*?)\n").unwrap());

static RE_TAKEN_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)Taken Date\n(.*?)\n").unwrap());

static RE_UPLOAD_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)Upload Date\n(.*?)\n").unwrap());

static RE_DESCRIPTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)(.*?)Description").unwrap());

static RE_JOB_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"Job #:\s(\d+)").unwrap());

/// First captures of each field, before sanitising.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFields {
    pub uploaded_by: Option<String>,
    pub taken_date: Option<String>,
    pub upload_date: Option<String>,
    /// Everything from the top of the page up to the first `Description`.
    pub description: Option<String>,
    pub job_number: Option<String>,
}

/// Sanitised metadata for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    /// 1-based page number.
    pub page_number: usize,
    /// Uploader, padded to [`UPLOADER_WIDTH`].
    pub uploaded_by: Option<String>,
    /// `Some("")` when the page shows no taken date.
    pub taken_date: Option<String>,
    pub upload_date: Option<String>,
    /// Hyphenated; used as directory name and filename prefix.
    pub description: Option<String>,
    /// Digits only, used verbatim.
    pub job_number: Option<String>,
}

impl PageMetadata {
    /// Parse and sanitise the text of page `page_number`.
    pub fn parse(page_number: usize, text: &str) -> Self {
        let raw = extract_raw(text);
        Self {
            page_number,
            uploaded_by: clean_field(raw.uploaded_by.as_deref(), Some(UPLOADER_WIDTH)),
            taken_date: clean_date(raw.taken_date.as_deref()),
            upload_date: clean_date(raw.upload_date.as_deref()),
            description: clean_description(raw.description.as_deref()),
            job_number: raw.job_number,
        }
    }
}

/// pdfium separates text lines with `\r\n`; the field patterns expect `\n`.
pub fn normalise_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Collapse each run of exactly two spaces into one.
///
/// Matches are non-overlapping and scanned left to right, so four spaces
/// become two rather than one.
pub fn collapse_double_spaces(text: &str) -> String {
    text.replace("  ", " ")
}

/// Capture the raw value of every field in `text`.
pub fn extract_raw(text: &str) -> RawFields {
    let text = collapse_double_spaces(&normalise_line_endings(text));
    RawFields {
        uploaded_by: first_capture(&RE_UPLOADED_BY, &text),
        taken_date: first_capture(&RE_TAKEN_DATE, &text),
        upload_date: first_capture(&RE_UPLOAD_DATE, &text),
        description: first_capture(&RE_DESCRIPTION, &text),
        job_number: first_capture(&RE_JOB_NUMBER, &text),
    }
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
