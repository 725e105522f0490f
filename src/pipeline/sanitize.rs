//! Field sanitising: turn raw captures into filesystem-safe tokens.
//!
//! Every function takes the first capture of its field (`None` when the
//! pattern did not match) and returns `None` for `None`. Nothing here invents
//! placeholder text; deciding how an absent field is rendered in a filename
//! is [`crate::pipeline::reorganize`]'s job.

/// Trim a captured value, replace spaces with `_`, and right-pad it with `_`
/// up to `limit` characters.
///
/// `limit` is a width floor: a value already `limit` characters or longer is
/// returned unchanged rather than cut.
pub fn clean_field(raw: Option<&str>, limit: Option<usize>) -> Option<String> {
    let mut field = raw?.trim().replace(' ', "_");
    if let Some(limit) = limit {
        let len = field.chars().count();
        if len < limit {
            field.push_str(&"_".repeat(limit - len));
        }
    }
    Some(field)
}

/// Normalise a date capture such as `03/01/2020 at 10:00 PM` to `03_01_2020`.
///
/// Everything from the first `" at"` onward is dropped. When the capture is
/// really the next heading (`Upload Date`, which happens when the taken date
/// is blank on the page) the result is the empty string: "known to be
/// absent", as opposed to `None` for "pattern not found".
pub fn clean_date(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    let date = raw.split(" at").next().unwrap_or_default().trim();
    if date.replace(' ', "") == "UploadDate" {
        return Some(String::new());
    }
    Some(date.replace(['/', ' '], "_"))
}

/// Reduce the text preceding the `Description` label to its last non-empty
/// line and hyphenate it, e.g. `"Site visit\n\nNorth Roof"` → `North-Roof`.
///
/// Returns `None` when no non-empty line is left.
pub fn clean_description(raw: Option<&str>) -> Option<String> {
    let last = raw?
        .trim()
        .split('\n')
        .rev()
        .find(|line| !line.trim().is_empty())?;
    Some(last.replace([' ', '_'], "-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_field_pads_short_values() {
        assert_eq!(clean_field(Some("Al"), Some(5)).as_deref(), Some("Al___"));
    }

    #[test]
    fn clean_field_keeps_long_values_whole() {
        let out = clean_field(Some("Alice Bob"), Some(5)).unwrap();
        assert_eq!(out, "Alice_Bob");
        assert_eq!(out.len(), 9);
        assert_eq!(clean_field(Some("  Alice  "), Some(5)).as_deref(), Some("Alice"));
    }

    #[test]
    fn clean_field_without_limit() {
        assert_eq!(clean_field(Some(" J Smith "), None).as_deref(), Some("J_Smith"));
        assert_eq!(clean_field(None, Some(5)), None);
    }

    #[test]
    fn clean_field_counts_chars_not_bytes() {
        assert_eq!(clean_field(Some("Zoë"), Some(5)).as_deref(), Some("Zoë__"));
    }

    #[test]
    fn clean_date_cuts_time_of_day() {
        assert_eq!(
            clean_date(Some("March 1, 2020 at 10:00 PM")).as_deref(),
            Some("March_1,_2020")
        );
        assert_eq!(
            clean_date(Some("03/01/2020 at 10:00 PM")).as_deref(),
            Some("03_01_2020")
        );
    }

    #[test]
    fn clean_date_placeholder_is_empty_not_none() {
        assert_eq!(clean_date(Some("UploadDate")).as_deref(), Some(""));
        assert_eq!(clean_date(Some("Upload Date")).as_deref(), Some(""));
        assert_eq!(clean_date(None), None);
    }

    #[test]
    fn clean_description_keeps_last_line() {
        assert_eq!(
            clean_description(Some("Foo\n\nBar Baz\n")).as_deref(),
            Some("Bar-Baz")
        );
        assert_eq!(
            clean_description(Some("east_wall footing")).as_deref(),
            Some("east-wall-footing")
        );
    }

    #[test]
    fn clean_description_blank_capture_is_none() {
        assert_eq!(clean_description(Some("  \n\n \n")), None);
        assert_eq!(clean_description(Some("")), None);
        assert_eq!(clean_description(None), None);
    }
}
