//! URL modeling and filename derivation.
//!
//! Derives safe filenames from the Content-Disposition header or the URL path,
//! and classifies names by extension.

mod content_disposition;
mod kind;
mod path;
mod sanitize;

pub use content_disposition::parse_content_disposition_filename;
pub use kind::{file_extension, is_download_link, is_image_file};
pub use path::filename_from_url_path;
pub use sanitize::{sanitize_filename, truncate_filename, unique_filename_among, NAME_MAX};

/// Default filename when neither the header nor the URL path yields anything usable.
pub const DEFAULT_FILENAME: &str = "downloaded_file";

/// Derives the suggested filename for a download.
///
/// Priority: `filename*=UTF-8''…` (percent-decoded), then `filename="…"`,
/// then bare `filename=…`, then the last path segment of `url`, then
/// [`DEFAULT_FILENAME`]. Every candidate is passed through [`sanitize_filename`].
///
/// # Examples
///
/// - `derive_filename("https://example.com/archive.zip", None)` → `"archive.zip"`
/// - `derive_filename("https://example.com/", Some("attachment; filename=\"report.pdf\""))` → `"report.pdf"`
pub fn derive_filename(url: &str, content_disposition: Option<&str>) -> String {
    if let Some(name) = content_disposition.and_then(parse_content_disposition_filename) {
        return sanitize_filename(&name);
    }
    filename_from_url_path(url)
        .map(|segment| sanitize_filename(&segment))
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_filename_from_url_path() {
        assert_eq!(
            derive_filename("https://example.com/archive.zip", None),
            "archive.zip"
        );
        assert_eq!(
            derive_filename("https://cdn.example.com/path/to/debian-12.iso", None),
            "debian-12.iso"
        );
    }

    #[test]
    fn derive_filename_content_disposition_overrides_url() {
        assert_eq!(
            derive_filename(
                "https://example.com/archive.zip",
                Some("attachment; filename=\"real-name.tar.gz\"")
            ),
            "real-name.tar.gz"
        );
    }

    #[test]
    fn derive_filename_sanitizes_header_value() {
        assert_eq!(
            derive_filename("https://example.com/x", Some("attachment; filename=\"a:b?.txt\"")),
            "a_b_.txt"
        );
    }

    #[test]
    fn derive_filename_falls_back_to_default() {
        assert_eq!(derive_filename("https://example.com/", None), DEFAULT_FILENAME);
        assert_eq!(derive_filename("https://example.com", None), DEFAULT_FILENAME);
        assert_eq!(derive_filename("not a url", None), DEFAULT_FILENAME);
    }
}
