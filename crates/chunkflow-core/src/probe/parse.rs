//! Parse HTTP response header lines into a ProbeReport.

use super::ProbeReport;

/// Content type assumed when the server does not send one.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Parse collected header lines (of the final response) into a ProbeReport.
///
/// `status` and `effective_url` come from libcurl, not from the lines.
pub(crate) fn parse_headers(lines: &[String], status: u32, effective_url: String) -> ProbeReport {
    let mut content_length = None;
    let mut accept_ranges = false;
    let mut content_type = None;
    let mut content_disposition = None;

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = Some(value.to_string());
            }
            if name.eq_ignore_ascii_case("accept-ranges") {
                accept_ranges = value.eq_ignore_ascii_case("bytes");
            }
            if name.eq_ignore_ascii_case("content-type") && !value.is_empty() {
                content_type = Some(value.to_string());
            }
            if name.eq_ignore_ascii_case("content-disposition") {
                content_disposition = Some(value.to_string());
            }
        }
    }

    ProbeReport {
        status,
        effective_url,
        content_length,
        accept_ranges,
        content_type: content_type.unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
        content_disposition,
    }
}

/// Declared size, if it is a positive integer.
pub(crate) fn parse_total_size(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|&n| n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_headers_content_length_and_ranges() {
        let r = parse_headers(
            &lines(&[
                "HTTP/1.1 200 OK",
                "Content-Length: 12345",
                "Accept-Ranges: bytes",
                "Content-Type: application/zip",
            ]),
            200,
            "https://example.com/a.zip".into(),
        );
        assert_eq!(r.content_length.as_deref(), Some("12345"));
        assert!(r.accept_ranges);
        assert_eq!(r.content_type, "application/zip");
    }

    #[test]
    fn parse_headers_no_ranges() {
        let r = parse_headers(
            &lines(&["Content-Length: 999", "Accept-Ranges: none"]),
            200,
            String::new(),
        );
        assert!(!r.accept_ranges);
        assert_eq!(r.content_type, DEFAULT_MIME_TYPE);
    }

    #[test]
    fn parse_headers_keeps_content_disposition() {
        let r = parse_headers(
            &lines(&["content-disposition: attachment; filename=\"report.pdf\""]),
            200,
            String::new(),
        );
        assert_eq!(
            r.content_disposition.as_deref(),
            Some("attachment; filename=\"report.pdf\"")
        );
    }

    #[test]
    fn total_size_rejects_missing_zero_and_garbage() {
        assert_eq!(parse_total_size(Some("10000000")), Some(10_000_000));
        assert_eq!(parse_total_size(Some("0")), None);
        assert_eq!(parse_total_size(Some("-5")), None);
        assert_eq!(parse_total_size(Some("abc")), None);
        assert_eq!(parse_total_size(None), None);
    }
}
