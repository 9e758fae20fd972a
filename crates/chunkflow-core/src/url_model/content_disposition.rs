//! Content-Disposition header parsing (filename and filename*).

/// Extracts the filename from a raw Content-Disposition header value.
///
/// Tries, in order:
/// - `filename*=UTF-8''percent-encoded` (RFC 5987; decoded)
/// - `filename="value"` (quoted; backslash escapes removed)
/// - `filename=value` (bare token)
///
/// A `filename*` value that fails to decode is skipped in favour of the next form.
pub fn parse_content_disposition_filename(header_value: &str) -> Option<String> {
    let mut quoted: Option<String> = None;
    let mut bare: Option<String> = None;

    for param in header_value.split(';') {
        let Some((name, v)) = param.trim().split_once('=') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let v = v.trim();

        if name == "filename*" {
            let encoded = strip_prefix_ignore_case(v, "utf-8''");
            if let Some(decoded) = encoded.and_then(percent_decode) {
                if !decoded.is_empty() {
                    return Some(decoded);
                }
            }
        } else if name == "filename" {
            if v.len() >= 2 && v.starts_with('"') && v.ends_with('"') {
                let inner = decode_quoted_filename(&v[1..v.len() - 1]);
                if !inner.is_empty() && quoted.is_none() {
                    quoted = Some(inner);
                }
            } else if !v.is_empty() && bare.is_none() {
                bare = Some(v.to_string());
            }
        }
    }

    quoted.or(bare)
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

/// Decode backslash-escaped quotes in a quoted filename value.
fn decode_quoted_filename(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == '"' || next == '\\' {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Strict percent-decode: malformed escapes or invalid UTF-8 yield `None`.
fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let high = bytes.get(i + 1).copied().and_then(hex_digit)?;
            let low = bytes.get(i + 2).copied().and_then(hex_digit)?;
            out.push(high << 4 | low);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
