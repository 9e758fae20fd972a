//! Filename sanitization and collision handling.

/// Maximum filename length, in bytes (Linux `NAME_MAX`).
pub const NAME_MAX: usize = 255;

const FORBIDDEN: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replaces filesystem-forbidden characters (`< > : " / \ | ? *`) with `_`
/// and shortens the result to [`NAME_MAX`] bytes.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect();
    truncate_filename(&replaced, NAME_MAX)
}

/// Shortens `name` to at most `max_bytes` bytes without splitting a character.
///
/// The extension is kept when it is shorter than half the budget; only the
/// stem is cut.
pub fn truncate_filename(name: &str, max_bytes: usize) -> String {
    if name.len() <= max_bytes {
        return name.to_string();
    }
    let (stem, ext) = split_extension(name);
    if !ext.is_empty() && ext.len() < max_bytes / 2 {
        let mut out = floor_to_char(stem, max_bytes - ext.len()).to_string();
        out.push_str(ext);
        out
    } else {
        floor_to_char(name, max_bytes).to_string()
    }
}

/// Returns `candidate` (shortened to `max_bytes`) if it is not taken,
/// otherwise `stem (n).ext` with the smallest free `n >= 1`. The stem is cut
/// further so every result fits in `max_bytes`.
pub fn unique_filename_among(
    candidate: &str,
    max_bytes: usize,
    is_taken: impl Fn(&str) -> bool,
) -> String {
    let candidate = truncate_filename(candidate, max_bytes);
    if !is_taken(&candidate) {
        return candidate;
    }
    let (stem, ext) = split_extension(&candidate);
    let mut n = 1u32;
    loop {
        let counter = format!(" ({})", n);
        let room = max_bytes.saturating_sub(counter.len() + ext.len());
        let next = format!("{}{}{}", floor_to_char(stem, room), counter, ext);
        if !is_taken(&next) {
            return next;
        }
        n += 1;
    }
}

/// `("archive.tar", ".gz")`; a leading dot is part of the stem.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(dot) if dot > 0 => (&name[..dot], &name[dot..]),
        _ => (name, ""),
    }
}

fn floor_to_char(s: &str, max_bytes: usize) -> &str {
    let mut end = max_bytes.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
