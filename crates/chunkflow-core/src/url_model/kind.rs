//! Extension-based classification of file names and links.

const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "bmp", "webp", "svg"];

const DOWNLOAD_EXTENSIONS: [&str; 33] = [
    ".zip", ".rar", ".7z", ".tar", ".gz", ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt",
    ".pptx", ".mp3", ".mp4", ".avi", ".mkv", ".mov", ".wmv", ".jpg", ".jpeg", ".png", ".gif",
    ".bmp", ".svg", ".exe", ".msi", ".deb", ".rpm", ".dmg", ".pkg", ".iso", ".img", ".bin",
];

/// Lower-cased text after the last `.`, or empty when there is none.
pub fn file_extension(filename: &str) -> String {
    match filename.rfind('.') {
        Some(dot) => filename[dot + 1..].to_lowercase(),
        None => String::new(),
    }
}

pub fn is_image_file(filename: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&file_extension(filename).as_str())
}

/// Heuristic used by page integrations: a link is a download link if it carries
/// an explicit download attribute or its URL mentions a known file extension.
pub fn is_download_link(href: &str, has_download_attribute: bool) -> bool {
    if href.is_empty() {
        return false;
    }
    if has_download_attribute {
        return true;
    }
    let lower = href.to_lowercase();
    DOWNLOAD_EXTENSIONS.iter().any(|ext| lower.contains(ext))
}
