//! MIME type detection based on file extensions.

/// Used for unknown or missing extensions.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

const MIME_TYPES: &[(&str, &str)] = &[
    ("mp3", "audio/mp3"),
    ("wma", "audio/x-ms-wma"),
    ("wav", "audio/x-wav"),
    ("gif", "image/gif"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("tiff", "image/tiff"),
    ("ico", "image/x-icon"),
    ("svg", "image/svg+xml"),
    ("css", "text/css"),
    ("csv", "text/csv"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("js", "text/javascript"),
    ("json", "application/json"),
    ("txt", "text/plain"),
    ("xml", "text/xml"),
    ("mpeg", "video/mpeg"),
    ("mp4", "video/mp4"),
    ("wasm", "application/wasm"),
];

/// Extension of the last path segment, without the dot.
pub fn extension(path: &str) -> Option<&str> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

/// Content type for a `/`-separated resource name.
pub fn content_type_for(path: &str) -> &'static str {
    extension(path)
        .and_then(|ext| {
            MIME_TYPES
                .iter()
                .find(|(known, _)| known.eq_ignore_ascii_case(ext))
                .map(|(_, mime)| *mime)
        })
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}
