//! Extraction of a single file field from a raw `multipart/form-data` body.
//!
//! Parsing runs in two phases: the body is split into parts on the
//! `--<boundary>` delimiter, then each candidate part is split into headers
//! and content at its first blank line. The first part carrying a
//! `Content-Disposition` header and a header/body separator is the file.

use thiserror::Error;

/// Filename used when the selected part has no `filename="..."` attribute.
pub const PLACEHOLDER_FILENAME: &str = "file";

const DISPOSITION_MARKER: &[u8] = b"Content-Disposition";
const FILENAME_ATTR: &str = "filename=\"";
const BOUNDARY_PARAM: &str = "boundary=";

/// Window at the end of the content inspected for a captured closing delimiter.
const TRAILING_MARKER_WINDOW: usize = 10;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MultipartError {
    #[error("Content-Type must be multipart/form-data")]
    UnsupportedContentType,
    #[error("Content-Type is missing a multipart boundary")]
    MissingBoundary,
    #[error("No file found in request")]
    NoFileFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    pub filename: String,
    pub content: Vec<u8>,
}

/// Locates the first file part in `body` and returns its filename and bytes.
pub fn extract(body: &[u8], content_type: &str) -> Result<ExtractedFile, MultipartError> {
    if !content_type
        .to_ascii_lowercase()
        .contains(mime::MULTIPART_FORM_DATA.essence_str())
    {
        return Err(MultipartError::UnsupportedContentType);
    }

    let boundary = boundary(content_type).ok_or(MultipartError::MissingBoundary)?;
    let delimiter = format!("--{boundary}");

    let segments = split_on(body, delimiter.as_bytes());
    let last = segments.len().saturating_sub(1);

    segments
        .iter()
        .enumerate()
        .filter(|(_, segment)| find(segment, DISPOSITION_MARKER).is_some())
        .find_map(|(idx, segment)| parse_part(segment, idx < last))
        .ok_or(MultipartError::NoFileFound)
}

fn boundary(content_type: &str) -> Option<&str> {
    let (_, rest) = content_type.rsplit_once(BOUNDARY_PARAM)?;
    let boundary = rest.trim();
    (!boundary.is_empty()).then_some(boundary)
}

/// `delimited` is true when another delimiter followed this segment in the body.
fn parse_part(part: &[u8], delimited: bool) -> Option<ExtractedFile> {
    let (headers, content) = split_headers(part)?;

    // Inspected before the delimiter's line ending is removed, so only that
    // ending is cut from content whose own last line holds `--`.
    let tail = &content[content.len().saturating_sub(TRAILING_MARKER_WINDOW)..];
    let content = if find(tail, b"--").is_some() {
        truncate_last_line(content)
    } else if delimited {
        strip_line_ending(content)
    } else {
        content
    };

    let headers = String::from_utf8_lossy(headers);
    let filename = filename(&headers).unwrap_or(PLACEHOLDER_FILENAME);

    Some(ExtractedFile {
        filename: filename.to_string(),
        content: content.to_vec(),
    })
}

fn split_headers(part: &[u8]) -> Option<(&[u8], &[u8])> {
    if let Some(pos) = find(part, b"\r\n\r\n") {
        return Some((&part[..pos], &part[pos + 4..]));
    }
    find(part, b"\n\n").map(|pos| (&part[..pos], &part[pos + 2..]))
}

fn filename(headers: &str) -> Option<&str> {
    let start = headers.find(FILENAME_ATTR)? + FILENAME_ATTR.len();
    let len = headers[start..].find('"')?;
    Some(&headers[start..start + len])
}

fn strip_line_ending(content: &[u8]) -> &[u8] {
    content
        .strip_suffix(b"\r\n")
        .or_else(|| content.strip_suffix(b"\n"))
        .unwrap_or(content)
}

/// Drops the final line terminator and everything after it.
fn truncate_last_line(content: &[u8]) -> &[u8] {
    match rfind(content, b"\r\n") {
        Some(pos) => &content[..pos],
        None => match content.iter().rposition(|&b| b == b'\n') {
            Some(pos) => &content[..pos],
            None => content,
        },
    }
}

fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut segments = Vec::new();
    let mut rest = haystack;
    while let Some(pos) = find(rest, needle) {
        segments.push(&rest[..pos]);
        rest = &rest[pos + needle.len()..];
    }
    segments.push(rest);
    segments
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|w| w == needle)
}
