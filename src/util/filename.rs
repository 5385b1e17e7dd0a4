/// Maximum length of a single path component on common filesystems (ext4, APFS, NTFS).
pub const MAX_FILENAME_BYTES: usize = 255;

const PATH_SEPARATOR: char = '/';

/// Converts an article title into a storage key usable as a single filename.
///
/// Every `/` is removed outright (not replaced), and the result is cut to at
/// most [`MAX_FILENAME_BYTES`] bytes. When the byte limit falls inside a
/// multi-byte character the cut moves back until it sits on a character
/// boundary, so the output is always valid UTF-8.
///
/// Never fails. A title made only of separators (or an empty title) yields
/// `""`; callers get the feed directory itself as the article path, which
/// always exists and is therefore treated as already seen.
///
/// # Examples
///
/// ```
/// use feedstash::util::sanitize_title;
///
/// assert_eq!(sanitize_title("A/B"), "AB");
/// assert_eq!(sanitize_title("///"), "");
/// assert!(sanitize_title(&"é".repeat(200)).len() <= 255);
/// ```
pub fn sanitize_title(title: &str) -> String {
    let stripped = title.replace(PATH_SEPARATOR, "");
    truncate_bytes(&stripped, MAX_FILENAME_BYTES).to_owned()
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a character.
fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
