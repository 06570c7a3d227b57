//! Content-type sniffing over the leading bytes of a response body.
//!
//! A compact rendition of the standard media-type sniffing algorithm: BOM
//! and markup checks first, then exact magic-number signatures, then a
//! text-versus-binary scan of the first 512 bytes. Only ever consulted when
//! a handler did not set `Content-Type` itself.

/// At most this many leading bytes take part in classification.
const SNIFF_LEN: usize = 512;

/// Markup signatures matched case-insensitively after leading whitespace;
/// each must be followed by a space or `>` to count as a tag.
const HTML_SIGNATURES: &[&str] = &[
    "<!DOCTYPE HTML", "<HTML", "<HEAD", "<SCRIPT", "<IFRAME", "<H1", "<DIV", "<FONT", "<TABLE",
    "<A", "<STYLE", "<TITLE", "<B", "<BODY", "<BR", "<P", "<!--",
];

/// Exact leading-byte signatures.
const MAGIC_SIGNATURES: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (b"%!PS-Adobe-", "application/postscript"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"BM", "image/bmp"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1f\x8b\x08", "application/x-gzip"),
    (b"OggS", "application/ogg"),
    (b"\x00\x00\x01\x00", "image/x-icon"),
];

/// Classify a byte buffer's media type by its leading bytes.
pub fn detect_content_type(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];

    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return "text/plain; charset=utf-8";
    }
    if data.starts_with(&[0xFE, 0xFF]) || data.starts_with(&[0xFF, 0xFE]) {
        return "text/plain; charset=utf-16";
    }

    let trimmed = skip_ws(data);
    for signature in HTML_SIGNATURES {
        if matches_tag(trimmed, signature.as_bytes()) {
            return "text/html; charset=utf-8";
        }
    }
    if trimmed.len() >= 5 && trimmed[..5].eq_ignore_ascii_case(b"<?xml") {
        return "text/xml; charset=utf-8";
    }

    for (magic, content_type) in MAGIC_SIGNATURES {
        if data.starts_with(magic) {
            return content_type;
        }
    }

    if data.iter().any(|&b| is_binary_byte(b)) {
        "application/octet-stream"
    } else {
        "text/plain; charset=utf-8"
    }
}

fn skip_ws(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !matches!(b, b'\t' | b'\n' | b'\x0c' | b'\r' | b' '))
        .unwrap_or(data.len());
    &data[start..]
}

fn matches_tag(data: &[u8], signature: &[u8]) -> bool {
    // The comment signature carries its own terminator.
    if signature == b"<!--" {
        return data.starts_with(signature);
    }
    if data.len() <= signature.len() {
        return false;
    }
    data[..signature.len()].eq_ignore_ascii_case(signature)
        && matches!(data[signature.len()], b' ' | b'>')
}

fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_documents() {
        assert_eq!(
            detect_content_type(b"<!DOCTYPE html><html></html>"),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            detect_content_type(b"\n\t <html><body>hi</body></html>"),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            detect_content_type(b"<!-- a comment -->"),
            "text/html; charset=utf-8"
        );
    }

    #[test]
    fn tag_needs_terminator() {
        // "<HTMLX" is not an html tag.
        assert_eq!(
            detect_content_type(b"<htmlx>"),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn xml_declaration() {
        assert_eq!(
            detect_content_type(b"<?xml version=\"1.0\"?><root/>"),
            "text/xml; charset=utf-8"
        );
    }

    #[test]
    fn magic_numbers() {
        assert_eq!(
            detect_content_type(b"\x89PNG\r\n\x1a\n....."),
            "image/png"
        );
        assert_eq!(detect_content_type(b"GIF89a......"), "image/gif");
        assert_eq!(detect_content_type(b"%PDF-1.7 ..."), "application/pdf");
        assert_eq!(
            detect_content_type(b"\x1f\x8b\x08\x00\x00"),
            "application/x-gzip"
        );
    }

    #[test]
    fn utf8_bom_is_text() {
        assert_eq!(
            detect_content_type(b"\xEF\xBB\xBFhello"),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn plain_text_and_binary() {
        assert_eq!(
            detect_content_type(b"just some text\nwith lines\n"),
            "text/plain; charset=utf-8"
        );
        assert_eq!(
            detect_content_type(&[0x01, 0x02, 0x03, 0x04]),
            "application/octet-stream"
        );
    }

    #[test]
    fn only_leading_bytes_participate() {
        let mut data = vec![b'a'; SNIFF_LEN];
        data.push(0x00); // binary byte past the sniff window
        assert_eq!(detect_content_type(&data), "text/plain; charset=utf-8");
    }
}
