//! Per-part header block parsing (`Name: value` lines up to a blank line).

use thiserror::Error;

/// Header lines found at the front of a part, and where the payload starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHeaders {
    pub lines: Vec<String>,
    pub payload_offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("no blank line terminating the part headers")]
    Unterminated,
}

/// Collects header lines from the front of `data`.
///
/// LF and CRLF both end a line; NUL and bare CR bytes are dropped from line
/// text. A blank line after at least one header ends the block. Before the
/// first header, one blank line (the line break after the boundary marker) is
/// skipped and a second consecutive blank line ends an empty block.
pub fn parse_part_headers(data: &[u8]) -> Result<ParsedHeaders, HeaderError> {
    let mut lines = Vec::new();
    let mut current: Vec<u8> = Vec::new();
    let mut last_was_empty = false;

    for (i, &byte) in data.iter().enumerate() {
        match byte {
            0 | b'\r' => {}
            b'\n' => {
                if !current.is_empty() {
                    lines.push(String::from_utf8_lossy(&current).into_owned());
                    current.clear();
                    last_was_empty = false;
                } else if !lines.is_empty() || last_was_empty {
                    return Ok(ParsedHeaders {
                        lines,
                        payload_offset: i + 1,
                    });
                } else {
                    last_was_empty = true;
                }
            }
            _ => current.push(byte),
        }
    }

    Err(HeaderError::Unterminated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crlf_headers_then_payload() {
        let data = b"Content-Type: image/jpeg\r\nContent-Length: 4\r\n\r\n\xff\xd8\xff\xd9";
        let parsed = parse_part_headers(data).unwrap();
        assert_eq!(
            parsed.lines,
            vec!["Content-Type: image/jpeg", "Content-Length: 4"]
        );
        assert_eq!(&data[parsed.payload_offset..], b"\xff\xd8\xff\xd9");
    }

    #[test]
    fn bare_lf_line_endings() {
        let data = b"X-Frame: 1\n\nDATA";
        let parsed = parse_part_headers(data).unwrap();
        assert_eq!(parsed.lines, vec!["X-Frame: 1"]);
        assert_eq!(&data[parsed.payload_offset..], b"DATA");
    }

    #[test]
    fn leading_line_break_after_boundary_is_skipped() {
        let data = b"\r\nContent-Type: image/jpeg\r\n\r\nJPEG";
        let parsed = parse_part_headers(data).unwrap();
        assert_eq!(parsed.lines, vec!["Content-Type: image/jpeg"]);
        assert_eq!(&data[parsed.payload_offset..], b"JPEG");
    }

    #[test]
    fn two_blank_lines_end_an_empty_block() {
        let data = b"\r\n\r\nraw";
        let parsed = parse_part_headers(data).unwrap();
        assert!(parsed.lines.is_empty());
        assert_eq!(&data[parsed.payload_offset..], b"raw");
    }

    #[test]
    fn nul_and_bare_cr_are_dropped_from_lines() {
        let data = b"Content\0-Type: text/\rplain\r\n\r\nx";
        let parsed = parse_part_headers(data).unwrap();
        assert_eq!(parsed.lines, vec!["Content-Type: text/plain"]);
    }

    #[test]
    fn payload_line_breaks_are_not_headers() {
        let data = b"A: 1\r\n\r\nline one\r\n\r\nline two";
        let parsed = parse_part_headers(data).unwrap();
        assert_eq!(parsed.lines, vec!["A: 1"]);
        assert_eq!(&data[parsed.payload_offset..], b"line one\r\n\r\nline two");
    }

    #[test]
    fn missing_terminator_fails() {
        assert_eq!(
            parse_part_headers(b"Content-Type: image/jpeg\r\nno blank line"),
            Err(HeaderError::Unterminated)
        );
        assert_eq!(parse_part_headers(b""), Err(HeaderError::Unterminated));
        assert_eq!(parse_part_headers(b"\r\n"), Err(HeaderError::Unterminated));
    }

    #[test]
    fn empty_payload_after_headers() {
        let data = b"A: 1\n\n";
        let parsed = parse_part_headers(data).unwrap();
        assert_eq!(parsed.payload_offset, data.len());
    }
}
