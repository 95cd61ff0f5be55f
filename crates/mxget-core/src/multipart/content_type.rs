//! Detects `multipart/x-mixed-replace` responses and extracts the boundary.

/// Media type of a server-push stream.
pub const MIXED_REPLACE: &str = "multipart/x-mixed-replace";

/// Returns the boundary token of a `multipart/x-mixed-replace; boundary=<token>`
/// content type, or `None` for any other type.
///
/// The media type and parameter name compare case-insensitively; the token is
/// returned as sent (quotes stripped). Other parameters are ignored.
pub fn boundary_token(content_type: &str) -> Option<&str> {
    let mut params = content_type.split(';');
    let media_type = params.next()?.trim();
    if !media_type.eq_ignore_ascii_case(MIXED_REPLACE) {
        return None;
    }
    params.find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("boundary") {
            return None;
        }
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

/// Delimiter bytes as they appear in the body: `--` followed by the token.
pub fn boundary_marker(content_type: &str) -> Option<Vec<u8>> {
    boundary_token(content_type).map(|token| {
        let mut marker = Vec::with_capacity(token.len() + 2);
        marker.extend_from_slice(b"--");
        marker.extend_from_slice(token.as_bytes());
        marker
    })
}
