use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use tracing::debug;

/// Characters escaped inside a single path segment (RFC 3986 `pchar` complement).
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Percent-encode a decoded server path, keeping `/` separators.
pub fn encode_path(decoded: &str) -> String {
    decoded
        .split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Decode a percent-encoded path. `+` is a literal character in paths and is kept.
///
/// Byte sequences that are not UTF-8 once decoded become U+FFFD, so such a path no longer
/// names the same resource on the server.
pub fn decode_path(raw: &str) -> String {
    match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(err) => {
            debug!(raw, error = %err, "decoded path is not UTF-8, replacing invalid bytes");
            percent_decode_str(raw).decode_utf8_lossy().into_owned()
        }
    }
}
