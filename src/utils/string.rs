use std::borrow::Cow;

// Interpreters on Windows emit CRLF line breaks, which would otherwise end up
// inside the output block next to the LF-only markdown around it.
//
// So captured output is decoded lossily, brought to LF and trimmed on both ends.
pub fn format_output(raw: &[u8]) -> String {
    let text: Cow<'_, str> = String::from_utf8_lossy(raw);
    text.replace("\r\n", "\n").trim().to_string()
}

/// Strip every trailing `\n` from a code body (and nothing else).
pub fn trim_trailing_newlines(body: &str) -> &str {
    body.trim_end_matches('\n')
}
