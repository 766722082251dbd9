//! Token recognition for the document scanner.
//!
//! A document is never parsed into a tree. The transformer walks it left to
//! right and only ever asks three questions at a given offset:
//!
//! - does an opening fence (three backticks, a language tag, a newline) start here or later?
//! - where is the next run of three backticks?
//! - is the closing fence at this offset followed by an output block?
//!
//! Fences are recognised anywhere in the text, not only at the start of a line.

use lazy_static::lazy_static;
use regex::Regex;

pub const FENCE: &str = "```";

lazy_static! {
    static ref OPENING_FENCE: Regex =
        Regex::new(r"```(\w+)\n").expect("Failed to init regex for opening fences");
    static ref OUTPUT_MARKER: Regex = Regex::new(r"^\n?\*\*Output:?\*\*")
        .expect("Failed to init regex for output markers");
}

/// A fenced code block: the language tag and the raw text between the
/// opening line and the closing fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeBlock<'a> {
    pub tag: &'a str,
    pub body: &'a str,
}

impl CodeBlock<'_> {
    /// Render the block as a fence, keeping a trailing newline the body
    /// already has instead of doubling it.
    pub fn render(&self, out: &mut String) {
        out.push_str(FENCE);
        out.push_str(self.tag);
        out.push('\n');
        out.push_str(self.body);
        if !self.body.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(FENCE);
    }
}

/// An opening fence located in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opening<'a> {
    /// Offset of the first backtick.
    pub start: usize,
    pub tag: &'a str,
    /// Offset right after the newline that ends the opening line.
    pub body_start: usize,
}

/// Leftmost opening fence at or after `from`.
pub fn find_opening(text: &str, from: usize) -> Option<Opening<'_>> {
    let caps = OPENING_FENCE.captures_at(text, from)?;
    let whole = caps.get(0)?;
    let tag = caps.get(1)?;
    Some(Opening {
        start: whole.start(),
        tag: tag.as_str(),
        body_start: whole.end(),
    })
}

/// Offset of the next three-backtick run at or after `from`.
pub fn find_fence(text: &str, from: usize) -> Option<usize> {
    text.get(from..)?.find(FENCE).map(|idx| from + idx)
}

/// First closing fence at or after `from` accepted by `accept`. Overlapping
/// runs (four or more backticks) are tried at every offset.
pub fn find_closing(text: &str, from: usize, accept: impl Fn(usize) -> bool) -> Option<usize> {
    let mut cursor = from;
    while let Some(close) = find_fence(text, cursor) {
        if accept(close) {
            return Some(close);
        }
        cursor = close + 1;
    }
    None
}

/// Whether the closing fence at `close` is directly followed by an output
/// marker, allowing one newline in between.
pub fn has_output_marker(text: &str, close: usize) -> bool {
    text.get(close + FENCE.len()..)
        .is_some_and(|rest| OUTPUT_MARKER.is_match(rest))
}

/// If an output block follows the closing fence at `close`, the offset right
/// after the output block's own closing fence.
pub fn output_block_end(text: &str, close: usize) -> Option<usize> {
    let after = close + FENCE.len();
    let rest = text.get(after..)?;
    let marker = OUTPUT_MARKER.find(rest)?;
    let fence_open = after + marker.end();
    if !text.get(fence_open..)?.starts_with("\n```") {
        return None;
    }
    let inner = fence_open + 1 + FENCE.len();
    find_fence(text, inner).map(|end| end + FENCE.len())
}
