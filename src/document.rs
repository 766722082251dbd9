//! Rewriting of markdown documents: stripping output blocks and regenerating them.
//!
//! Both operations are plain string-to-string transformations. Everything that
//! is not a recognised block is copied through byte for byte.

use tracing::debug;

use crate::fence::{
    find_closing, find_fence, find_opening, has_output_marker, output_block_end, CodeBlock, FENCE,
};
use crate::snippet::SnippetRunner;
use crate::utils::trim_trailing_newlines;

const OUTPUT_HEADER: &str = "\n**Output**\n```\n";

/// Remove every output block and canonicalise the code blocks left behind.
///
/// Code bodies lose their trailing newlines, and two fences that would end up
/// touching are pulled apart by a blank line. `strip(strip(x)) == strip(x)`.
pub fn strip(text: &str) -> String {
    let text = remove_output_blocks(text);
    let text = trim_code_bodies(&text);
    let text = separate_glued_fences(&text);
    separate_adjacent_fences(&text)
}

/// Strip `text`, then execute every code block through `runner` and append
/// its output block. Blocks run one at a time in document order.
pub fn process<R: SnippetRunner + ?Sized>(text: &str, runner: &R) -> String {
    let text = strip(text);
    let mut out = String::with_capacity(text.len() * 2);
    let mut pos = 0;

    while let Some(opening) = find_opening(&text, pos) {
        let Some(close) = find_closing(&text, opening.body_start, |at| {
            !has_output_marker(&text, at)
        }) else {
            break;
        };
        let block = CodeBlock {
            tag: opening.tag,
            body: &text[opening.body_start..close],
        };
        debug!(tag = block.tag, offset = opening.start, "running code block");
        let result = runner.run(block.tag, &executable_source(&block));

        out.push_str(&text[pos..opening.start]);
        block.render(&mut out);
        out.push_str(OUTPUT_HEADER);
        out.push_str(result.output_text.trim());
        out.push('\n');
        out.push_str(FENCE);
        pos = close + FENCE.len();
    }

    out.push_str(&text[pos..]);
    out
}

/// Every code block of `text`, in document order.
pub fn code_blocks(text: &str) -> Vec<CodeBlock<'_>> {
    let mut blocks = Vec::new();
    let mut pos = 0;
    while let Some(opening) = find_opening(text, pos) {
        let Some(close) = find_fence(text, opening.body_start) else {
            break;
        };
        blocks.push(CodeBlock {
            tag: opening.tag,
            body: &text[opening.body_start..close],
        });
        pos = close + FENCE.len();
    }
    blocks
}

/// Source handed to the interpreter. Racket needs a `#lang` line to run a
/// file as a module, so one is supplied when the body has none. The rendered
/// block always keeps the body as written.
fn executable_source(block: &CodeBlock<'_>) -> String {
    if !block.tag.eq_ignore_ascii_case("racket") {
        return block.body.to_string();
    }
    let mut lines: Vec<&str> = block.body.lines().collect();
    if lines.first().map_or(true, |first| !first.starts_with("#lang")) {
        lines.insert(0, "#lang racket");
    }
    lines.join("\n")
}

fn remove_output_blocks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;

    while let Some(opening) = find_opening(text, pos) {
        let Some(close) = find_closing(text, opening.body_start, |at| {
            output_block_end(text, at).is_some()
        }) else {
            break;
        };
        let Some(end) = output_block_end(text, close) else {
            break;
        };
        out.push_str(&text[pos..close + FENCE.len()]);
        pos = end;
    }

    out.push_str(&text[pos..]);
    out
}

fn trim_code_bodies(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;

    while let Some(opening) = find_opening(text, pos) {
        let Some(close) = find_fence(text, opening.body_start) else {
            break;
        };
        out.push_str(&text[pos..opening.start]);
        CodeBlock {
            tag: opening.tag,
            body: trim_trailing_newlines(&text[opening.body_start..close]),
        }
        .render(&mut out);
        pos = close + FENCE.len();
    }

    out.push_str(&text[pos..]);
    out
}

// "``````" -> "```\n\n```"
fn separate_glued_fences(text: &str) -> String {
    insert_after_fence(text, "``````", FENCE.len(), "\n\n")
}

// "```\n```" -> "```\n\n```"
fn separate_adjacent_fences(text: &str) -> String {
    insert_after_fence(text, "```\n```", FENCE.len() + 1, "\n")
}

/// Wherever `pattern` occurs (scanning left to right, resuming after the
/// first `keep` bytes of each hit), insert `sep` after those `keep` bytes.
fn insert_after_fence(text: &str, pattern: &str, keep: usize, sep: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    let mut cursor = 0;

    while let Some(idx) = text[cursor..].find(pattern) {
        let split = cursor + idx + keep;
        out.push_str(&text[pos..split]);
        out.push_str(sep);
        pos = split;
        cursor = split;
    }

    out.push_str(&text[pos..]);
    out
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::snippet::{ExecutionResult, Status};

    /// Echoes `tag:source` back and records every call.
    #[derive(Default)]
    struct EchoRunner {
        calls: RefCell<Vec<(String, String)>>,
    }

    impl SnippetRunner for EchoRunner {
        fn run(&self, tag: &str, source: &str) -> ExecutionResult {
            self.calls
                .borrow_mut()
                .push((tag.to_string(), source.to_string()));
            ExecutionResult {
                output_text: format!("{tag}:{source}"),
                status: Status::Ok,
            }
        }
    }

    struct FixedRunner(&'static str);

    impl SnippetRunner for FixedRunner {
        fn run(&self, _tag: &str, _source: &str) -> ExecutionResult {
            ExecutionResult {
                output_text: self.0.to_string(),
                status: Status::Ok,
            }
        }
    }

    #[test]
    fn strip_removes_output_and_keeps_following_text() {
        let doc = "# T\n\n```py\nprint(2)\n```\n**Output**\n```\n2\n```\nafter\n";
        assert_eq!(strip(doc), "# T\n\n```py\nprint(2)\n```\nafter\n");
    }

    #[test]
    fn strip_accepts_colon_marker_without_newline() {
        let doc = "```py\nx\n```**Output:**\n```\n1\n```\n";
        assert_eq!(strip(doc), "```py\nx\n```\n");
    }

    #[test]
    fn strip_trims_trailing_newlines_in_bodies() {
        let doc = "```sh\necho a\n\n\n```\n";
        assert_eq!(strip(doc), "```sh\necho a\n```\n");
    }

    #[test]
    fn strip_leaves_plain_fences_and_prose_alone() {
        let doc = "text\n\n```\nno tag\n\n```\n\nmore `inline` text\n";
        assert_eq!(strip(doc), doc);
    }

    #[test]
    fn strip_separates_blocks_that_touch() {
        let doc = "```a\nx\n```\n**Output**\n```\n1\n``````b\ny\n```";
        assert_eq!(strip(doc), "```a\nx\n```\n\n```b\ny\n```");

        let doc = "```a\nx\n```\n```b\ny\n```";
        assert_eq!(strip(doc), "```a\nx\n```\n\n```b\ny\n```");
    }

    #[test]
    fn strip_is_idempotent() {
        let docs = [
            "# T\n\n```py\nprint(2)\n```\n**Output**\n```\n2\n```\n",
            "```a\nx\n\n```\n```b\ny\n```\n**Output:**\n```\n\n```\ntail",
            "no blocks at all\n",
            "```sh\n```\n",
        ];
        for doc in docs {
            let once = strip(doc);
            assert_eq!(strip(&once), once, "input: {doc:?}");
        }
    }

    #[test]
    fn process_appends_output_blocks_in_order() {
        let runner = EchoRunner::default();
        let doc = "intro\n\n```sh\necho 1\n```\n\ntext\n\n```py\nprint(2)\n```\n";
        let out = process(doc, &runner);
        assert_eq!(
            out,
            "intro\n\n```sh\necho 1\n```\n**Output**\n```\nsh:echo 1\n```\n\ntext\n\n\
             ```py\nprint(2)\n```\n**Output**\n```\npy:print(2)\n```\n"
        );
        let tags: Vec<String> = runner.calls.borrow().iter().map(|c| c.0.clone()).collect();
        assert_eq!(tags, ["sh", "py"]);
    }

    #[test]
    fn process_replaces_stale_output() {
        let doc = "```sh\necho 1\n```\n**Output**\n```\nstale\n```\n";
        let out = process(doc, &FixedRunner("fresh"));
        assert_eq!(out, "```sh\necho 1\n```\n**Output**\n```\nfresh\n```\n");
    }

    #[test]
    fn process_is_stable_when_run_twice() {
        let runner = FixedRunner("42");
        let doc = "a\n\n```sh\nx\n```\n\nb\n\n```sh\ny\n\n```\n";
        let once = process(doc, &runner);
        assert_eq!(process(&once, &runner), once);
    }

    #[test]
    fn process_renders_empty_output_as_empty_block() {
        let out = process("```sh\ntrue\n```", &FixedRunner("\n\n"));
        assert_eq!(out, "```sh\ntrue\n```\n**Output**\n```\n\n```");
    }

    #[test]
    fn process_trims_output() {
        let out = process("```sh\nx\n```", &FixedRunner("  a\nb \n\n"));
        assert_eq!(out, "```sh\nx\n```\n**Output**\n```\na\nb\n```");
    }

    #[test]
    fn strip_after_process_recovers_document() {
        let doc = "# Notes\n\n```sh\necho 1\n```\n\nprose\n```py\nx\n```\nend\n";
        let processed = process(doc, &FixedRunner("out"));
        assert_eq!(strip(&processed), strip(doc));
        assert_eq!(strip(&processed), doc);
    }

    #[test]
    fn racket_gets_lang_line_only_when_executed() {
        let runner = EchoRunner::default();
        let out = process("```racket\n(+ 1 2)\n```", &runner);
        assert_eq!(runner.calls.borrow()[0].1, "#lang racket\n(+ 1 2)");
        assert!(out.starts_with("```racket\n(+ 1 2)\n```\n**Output**"));

        let runner = EchoRunner::default();
        process("```Racket\n#lang typed/racket\n1\n```", &runner);
        assert_eq!(runner.calls.borrow()[0].1, "#lang typed/racket\n1");
    }

    #[test]
    fn racket_with_empty_body_still_gets_lang_line() {
        let runner = EchoRunner::default();
        process("```racket\n```", &runner);
        assert_eq!(runner.calls.borrow()[0].1, "#lang racket\n");
    }

    #[test]
    fn unterminated_block_is_left_untouched() {
        let runner = EchoRunner::default();
        let doc = "```sh\necho never closed\n";
        assert_eq!(process(doc, &runner), doc);
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn code_blocks_lists_tag_and_body() {
        let blocks = code_blocks("```sh\na\n```\n\n```\nplain\n```\n\n```py\nb\n```");
        assert_eq!(
            blocks,
            vec![
                CodeBlock { tag: "sh", body: "a\n" },
                CodeBlock { tag: "py", body: "b\n" },
            ]
        );
    }
}
