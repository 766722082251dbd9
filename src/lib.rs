//! Run the code blocks of a markdown file and keep their output next to them, like a notebook.
//!
//! # Getting started
//!
//! ```sh
//! cargo install runmd
//! runmd notes.md            # run every block, write outputs in place
//! runmd --clear notes.md    # remove every output block again
//! runmd --init-config       # write ~/.config/runmd/languages.config
//! ```
//!
//! # How to
//!
//! Let's say we have this markdown file:
//!
//! ````markdown
//! # Title
//!
//! ```python
//! print(1 + 1)
//! ```
//!
//! ```sh
//! echo "hello from $0"
//! ```
//! ````
//!
//! After `runmd notes.md` the file reads:
//!
//! ````markdown
//! # Title
//!
//! ```python
//! print(1 + 1)
//! ```
//! **Output**
//! ```
//! 2
//! ```
//!
//! ```sh
//! echo "hello from $0"
//! ```
//! **Output**
//! ```
//! hello from /tmp/runmd-Xa81bc.sh
//! ```
//! ````
//!
//! Running it again replaces the outputs instead of stacking new ones, and
//! `runmd --clear` gives back the original file.
//!
//! # Details
//!
//! A code block is three backticks, a language tag made of word characters,
//! a newline, the source, and a closing three backticks. Blocks without a tag
//! are never touched. An output block is a `**Output**` (or `**Output:**`) line
//! right after the closing fence, followed by an untagged fenced block.
//!
//! Each block's source is written to a temporary file, and the command
//! registered for its tag runs with `{file}` replaced by that path. Blocks run
//! one after the other in document order, each under a timeout (10 seconds by
//! default). Stdout is captured; stderr is shown only when the program fails
//! without printing anything. Problems such as an unknown tag, a missing
//! interpreter or a timeout end up as an `[error] …` line in the output block,
//! and the remaining blocks still run.
//!
//! Blocks tagged `racket` get a `#lang racket` line prepended at run time when
//! they do not start with a `#lang` line. The displayed block is left as written.
//!
//! The built-in languages are python/py, racket, bash, sh, javascript/js,
//! ruby, php, julia, lua, r, rust, go, java, cpp and c. See [`languages`] for
//! overriding them.

pub mod document;
pub mod fence;
pub mod languages;
pub mod logging;
pub mod process;
pub mod snippet;
mod utils;

pub use document::{code_blocks, process, strip};
pub use fence::CodeBlock;
pub use languages::{CommandTemplate, LanguageRegistry};
pub use snippet::{run, ExecutionResult, Executor, SnippetRunner, Status};
