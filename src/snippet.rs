use std::io::Write;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use tempfile::{Builder, TempPath};
use tracing::{debug, error, warn};

use crate::languages::{CommandTemplate, LanguageRegistry};
use crate::process::{run_with_timeout, CommandOutcome};
use crate::utils::format_output;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// How an execution ended. Only used to pick the text shown in the output
/// block; it is never written to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Unsupported,
    MissingDependency,
    RuntimeFailure,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub output_text: String,
    pub status: Status,
}

impl ExecutionResult {
    fn error(status: Status, message: impl std::fmt::Display) -> Self {
        Self {
            output_text: format!("[error] {message}"),
            status,
        }
    }
}

/// Something that turns the source of one code block into output text.
pub trait SnippetRunner {
    fn run(&self, tag: &str, source: &str) -> ExecutionResult;
}

/// Runs code blocks as local processes using the commands of a [`LanguageRegistry`].
#[derive(Debug, Clone)]
pub struct Executor {
    pub registry: LanguageRegistry,
    pub timeout: Duration,
}

impl Executor {
    pub fn new(registry: LanguageRegistry, timeout: Duration) -> Self {
        Self { registry, timeout }
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(LanguageRegistry::builtin(), DEFAULT_TIMEOUT)
    }
}

impl SnippetRunner for Executor {
    fn run(&self, tag: &str, source: &str) -> ExecutionResult {
        run(tag, source, &self.registry, self.timeout)
    }
}

/// Execute `source` as a program in language `tag`.
///
/// Every failure is folded into the returned text: an unknown tag, a missing
/// interpreter, a timeout, or anything going wrong around the child process.
/// At most one child process is started per call, and the temporary source
/// file is gone by the time this returns.
pub fn run(tag: &str, source: &str, registry: &LanguageRegistry, timeout: Duration) -> ExecutionResult {
    let Some(template) = registry.get(tag) else {
        debug!(tag, "no command registered");
        return ExecutionResult::error(Status::Unsupported, format!("Language '{tag}' not supported."));
    };
    execute(tag, source, template, timeout).unwrap_or_else(|err| {
        error!(tag, err = ?err, "code block execution failed");
        ExecutionResult::error(Status::RuntimeFailure, format!("{err:#}"))
    })
}

fn execute(tag: &str, source: &str, template: &CommandTemplate, timeout: Duration) -> Result<ExecutionResult> {
    // Dropping the TempPath removes the file, whichever way we leave.
    let script = write_source(tag, source)?;
    let (program, args) = template.build(&script);

    if !template.is_available() {
        warn!(tag, program = %program, "interpreter not found on PATH");
        return Ok(ExecutionResult::error(
            Status::MissingDependency,
            format!("Required interpreter/compiler for '{tag}' is not installed."),
        ));
    }

    let mut command = Command::new(&program);
    command.args(&args);
    let outcome = run_with_timeout(command, timeout)
        .with_context(|| format!("Fail to run {program}"))?;

    Ok(match outcome {
        CommandOutcome::TimedOut => ExecutionResult::error(Status::Timeout, "execution timed out"),
        CommandOutcome::Exited {
            status,
            stdout,
            stderr,
        } => {
            let stdout = format_output(&stdout);
            // A failing program that still printed something is shown as-is;
            // stderr only surfaces when stdout is empty.
            if !status.success() && stdout.is_empty() {
                debug!(tag, exit_code = ?status.code(), "showing stderr of failed block");
                ExecutionResult {
                    output_text: format_output(&stderr),
                    status: Status::RuntimeFailure,
                }
            } else {
                ExecutionResult {
                    output_text: stdout,
                    status: Status::Ok,
                }
            }
        }
    })
}

/// Write `source` to a fresh temporary file, suffixed with the tag when the
/// tag is a plain word (`.py`, `.rust`, ...).
fn write_source(tag: &str, source: &str) -> Result<TempPath> {
    let suffix = if !tag.is_empty() && tag.chars().all(char::is_alphanumeric) {
        format!(".{tag}")
    } else {
        String::new()
    };
    let mut file = Builder::new()
        .prefix("runmd-")
        .suffix(&suffix)
        .tempfile()
        .context("Failed to create temporary file")?;
    file.write_all(source.as_bytes())
        .context("Failed to write to temporary file")?;
    file.flush().context("Failed to flush temporary file")?;
    Ok(file.into_temp_path())
}
