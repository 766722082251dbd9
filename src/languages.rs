//! Language registry: which command runs a code block of a given tag.
//!
//! Built-in defaults cover the usual interpreters and compilers. A per-user
//! file (`~/.config/runmd/languages.config`) can override or extend them:
//!
//! ```toml
//! python = "python3.12 {file}"
//! zig = "zig run {file}"
//! c = "sh -c 'cc {file} -o /tmp/runmd_c && /tmp/runmd_c'"
//! ```
//!
//! `{file}` is replaced with the path of the temporary source file.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::utils::find_executable;

pub const FILE_PLACEHOLDER: &str = "{file}";

const CONFIG_DIR: &str = ".config/runmd";
const CONFIG_FILE: &str = "languages.config";

/// Program plus arguments, with `{file}` standing in for the source path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandTemplate {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|&arg| arg.into()).collect(),
        }
    }

    /// Split a template string into words, honouring shell quoting so that
    /// `sh -c '…'` stays a single argument.
    pub fn parse(template: &str) -> Result<Self> {
        let mut words = shlex::split(template)
            .ok_or_else(|| anyhow!("unbalanced quotes in command template `{template}`"))?
            .into_iter();
        let program = words
            .next()
            .filter(|program| !program.is_empty())
            .ok_or_else(|| anyhow!("empty command template"))?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    /// Inverse of [`CommandTemplate::parse`].
    pub fn to_template_string(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|word| quote_word(word))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Substitute `file` into every argument.
    pub fn build(&self, file: &Path) -> (String, Vec<String>) {
        let file = file.to_string_lossy();
        let args = self
            .args
            .iter()
            .map(|arg| arg.replace(FILE_PLACEHOLDER, &file))
            .collect();
        (self.program.replace(FILE_PLACEHOLDER, &file), args)
    }

    /// Whether the program this template starts is installed.
    pub fn is_available(&self) -> bool {
        find_executable(&self.program).is_some()
    }
}

/// On-disk shape of the language file: tag -> template string.
#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct LanguagesConfig {
    pub languages: BTreeMap<String, String>,
}

impl LanguagesConfig {
    /// Parse TOML, falling back to one `tag: template` pair per line.
    pub fn parse(content: &str) -> Result<Self> {
        match toml::from_str::<Self>(content) {
            Ok(config) => Ok(config),
            Err(toml_err) => Self::parse_lines(content).with_context(|| {
                format!("not a TOML table of strings ({toml_err}) nor `tag: template` lines")
            }),
        }
    }

    fn parse_lines(content: &str) -> Result<Self> {
        let mut languages = BTreeMap::new();
        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((tag, template)) = line.split_once(':') else {
                bail!("line {}: expected `tag: template`", number + 1);
            };
            let template = template.trim();
            let template = template
                .strip_prefix('"')
                .and_then(|t| t.strip_suffix('"'))
                .unwrap_or(template);
            languages.insert(tag.trim().to_string(), template.to_string());
        }
        Ok(Self { languages })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LanguageRegistry {
    languages: BTreeMap<String, CommandTemplate>,
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LanguageRegistry {
    pub fn builtin() -> Self {
        let python = CommandTemplate::new("python3", &["{file}"]);
        let node = CommandTemplate::new("node", &["{file}"]);
        let languages = [
            ("python", python.clone()),
            ("py", python),
            ("racket", CommandTemplate::new("racket", &["{file}"])),
            ("bash", CommandTemplate::new("bash", &["{file}"])),
            ("sh", CommandTemplate::new("sh", &["{file}"])),
            ("javascript", node.clone()),
            ("js", node),
            ("ruby", CommandTemplate::new("ruby", &["{file}"])),
            ("php", CommandTemplate::new("php", &["{file}"])),
            ("julia", CommandTemplate::new("julia", &["{file}"])),
            ("lua", CommandTemplate::new("lua", &["{file}"])),
            ("r", CommandTemplate::new("Rscript", &["{file}"])),
            (
                "rust",
                compile_and_run("rustc {file} -o /tmp/runmd_rust && /tmp/runmd_rust"),
            ),
            ("go", CommandTemplate::new("go", &["run", "{file}"])),
            (
                "java",
                compile_and_run("javac {file} && java $(basename {file} .java)"),
            ),
            (
                "cpp",
                compile_and_run("g++ {file} -o /tmp/runmd_cpp && /tmp/runmd_cpp"),
            ),
            (
                "c",
                compile_and_run("gcc {file} -o /tmp/runmd_c && /tmp/runmd_c"),
            ),
        ];
        Self {
            languages: languages
                .into_iter()
                .map(|(tag, template)| (tag.to_string(), template))
                .collect(),
        }
    }

    /// Layer user entries over this registry; a user tag replaces the
    /// built-in one of the same name.
    pub fn with_overrides(mut self, config: &LanguagesConfig) -> Result<Self> {
        for (tag, template) in &config.languages {
            let template = CommandTemplate::parse(template)
                .with_context(|| format!("invalid command for language '{tag}'"))?;
            self.languages.insert(tag.clone(), template);
        }
        Ok(self)
    }

    /// Built-ins plus the entries of `path`, if that file exists.
    pub fn load(path: &Path) -> Result<Self> {
        let registry = Self::builtin();
        if !path.exists() {
            debug!(path = %path.display(), "no language config, using built-ins");
            return Ok(registry);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = LanguagesConfig::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        debug!(path = %path.display(), entries = config.languages.len(), "loaded language config");
        registry.with_overrides(&config)
    }

    /// Look a tag up as written, then lowercased.
    pub fn get(&self, tag: &str) -> Option<&CommandTemplate> {
        self.languages
            .get(tag)
            .or_else(|| self.languages.get(&tag.to_lowercase()))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.get(tag).is_some()
    }

    /// Whether the tag is registered and its program can be found.
    pub fn is_available(&self, tag: &str) -> bool {
        self.get(tag).is_some_and(CommandTemplate::is_available)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }

    pub fn to_config(&self) -> LanguagesConfig {
        LanguagesConfig {
            languages: self
                .languages
                .iter()
                .map(|(tag, template)| (tag.clone(), template.to_template_string()))
                .collect(),
        }
    }
}

// Plain words such as `{file}` are left readable; only words that would not
// survive splitting get quoted.
fn quote_word(word: &str) -> Cow<'_, str> {
    let plain = !word.is_empty()
        && !word.contains(|c: char| c.is_whitespace() || matches!(c, '\'' | '"' | '\\' | '#'));
    if plain {
        return Cow::Borrowed(word);
    }
    shlex::try_quote(word).unwrap_or(Cow::Borrowed(word))
}

fn compile_and_run(script: &str) -> CommandTemplate {
    CommandTemplate::new("sh", &["-c", script])
}

/// `~/.config/runmd/languages.config`
pub fn default_config_path() -> Result<PathBuf> {
    let home = home::home_dir().context("Could not determine home directory")?;
    Ok(home.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Write the built-in registry to `path`, creating parent directories.
pub fn write_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let content = toml::to_string(&LanguageRegistry::builtin().to_config())
        .context("serialize default language config")?;
    fs::write(path, content).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
