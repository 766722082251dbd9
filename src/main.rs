use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use tracing::debug;

use runmd::languages::{default_config_path, write_default_config};
use runmd::{code_blocks, logging, process, strip, Executor, LanguageRegistry};

pub fn make_app() -> Command {
    Command::new("runmd")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Run code blocks inside Markdown files and insert their outputs inline")
        .arg(
            Arg::new("file")
                .help("Markdown file to process")
                .value_parser(value_parser!(PathBuf))
                .required_unless_present("init-config")
                .index(1),
        )
        .arg(
            Arg::new("clear")
                .short('c')
                .long("clear")
                .help("Clear outputs only")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("init-config")
                .long("init-config")
                .help("Create ~/.config/runmd/languages.config with sensible defaults")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Language config to use instead of ~/.config/runmd/languages.config")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECS")
                .help("Seconds each code block may run before it is stopped")
                .value_parser(value_parser!(u64))
                .default_value("10"),
        )
}

fn main() {
    logging::init();
    if let Err(err) = run(make_app().get_matches()) {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn config_path(matches: &ArgMatches) -> Result<PathBuf> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => Ok(path.clone()),
        None => default_config_path(),
    }
}

fn run(matches: ArgMatches) -> Result<()> {
    if matches.get_flag("init-config") {
        let config_path = config_path(&matches)?;
        write_default_config(&config_path)?;
        println!("Wrote default config to {}", config_path.display());
        return Ok(());
    }

    let file = matches
        .get_one::<PathBuf>("file")
        .context("missing markdown file argument")?;
    if !file.exists() {
        println!("File not found: {}", file.display());
        return Ok(());
    }
    let content =
        fs::read_to_string(file).with_context(|| format!("read {}", file.display()))?;

    if matches.get_flag("clear") {
        fs::write(file, strip(&content)).with_context(|| format!("write {}", file.display()))?;
        println!("Cleared outputs in {}", file.display());
        return Ok(());
    }

    let secs = matches.get_one::<u64>("timeout").copied().unwrap_or(10);
    if secs == 0 {
        bail!("--timeout must be > 0");
    }
    let registry = LanguageRegistry::load(&config_path(&matches)?)?;
    debug!(blocks = code_blocks(&content).len(), file = %file.display(), "processing");
    let executor = Executor::new(registry, Duration::from_secs(secs));

    fs::write(file, process(&content, &executor))
        .with_context(|| format!("write {}", file.display()))?;
    println!("Processed {}", file.display());
    Ok(())
}
