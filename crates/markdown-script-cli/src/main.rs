use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use markdown_script::Transformer;
use markdown_script_config::{Config, LoadOptions};
use std::{
    fs,
    io::{self, BufReader, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "MARKDOWN_SCRIPT_LOG";

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Write the script to this file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Config file to apply on top of discovered .markdown-script.toml files
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Path to markdown file, or '-' for stdin
    #[arg(value_name = "FILE")]
    path: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut options = LoadOptions::default();
    if let Some(path) = &cli.config {
        options = options.with_override_path(path);
    }
    let config = Config::load(options).context("Unable to load configuration")?;

    let script = transform_input(&cli.path, &config.transformer).with_context(|| {
        format!(
            "Unable to read markdown at path or stream: {}",
            cli.path.display()
        )
    })?;
    info!(bytes = script.len(), "transformed markdown");

    match &cli.output {
        Some(path) => fs::write(path, &script)
            .with_context(|| format!("Failed to write script to {}", path.display())),
        None => print_script(&script),
    }
}

fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(io::stderr)
        .try_init();
}

fn transform_input(path: &Path, transformer: &Transformer) -> Result<String> {
    if path == Path::new("-") {
        debug!("reading markdown from stdin");
        let stdin = io::stdin();
        let mut reader = BufReader::new(stdin.lock());
        Ok(transformer.transform_reader(&mut reader)?)
    } else {
        debug!(path = %path.display(), "reading markdown");
        Ok(transformer.transform_path(path)?)
    }
}

fn print_script(script: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match handle.write_all(script.as_bytes()) {
        Ok(_) => {}
        Err(err) if should_ignore_pipe_error(&err) => return Ok(()),
        Err(err) => return Err(err).context("Failed to print script"),
    }

    match handle.flush() {
        Ok(_) => Ok(()),
        Err(err) if should_ignore_pipe_error(&err) => Ok(()),
        Err(err) => Err(err).context("Failed to flush stdout"),
    }
}

fn should_ignore_pipe_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::WouldBlock
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn verbosity_maps_to_directives() {
        assert_eq!(verbosity_to_directive(0), "warn");
        assert_eq!(verbosity_to_directive(1), "info");
        assert_eq!(verbosity_to_directive(2), "debug");
        assert_eq!(verbosity_to_directive(3), "trace");
        assert_eq!(verbosity_to_directive(255), "trace");
    }

    #[test]
    fn parses_repeated_verbose_flag() {
        let cli = Cli::parse_from(["markdown-script", "-vv", "-o", "out.mjs", "doc.md"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.output, Some(PathBuf::from("out.mjs")));
        assert_eq!(cli.path, PathBuf::from("doc.md"));
    }
}
