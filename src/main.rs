use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueHint};
use elyra::{Config, ExecutionResult, Session, logging};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// JSON config file. Flags below override its values.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Task file to load and save.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    file: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset (e.g. `info`, `elyra=debug`).
    #[arg(long)]
    log_level: Option<String>,

    /// Print every result as one JSON object per line.
    #[arg(long)]
    json: bool,

    /// Run these commands in order and exit instead of reading stdin.
    #[arg(short = 'e', long = "exec", value_name = "COMMAND")]
    exec: Vec<String>,
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        if let Some(file) = &self.file {
            config.data_file = file.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

fn emit(out: &mut impl Write, result: &ExecutionResult, json: bool) -> Result<()> {
    if json {
        serde_json::to_writer(&mut *out, result).context("serializing result")?;
        writeln!(out)?;
    } else {
        writeln!(out, "{}", result.response)?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config()?;
    let _logger = logging::init(&config.log_level)?;

    // Refuse to start on a corrupt file so it is never overwritten by an empty list.
    let mut session = Session::open(&config).with_context(|| {
        format!(
            "loading tasks from {}; fix or move the file and try again",
            config.data_file.display()
        )
    })?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if !cli.exec.is_empty() {
        for line in &cli.exec {
            let result = session.respond(line);
            emit(&mut out, &result, cli.json)?;
            if result.exit {
                break;
            }
        }
        return Ok(());
    }

    if !cli.json {
        writeln!(out, "{}", session.greeting())?;
    }
    for line in io::stdin().lock().lines() {
        let line = line.context("reading stdin")?;
        let result = session.respond(&line);
        emit(&mut out, &result, cli.json)?;
        if result.exit {
            break;
        }
    }
    Ok(())
}
