// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Parallax CLI
//!
//! `parallax check` reads a configuration and lists rejected commands;
//! `parallax inspect` builds the configured views and prints the transforms
//! derived for each canvas.

mod report;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use directories::ProjectDirs;
use parallax_config::{ConfigContainer, ConfigReader, Configured};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Check Parallax configurations and inspect derived views")]
struct Args {
    /// More logging (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Define `${NAME}` for the configuration (repeatable, NAME=VALUE).
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var, global = true)]
    vars: Vec<(String, String)>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a configuration and report rejected commands.
    Check {
        /// Configuration file (default: parallax.cfg in the user config dir).
        file: Option<PathBuf>,
    },
    /// Build the configured views and print each canvas' transforms.
    Inspect {
        /// Configuration file (default: parallax.cfg in the user config dir).
        file: Option<PathBuf>,
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
        /// Include world-space transforms.
        #[arg(long)]
        world: bool,
    },
}

fn parse_var(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, found `{s}`"))?;
    if name.is_empty() {
        return Err("variable name is empty".into());
    }
    Ok((name.to_owned(), value.to_owned()))
}

fn default_config_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("dev", "flyingrobots", "Parallax")
        .ok_or_else(|| anyhow!("could not resolve config dir"))?;
    Ok(dirs.config_dir().join("parallax.cfg"))
}

fn load(file: Option<PathBuf>, vars: Vec<(String, String)>) -> Result<(PathBuf, ConfigContainer)> {
    let path = match file {
        Some(path) => path,
        None => default_config_path()?,
    };
    let reader = vars
        .into_iter()
        .fold(ConfigReader::new().with_env(), |r, (k, v)| r.var(k, v));
    let container = reader
        .read_file(&path)
        .with_context(|| format!("read {}", path.display()))?;
    Ok((path, container))
}

fn check(out: &mut impl Write, path: &Path, container: &ConfigContainer) -> Result<()> {
    for diagnostic in container.diagnostics() {
        writeln!(out, "{diagnostic}")?;
    }
    writeln!(
        out,
        "{}: {} objects from {} files, {} rejected commands",
        path.display(),
        container.len(),
        container.files().len(),
        container.diagnostics().len()
    )?;
    if !container.diagnostics().is_empty() {
        bail!("{} rejected commands", container.diagnostics().len());
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.cmd {
        Command::Check { file } => {
            let (path, container) = load(file, args.vars)?;
            check(&mut out, &path, &container)
        }
        Command::Inspect { file, json, world } => {
            let (_, container) = load(file, args.vars)?;
            let configured = Configured::build(&container).context("assemble views")?;
            let reports = report::inspect(&configured, world);
            if json {
                serde_json::to_writer_pretty(&mut out, &reports).context("write json")?;
                writeln!(out)?;
            } else {
                report::write_text(&mut out, &reports)?;
            }
            Ok(())
        }
    }
}
