//! cxxsr - C++ symbol renamer
//!
//! Reads one mangled C++ symbol per line and replaces every identifier inside
//! it with a deterministic synthetic name, keeping the symbol demangleable.
//!
//! Usage:
//!   cxxsr < symbols.txt                 Rename symbols read from stdin
//!   cxxsr symbols.txt                   Rename symbols read from a file
//!   cxxsr --prefix=OBF_ --salt=s1       Choose substitute prefix and hash salt
//!   cxxsr --map=names.tsv < symbols.txt Also write the identifier mapping

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use cxxsr_core::{rename_stream, RenameConfig, RenameTable, DEFAULT_PREFIX};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cxxsr", version)]
#[command(about = "Rename identifiers inside mangled C++ symbol names", long_about = None)]
struct Cli {
    /// File with one mangled symbol per line (defaults to stdin)
    input: Option<PathBuf>,

    /// Prefix for generated identifier names
    #[arg(long, default_value = DEFAULT_PREFIX)]
    prefix: String,

    /// Salt mixed into the identifier hash
    #[arg(long, default_value = "")]
    salt: String,

    /// Write the identifier mapping as tab-separated lines to this file
    #[arg(long, value_name = "FILE")]
    map: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = RenameConfig::new(cli.prefix, cli.salt).context("Invalid --prefix")?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    let renamed = match &cli.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input: {}", path.display()))?;
            rename_stream(BufReader::new(file), &mut out, &config)
                .with_context(|| format!("Failed to rename symbols from {}", path.display()))?
        }
        None => rename_stream(io::stdin().lock(), &mut out, &config)
            .context("Failed to rename symbols from stdin")?,
    };
    out.flush().context("Failed to write output")?;

    if let Some(path) = &cli.map {
        write_map(path, &renamed.table)
            .with_context(|| format!("Failed to write map: {}", path.display()))?;
        tracing::info!(path = %path.display(), entries = renamed.table.len(), "wrote identifier map");
    }

    Ok(())
}

/// Log to stderr. `RUST_LOG` wins over the `-v` count.
fn setup_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Ignore the error if a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn write_map(path: &Path, table: &RenameTable) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for (identifier, substitute) in table.iter() {
        writeln!(out, "{}\t{}", identifier, substitute)?;
    }
    out.flush()?;
    Ok(())
}
