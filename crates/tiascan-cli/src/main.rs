//! tiascan - Read TIA Portal project files without TIA Portal installed
//!
//! Points at a project directory (or the project descriptor file inside
//! it), extracts whatever the binary container yields, and prints a
//! multi-section summary.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tiascan_core::ProjectReader;
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

/// Read TIA Portal project files without TIA Portal installed
#[derive(Parser, Debug)]
#[command(name = "tiascan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Project directory, or the .ap14/.ap15/... descriptor file inside it
    project: PathBuf,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    let reader = ProjectReader::new(&cli.project)
        .with_context(|| format!("Cannot open project at {}", cli.project.display()))?;

    debug!("Reading project at {}", reader.project_dir().display());
    let info = reader.read();
    print!("{}", info.summary());

    Ok(())
}
