// src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use sklfix::codec::SklCodec;
use sklfix::registry::REGISTRY_FILE;
use sklfix::{migrate, scanner, HashRegistry, Outcome};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;

/// Output directory created next to the executable
const OUTPUT_DIR: &str = "files_updated";

#[derive(Parser)]
#[command(name = "sklfix")]
#[command(author, version, about = "Migrates legacy Fantome mod packages to the current skeleton asset revision", long_about = None)]
struct Cli {
    /// Package files or directories to migrate (searched recursively)
    #[arg(value_name = "PATH", required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory (default: files_updated next to the executable)
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Hash registry file (default: hashes_game.json next to the executable)
    #[arg(long, value_name = "FILE")]
    registry: Option<PathBuf>,

    /// Skip the interactive end-of-run pause
    #[arg(long)]
    no_pause: bool,
}

fn main() -> ExitCode {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let code = match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    };

    if !cli.no_pause {
        pause();
    }
    code
}

fn run(cli: &Cli) -> Result<()> {
    let base_dir = base_dir();
    let registry_path = cli
        .registry
        .clone()
        .unwrap_or_else(|| base_dir.join(REGISTRY_FILE));
    // Fatal before any package is touched
    let registry = HashRegistry::load(&registry_path)
        .with_context(|| format!("cannot load hash registry {}", registry_path.display()))?;
    let out_dir = cli
        .out_dir
        .clone()
        .unwrap_or_else(|| base_dir.join(OUTPUT_DIR));

    let packages = scanner::discover(&cli.inputs);
    if packages.is_empty() {
        println!("No packages found under the given paths.");
        return Ok(());
    }

    let codec = SklCodec::new();
    for package in &packages {
        let name = package
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("<invalid name>");
        match migrate::migrate_package(package, &registry, &codec, &out_dir) {
            Ok(Outcome::Updated { .. }) => println!("Zip {name} updated."),
            Ok(Outcome::Skipped(reason)) => println!("The zip {name} {}.", reason.message()),
            Err(e) => {
                error!(package = %package.display(), "migration failed: {e}");
                println!("Error in zip {name}: {e}");
            }
        }
    }

    Ok(())
}

/// Directory the executable lives in; registry and output default here
fn base_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn pause() {
    if !std::io::stdin().is_terminal() {
        return;
    }
    println!("Press Enter to exit...");
    let _ = std::io::stdin().read_line(&mut String::new());
}
