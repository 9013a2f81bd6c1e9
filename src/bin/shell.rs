//! logfs Shell Binary
//!
//! Formats an image and runs line commands against it, from a script file or
//! from standard input.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use clap::Parser;
use logfs::{Command, Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// logfs Shell
#[derive(Parser, Debug)]
#[command(name = "logfs-shell")]
#[command(about = "Interactive shell over a log-structured filesystem image")]
#[command(version)]
struct Args {
    /// Image file to mirror the disk to (in memory when omitted)
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Read commands from this file instead of stdin
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// fsync the image file after each persisted segment
    #[arg(long)]
    sync_on_rollover: bool,

    /// Stop at the first failing command
    #[arg(long)]
    fail_fast: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,logfs=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("logfs shell v{}", logfs::VERSION);

    let mut builder = Config::builder().sync_on_rollover(args.sync_on_rollover);
    if let Some(path) = &args.image {
        builder = builder.image_path(path);
    }

    let mut engine = match Engine::open(builder.build()) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    let input: Box<dyn BufRead> = match &args.script {
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(e) => {
                tracing::error!("Failed to open script {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut failures = 0usize;
    let mut mutated = false;
    let stdout = io::stdout();

    for (number, line) in input.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("Failed to read input: {}", e);
                std::process::exit(1);
            }
        };

        let result = Command::parse(&line).and_then(|command| match command {
            Some(command) => {
                mutated |= command.is_mutation();
                engine.execute(command).map(Some)
            }
            None => Ok(None),
        });

        let mut out = stdout.lock();
        match result {
            Ok(Some(output)) => {
                let _ = writeln!(out, "{}", output);
            }
            Ok(None) => {}
            Err(e) => {
                failures += 1;
                let _ = writeln!(out, "error (line {}, errno {}): {}", number + 1, e.errno(), e);
                if args.fail_fast {
                    break;
                }
            }
        }
    }

    // Read-only sessions skip the final sync
    if mutated {
        if let Err(e) = engine.close() {
            tracing::error!("Failed to sync image: {}", e);
            std::process::exit(1);
        }
    } else {
        tracing::debug!("No mutating commands, skipping final sync");
    }

    if failures > 0 {
        tracing::warn!("{} commands failed", failures);
        std::process::exit(2);
    }
}
