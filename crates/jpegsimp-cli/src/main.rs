//! jpegsimp: re-encode JPEG files to reduce their size.
//!
//! Thin front end over `jpegsimp-core`: argument parsing, logging setup and
//! option loading live here; all image work happens in the core crate.

mod config;
#[cfg(test)]
mod fixtures;
mod info;
mod optimize;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use jpegsimp_core::Logger;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "jpegsimp", version, about = "Re-encode JPEG files to reduce their size")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Re-encode one image.
    Optimize(OptimizeArgs),

    /// Print image attributes without re-encoding.
    Info(InfoArgs),
}

/// Arguments for the `optimize` subcommand.
#[derive(Parser, Debug)]
pub struct OptimizeArgs {
    /// Input JPEG, or `-` for stdin.
    pub input: PathBuf,

    /// Output path, or `-` for stdout.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Output quality (0-100). Values below 75 are raised to 75.
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub quality: Option<u8>,

    /// Strip EXIF, XMP, ICC and comment segments.
    #[arg(long)]
    pub strip_all: bool,

    /// JSON file with default write options (`{"quality": 80, "strip_all": true}`).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` subcommand.
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Input JPEG files.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Build the logger all library calls report through.
fn logger(verbose: u8) -> Logger {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    Logger::from_subscriber(subscriber)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let logger = logger(cli.verbose);

    logger.scope(|| match cli.command {
        Command::Optimize(args) => optimize::run(args, &logger),
        Command::Info(args) => info::run(args, &logger),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_optimize() {
        let cli = Cli::try_parse_from([
            "jpegsimp", "-vv", "optimize", "in.jpg", "-o", "out.jpg", "-q", "60", "--strip-all",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Optimize(args) => {
                assert_eq!(args.input, PathBuf::from("in.jpg"));
                assert_eq!(args.output, PathBuf::from("out.jpg"));
                assert_eq!(args.quality, Some(60));
                assert!(args.strip_all);
                assert!(args.config.is_none());
            }
            other => panic!("expected optimize, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_quality_out_of_range() {
        let result =
            Cli::try_parse_from(["jpegsimp", "optimize", "in.jpg", "-o", "out.jpg", "-q", "101"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_info_requires_files() {
        assert!(Cli::try_parse_from(["jpegsimp", "info"]).is_err());

        let cli = Cli::try_parse_from(["jpegsimp", "info", "a.jpg", "b.jpg", "--json"]).unwrap();
        match cli.command {
            Command::Info(args) => {
                assert_eq!(args.files.len(), 2);
                assert!(args.json);
            }
            other => panic!("expected info, got {:?}", other),
        }
    }
}
