//! The `optimize` subcommand.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::Context;
use jpegsimp_core::{optimize_files_with, optimize_with, Logger, Optimized, WriteOption};
use serde::Serialize;
use tracing::{info, warn};

use crate::{config, OptimizeArgs};

/// Summary printed after a successful run.
#[derive(Debug, Serialize)]
struct Report<'a> {
    input: &'a str,
    output: &'a str,
    #[serde(flatten)]
    sizes: Optimized,
    #[serde(skip_serializing_if = "Option::is_none")]
    ratio: Option<f64>,
}

impl Report<'_> {
    fn line(&self, json: bool) -> serde_json::Result<String> {
        if json {
            return serde_json::to_string(self);
        }
        Ok(match self.ratio {
            Some(ratio) => format!(
                "{} -> {}: {} --> {} bytes ({:.2}%)",
                self.input, self.output, self.sizes.size_in, self.sizes.size_out, ratio
            ),
            None => format!("{} -> {}: {} bytes", self.input, self.output, self.sizes.size_out),
        })
    }
}

fn is_std(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Run the `optimize` subcommand.
pub fn run(args: OptimizeArgs, logger: &Logger) -> anyhow::Result<()> {
    let base = config::load(args.config.as_deref())?;
    let opt = config::resolve(base, args.quality, args.strip_all);
    info!("write option: q {}, strip {}", opt.quality, opt.strip_all);

    let result = transcode(&args.input, &args.output, &opt, logger)?;

    let input = args.input.display().to_string();
    let output = args.output.display().to_string();
    let report = Report {
        input: &input,
        output: &output,
        sizes: result,
        ratio: result.ratio(),
    };
    let line = report.line(args.json)?;

    // keep stdout clean when it carries the image
    if is_std(&args.output) {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
    Ok(())
}

/// Pick the file-descriptor path when both ends are files, the stream path
/// otherwise.
fn transcode(
    input: &Path,
    output: &Path,
    opt: &WriteOption,
    logger: &Logger,
) -> anyhow::Result<Optimized> {
    let reader: Option<File> = if is_std(input) {
        None
    } else {
        Some(File::open(input).with_context(|| format!("failed to open {}", input.display()))?)
    };

    if is_std(output) {
        let stdout = io::stdout();
        let writer = BufWriter::new(stdout.lock());
        return match reader {
            Some(file) => stream(BufReader::new(file), writer, opt, logger),
            None => stream(io::stdin().lock(), writer, opt, logger),
        };
    }

    let out_file = File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let result = match &reader {
        Some(in_file) => optimize_files_with(in_file, &out_file, opt, logger)
            .map_err(anyhow::Error::from),
        None => stream(io::stdin().lock(), BufWriter::new(&out_file), opt, logger),
    };

    if result.is_err() {
        drop(out_file);
        if let Err(e) = std::fs::remove_file(output) {
            warn!("failed to remove partial output {}: {}", output.display(), e);
        }
    }
    result
}

fn stream<R: Read, W: Write>(
    input: R,
    mut output: W,
    opt: &WriteOption,
    logger: &Logger,
) -> anyhow::Result<Optimized> {
    let result = optimize_with(input, &mut output, opt, logger)?;
    output.flush().context("failed to flush output")?;
    Ok(result)
}
