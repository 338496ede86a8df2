//! Write option loading: JSON config file, then command-line overrides.

use std::path::Path;

use anyhow::Context;
use jpegsimp_core::WriteOption;

/// Read write options from a JSON file; missing fields take zero values.
pub fn load(path: Option<&Path>) -> anyhow::Result<WriteOption> {
    let Some(path) = path else {
        return Ok(WriteOption::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

/// Apply flags on top of `base`. A given `--quality` wins; `--strip-all`
/// can only turn stripping on.
pub fn resolve(base: WriteOption, quality: Option<u8>, strip_all: bool) -> WriteOption {
    WriteOption {
        quality: quality.unwrap_or(base.quality),
        strip_all: base.strip_all || strip_all,
    }
}
