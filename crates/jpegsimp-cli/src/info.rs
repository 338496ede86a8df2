//! Image inspection: print attributes without re-encoding.

use std::fs::File;
use std::path::Path;

use anyhow::Context;
use jpegsimp_core::{Attr, ImageHandle, Logger, Source};

use crate::InfoArgs;

/// Run the `info` subcommand.
///
/// Files that fail to open are reported and skipped; the command fails if
/// none could be read.
pub fn run(args: InfoArgs, logger: &Logger) -> anyhow::Result<()> {
    let mut opened = 0;
    let multi = args.files.len() > 1;

    for path in &args.files {
        match inspect_file(path, logger) {
            Ok(attr) => {
                opened += 1;
                if args.json {
                    println!("{}", serde_json::to_string(&attr)?);
                } else {
                    if multi {
                        println!("{}:", path.display());
                    }
                    print_attr(&attr);
                }
            }
            Err(e) => eprintln!("{}: error: {e:#}", path.display()),
        }
    }

    if opened == 0 {
        anyhow::bail!("no image could be read");
    }
    Ok(())
}

/// Open one file through the file-descriptor path and label its attributes.
pub fn inspect_file(path: &Path, logger: &Logger) -> anyhow::Result<Attr> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut handle = ImageHandle::open_with(Source::file(&file), logger.clone())?;
    let attr = label(handle.attr().clone(), path);
    handle.close()?;
    Ok(attr)
}

/// Fill `ext` and `name` from the path.
fn label(attr: Attr, path: &Path) -> Attr {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    attr.with_ext(ext).with_name(name)
}

fn print_attr(attr: &Attr) {
    println!("  Size:     {}x{}", attr.width, attr.height);
    if attr.quality > 0 {
        println!("  Quality:  {}", attr.quality);
    } else {
        println!("  Quality:  unknown");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_jpeg;
    use jpegsimp_core::{optimize, WriteOption};

    #[test]
    fn test_label_from_path() {
        let attr = label(Attr::new(2, 3, 80), Path::new("/photos/Cat.JPG"));
        assert_eq!(attr.ext, "jpg");
        assert_eq!(attr.name, "Cat.JPG");
        assert_eq!((attr.width, attr.height, attr.quality), (2, 3, 80));
    }

    #[test]
    fn test_label_without_extension() {
        let attr = label(Attr::new(2, 3, 80), Path::new("blob"));
        assert!(attr.ext.is_empty());
        assert_eq!(attr.name, "blob");
    }

    #[test]
    fn test_inspect_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.jpeg");
        std::fs::write(&path, sample_jpeg(12, 9, 80)).unwrap();

        let attr = inspect_file(&path, &Logger::global()).unwrap();
        assert_eq!((attr.width, attr.height), (12, 9));
        assert!(attr.quality.abs_diff(80) <= 1);
        assert_eq!((attr.ext.as_str(), attr.name.as_str()), ("jpeg", "tiny.jpeg"));
    }

    #[test]
    fn test_inspect_reencoded_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        let mut output = Vec::new();
        let jpeg = sample_jpeg(12, 9, 80);
        optimize(jpeg.as_slice(), &mut output, &WriteOption::new(95, true)).unwrap();
        std::fs::write(&path, &output).unwrap();

        let attr = inspect_file(&path, &Logger::global()).unwrap();
        assert_eq!((attr.width, attr.height), (12, 9));
        assert!(attr.quality.abs_diff(95) <= 1);
    }

    #[test]
    fn test_inspect_missing_file() {
        let err = inspect_file(Path::new("/nonexistent/x.jpg"), &Logger::global()).unwrap_err();
        assert!(err.to_string().starts_with("failed to open"));
    }

    #[test]
    fn test_run_fails_when_nothing_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.jpg");
        std::fs::write(&path, b"nope").unwrap();

        let args = InfoArgs {
            files: vec![path],
            json: true,
        };
        assert!(run(args, &Logger::global()).is_err());
    }
}
