//! Input collection for the batch resolution pipeline.
//!
//! Identifiers arrive from CLI arguments (literals or file paths), or from
//! stdin when no arguments are given. Order is preserved end to end; the
//! provenance tag only feeds diagnostics, never resolution logic.

use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::info;

/// Where an identifier came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Argument,
    File(PathBuf),
    Stdin,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::Argument => write!(f, "argument"),
            Origin::File(path) => write!(f, "file {}", path.display()),
            Origin::Stdin => write!(f, "stdin"),
        }
    }
}

/// One raw identifier (URL, DOI, free-text query) awaiting resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputItem {
    pub raw: String,
    pub origin: Origin,
}

/// Read identifiers line by line. Blank lines and full-line `#` comments are
/// skipped; a trailing ` #` comment is stripped.
pub fn read_items<R: BufRead>(reader: R, origin: Origin) -> io::Result<Vec<InputItem>> {
    let mut items = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = match line.find(" #") {
            Some(pos) => line[..pos].trim_end(),
            None => line,
        };
        if line.is_empty() {
            continue;
        }
        items.push(InputItem {
            raw: line.to_string(),
            origin: origin.clone(),
        });
    }
    Ok(items)
}

/// Collect identifiers from CLI arguments, in order: an argument naming a
/// readable file is read line by line, anything else is a literal identifier.
pub fn collect_inputs(args: &[String]) -> io::Result<Vec<InputItem>> {
    let mut items = Vec::new();
    for arg in args {
        let path = Path::new(arg);
        if path.is_file() {
            info!("processing file: {}", arg);
            let file = std::fs::File::open(path)?;
            items.extend(read_items(
                BufReader::new(file),
                Origin::File(path.to_path_buf()),
            )?);
        } else {
            items.push(InputItem {
                raw: arg.clone(),
                origin: Origin::Argument,
            });
        }
    }
    Ok(items)
}
