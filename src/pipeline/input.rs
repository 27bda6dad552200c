//! Title list resolution: a file of titles, or titles given directly.

use crate::error::ArchiveError;
use std::path::Path;
use tracing::{debug, info};

/// Turn command-line arguments into the titles to archive.
///
/// When the first argument names an existing file, titles are read from it
/// one per line (trimmed, blank lines skipped) and any further arguments are
/// ignored. Otherwise every argument is a title.
pub fn resolve_titles(args: &[String]) -> Result<Vec<String>, ArchiveError> {
    let Some(first) = args.first() else {
        return Ok(Vec::new());
    };

    let path = Path::new(first);
    if path.is_file() {
        let contents = std::fs::read_to_string(path).map_err(|e| ArchiveError::TitleList {
            path: path.to_path_buf(),
            source: e,
        })?;
        if args.len() > 1 {
            debug!("Ignoring {} argument(s) after title list", args.len() - 1);
        }
        let titles = parse_title_list(&contents);
        info!("Read {} title(s) from {}", titles.len(), path.display());
        return Ok(titles);
    }

    Ok(args
        .iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect())
}

/// One title per line; surrounding whitespace trimmed, blank lines dropped.
pub fn parse_title_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
