// ABOUTME: Build recipe helpers: the embedded base recipe and recipe comparison.
// ABOUTME: Comparison decides whether a newer shared recipe is available.

use crate::types::ImageRef;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// File name of a recipe inside its directory.
pub const RECIPE_FILE: &str = "Dockerfile";

/// Recipe used when neither the shared nor the cached recipe builds.
pub const BASE_RECIPE: &str = "# Base Image\n\
FROM gcr.io/cloud-datalab/datalab:local\n\
LABEL \"dll_image\"=\"datalab\"\n\
LABEL \"dll_version\"=\"base\"\n";

/// Whether two recipes agree line by line.
///
/// Only the first `min(len(local), len(latest))` lines are compared. An
/// unreadable file counts as a mismatch.
pub fn compare(local: &Path, latest: &Path) -> bool {
    match (read_lines(local), read_lines(latest)) {
        (Ok(local_lines), Ok(latest_lines)) => {
            let matched = local_lines
                .iter()
                .zip(latest_lines.iter())
                .all(|(a, b)| a == b);
            if !matched {
                tracing::debug!(
                    "recipes differ: {} vs {}",
                    local.display(),
                    latest.display()
                );
            }
            matched
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::debug!("recipe comparison failed: {}", e);
            false
        }
    }
}

/// Lines of a file, each keeping its terminator.
fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut lines = Vec::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        lines.push(line);
    }
    Ok(lines)
}

/// Value of a `LABEL "key"="value"` directive, if the recipe has one.
pub fn label_value(recipe: &str, key: &str) -> Option<String> {
    recipe.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("LABEL")?.trim();
        let (k, v) = rest.split_once('=')?;
        (k.trim().trim_matches('"') == key).then(|| v.trim().trim_matches('"').to_string())
    })
}

/// Image named by the first `FROM` line.
pub fn base_image(recipe: &str) -> Option<ImageRef> {
    recipe.lines().find_map(|line| {
        let mut words = line.split_whitespace();
        if !words.next()?.eq_ignore_ascii_case("FROM") {
            return None;
        }
        ImageRef::parse(words.next()?).ok()
    })
}
