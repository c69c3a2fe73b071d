//! Turns a drop payload (files and folders) into the set of PDFs to
//! upload. Everything else is filtered out before any record is created.

use std::path::{Path, PathBuf};

use ignore::Walk;
use tracing::warn;

const PDF_EXTENSION: &str = "pdf";

pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(PDF_EXTENSION))
        .unwrap_or(false)
}

/// What a drop expanded to. `rejected` counts directly dropped non-PDF
/// files so the UI can say how many were skipped; non-PDFs found while
/// walking a dropped folder are filtered silently.
#[derive(Debug, Default)]
pub struct DropOutcome {
    pub accepted: Vec<PathBuf>,
    pub rejected: usize,
}

pub fn collect_pdfs<I>(paths: I) -> DropOutcome
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut outcome = DropOutcome::default();
    for path in paths {
        if path.is_dir() {
            collect_from_dir(&path, &mut outcome.accepted);
        } else if is_pdf(&path) {
            outcome.accepted.push(path);
        } else {
            outcome.rejected += 1;
        }
    }
    outcome
}

/// Walks a dropped folder, honoring gitignore rules and skipping hidden
/// entries the same way the folder picker flow always has.
fn collect_from_dir(dir: &Path, accepted: &mut Vec<PathBuf>) {
    for entry in Walk::new(dir) {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if path.is_file() && is_pdf(path) {
                    accepted.push(path.to_path_buf());
                }
            }
            Err(err) => warn!(%err, "skipping unreadable entry"),
        }
    }
}
