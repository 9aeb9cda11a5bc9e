//! Console summaries of a batch run and of the upload manifest

use crate::crawler::{BatchReport, Completion};
use crate::output::artifact::ManifestEntry;
use std::fmt::Write;

/// Renders the batch summary printed at the end of a run
pub fn render_report(report: &BatchReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Scrape Summary ===\n");

    let _ = writeln!(out, "Listings:");
    for (name, result) in &report.listings {
        match result {
            Ok(outcome) => {
                let _ = writeln!(
                    out,
                    "  {}: {} records, {}/{} pages, {} -> {}",
                    name,
                    outcome.records,
                    outcome.pages_walked,
                    outcome.last_page,
                    outcome.completion,
                    outcome.artifact.display()
                );
            }
            Err(e) => {
                let _ = writeln!(out, "  {}: FAILED ({})", name, e);
            }
        }
    }
    if report.listings.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    let _ = writeln!(out);

    if let Some(rankings) = &report.rankings {
        let _ = writeln!(out, "Rankings:");
        match rankings {
            Ok(outcome) => {
                for region in &outcome.regions {
                    let _ = writeln!(
                        out,
                        "  {}: {} teams -> {}",
                        region.region,
                        region.records,
                        region.artifact.display()
                    );
                }
                if outcome.completion != Completion::Complete {
                    let _ = writeln!(
                        out,
                        "  {} of {} regions written, {}",
                        outcome.regions.len(),
                        outcome.discovered,
                        outcome.completion
                    );
                }
            }
            Err(e) => {
                let _ = writeln!(out, "  FAILED ({})", e);
            }
        }
        let _ = writeln!(out);
    }

    if report.interrupted {
        let _ = writeln!(out, "Batch interrupted before every job ran.");
    }
    let _ = writeln!(
        out,
        "Total: {} records, {} failures",
        report.total_records(),
        report.failures()
    );
    out
}

/// Prints the batch summary to stdout
pub fn print_report(report: &BatchReport) {
    print!("{}", render_report(report));
}

/// Prints one `<key>\t<path>` line per manifest entry
pub fn print_manifest(entries: &[ManifestEntry]) {
    for entry in entries {
        println!("{}\t{}", entry.key, entry.path.display());
    }
}
