//! Batch summary rendering

use std::fmt::Write;
use wwgacha::BatchSummary;

/// Render the end-of-run summary printed on stdout
pub fn render_summary(summary: &BatchSummary) -> String {
    let mut out = String::new();

    let records: usize = summary.converted.iter().map(|f| f.records).sum();
    writeln!(
        out,
        "Converted {} files ({} records, {} rows skipped)",
        summary.converted.len(),
        records,
        summary.skipped_rows()
    )
    .unwrap();
    for file in &summary.converted {
        let target = match &file.output {
            Some(path) => path.display().to_string(),
            None => "not written".to_string(),
        };
        writeln!(
            out,
            "  {} [{}] -> {} ({} records, {} skipped)",
            file.source.display(),
            file.format,
            target,
            file.records,
            file.failures.len()
        )
        .unwrap();
        for failure in &file.failures {
            writeln!(out, "    {}", failure).unwrap();
        }
    }

    if !summary.skipped.is_empty() {
        writeln!(out, "Skipped {} files", summary.skipped.len()).unwrap();
        for skipped in &summary.skipped {
            writeln!(out, "  {}: {}", skipped.path.display(), skipped.reason).unwrap();
        }
    }

    if !summary.write_failures.is_empty() {
        writeln!(out, "Failed to write {} files", summary.write_failures.len()).unwrap();
        for failed in &summary.write_failures {
            writeln!(out, "  {}: {}", failed.output.display(), failed.error).unwrap();
        }
    }

    out
}
