//! Terminal reports for a run.
//!
//! The rendered records go to stdout (or `--output`); these summaries go to
//! stderr so they never mix with piped CSV.

use std::io::{self, Write};

use tradicion_core::{FolioSearch, ReconcileReport, WarningKind};

const MAX_LISTED: usize = 10;

pub fn print_summary(report: &ReconcileReport) -> io::Result<()> {
    write_summary(&mut io::stderr().lock(), report)
}

pub fn write_summary(w: &mut impl Write, report: &ReconcileReport) -> io::Result<()> {
    let s = &report.summary;
    writeln!(w, "=== Resumen ===")?;

    // ── Counts ──

    if let Some(office) = &report.registry_office {
        writeln!(w, "  {:<26} {}", "registry office", office)?;
    }
    writeln!(w, "  {:<26} {}", "entries parsed", s.entries_parsed)?;
    writeln!(w, "  {:<26} {}", "records", s.records)?;
    writeln!(w, "  {:<26} {}", "found", s.found)?;
    writeln!(w, "  {:<26} {}", "not found", s.not_found)?;
    if report.with_deeds {
        writeln!(w, "  {:<26} {}", "deeds resolved", s.deeds_resolved)?;
        writeln!(w, "  {:<26} {}", "deeds missing", s.deeds_missing)?;
        writeln!(w, "  {:<26} {}", "annotation lookups", s.resolutions)?;
    }
    writeln!(w, "  {:<26} {}", "warnings", s.warnings)?;

    // ── Not found ──

    if !report.not_found.is_empty() {
        writeln!(w)?;
        writeln!(w, "  not found ({}):", report.not_found.len())?;
        for id in report.not_found.iter().take(MAX_LISTED) {
            writeln!(w, "    {id}")?;
        }
        if report.not_found.len() > MAX_LISTED {
            writeln!(w, "    ... and {} more", report.not_found.len() - MAX_LISTED)?;
        }
    }

    // ── Warnings ──

    if !report.warnings.is_empty() {
        writeln!(w)?;
        writeln!(w, "  warnings ({}):", report.warnings.len())?;
        for warning in report.warnings.iter().take(MAX_LISTED) {
            writeln!(
                w,
                "    line {:<5} {:<18} {}",
                warning.line,
                warning_label(warning.kind),
                truncate(&warning.text, 60)
            )?;
        }
        if report.warnings.len() > MAX_LISTED {
            writeln!(w, "    ... and {} more", report.warnings.len() - MAX_LISTED)?;
        }
    }
    Ok(())
}

/// One block per searched folio, with the context it was found in.
pub fn write_search(w: &mut impl Write, results: &[FolioSearch]) -> io::Result<()> {
    for result in results {
        match &result.sighting {
            Some(sighting) => {
                writeln!(
                    w,
                    "{:<12} found on page {} ({:?})",
                    result.folio, sighting.page, sighting.pattern
                )?;
                writeln!(w, "  ...{}...", sighting.context)?;
            }
            None => writeln!(w, "{:<12} not found", result.folio)?,
        }
    }

    let found = results.iter().filter(|r| r.is_found()).count();
    writeln!(w)?;
    writeln!(w, "=== Resumen ===")?;
    writeln!(w, "  {:<26} {}", "found", found)?;
    writeln!(w, "  {:<26} {}", "not found", results.len() - found)?;
    Ok(())
}

fn warning_label(kind: WarningKind) -> &'static str {
    match kind {
        WarningKind::UnparseableEntry => "unparseable entry",
        WarningKind::EmptyName => "empty name",
        WarningKind::Unterminated => "unterminated name",
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{cut}…")
    }
}
