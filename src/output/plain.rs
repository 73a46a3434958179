//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use crate::scanner::{ProbeStatus, ScanReport, ScanStats};
use console::style;
use std::io::{self, Write};

const RULE: &str = "═══════════════════════════════════════════════════════════════";
const THIN_RULE: &str = "───────────────────────────────────────────────────────────────";

/// Print the report in human-readable plain text format.
pub fn print_report(report: &ScanReport) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, report)
}

/// Render the report to any writer.
pub fn write_report<W: Write>(out: &mut W, report: &ScanReport) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out, "                   {} Scan Results", style("titlescan").cyan().bold())?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    writeln!(out, "  {} {}", style("Scan ID:").bold(), style(report.id.short()).dim())?;
    writeln!(
        out,
        "  {} {} of {} targets probed in {:.2}s",
        style("Statistics:").bold(),
        report.targets_submitted,
        report.targets_planned,
        report.duration_ms as f64 / 1000.0
    )?;
    writeln!(out, "               {}", format_stats(&report.stats))?;
    if report.interrupted {
        writeln!(out, "  {}", style("Scan was interrupted; results are partial.").yellow())?;
    }
    writeln!(out)?;

    if report.results.is_empty() {
        writeln!(out, "  {}", style("No titles found.").dim())?;
    } else {
        writeln!(out, "  {}", style(THIN_RULE).dim())?;
        writeln!(
            out,
            "  {:<15}  {:<28}  {}",
            style("IP").bold(),
            style("URL").bold(),
            style("TITLE").bold()
        )?;
        writeln!(out, "  {}", style(THIN_RULE).dim())?;

        for entry in &report.results {
            writeln!(
                out,
                "  {:<15}  {:<28}  {}",
                entry.ip,
                entry.url,
                style(truncate_string(&single_line(&entry.title), 40)).green()
            )?;
        }

        writeln!(out, "  {}", style(THIN_RULE).dim())?;
    }

    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    Ok(())
}

/// One-line summary of the per-status counts.
pub fn format_stats(stats: &ScanStats) -> String {
    ProbeStatus::ALL
        .iter()
        .map(|&status| format!("{} {}", stats.count(status), status))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Print a scan header before scanning begins.
pub fn print_scan_header(range: &str, ports: &str, targets: u64, workers: usize) {
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("titlescan").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{} Range: {}", style("•").dim(), style(range).white().bold());
    println!("{} Ports: {}", style("•").dim(), style(ports).yellow());
    println!(
        "{} Probing {} targets with {} workers...",
        style("•").dim(),
        style(targets).white().bold(),
        workers
    );
    println!();
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate a string to a maximum number of characters, adding ellipsis if truncated.
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
