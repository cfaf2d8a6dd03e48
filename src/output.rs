//! Output formatting and styling module.
//!
//! Provides a centralized interface for human-facing CLI output: colored
//! status lines and the end-of-run summary table. Diagnostic logging goes
//! through `tracing` instead.

use crate::file_organizer::{CandidateReport, FolderOutcome, RunReport};
use colored::*;

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - The per-run summary table
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use foldify::output::OutputFormatter;
    /// OutputFormatter::success("Folder created");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Prints one line per candidate describing what happened to it.
    pub fn candidate_lines(report: &RunReport) {
        for candidate in &report.candidates {
            let name = candidate
                .original_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| candidate.original_path.display().to_string());
            match &candidate.error {
                None => Self::success(&format!("{} → {}", name, describe_steps(candidate))),
                Some(reason) => Self::error(&format!("{}: {}", name, reason)),
            }
        }
    }

    /// Prints the summary table for a run.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use foldify::file_organizer::{FileOrganizer, OrganizeRequest};
    /// use foldify::output::OutputFormatter;
    /// use foldify::rules::RuleSet;
    ///
    /// let rules = RuleSet::identity();
    /// let mut request = OrganizeRequest::new("/path/to/downloads");
    /// request.create_folder = true;
    /// let report = FileOrganizer::new(&rules).run(&request).unwrap();
    /// OutputFormatter::summary_table(&report);
    /// ```
    pub fn summary_table(report: &RunReport) {
        Self::header("SUMMARY");

        let rows = summary_rows(report);
        let width = rows
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(0)
            .max(7); // At least "Outcome" width

        println!(
            "{:<width$} | {}",
            "Outcome".bold(),
            "Files".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 10));

        for (label, count) in &rows {
            let count_text = if *label == "Failed" && *count > 0 {
                count.to_string().red()
            } else {
                count.to_string().green()
            };
            println!("{:<width$} | {}", label, count_text, width = width);
        }

        println!("{}", "-".repeat(width + 10));
        let total = report.candidates.len();
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total.to_string().green().bold(),
            if total == 1 { "file" } else { "files" },
            width = width
        );
    }
}

/// Labelled counts shown in the summary table, in display order.
pub fn summary_rows(report: &RunReport) -> Vec<(&'static str, usize)> {
    vec![
        ("Skipped", report.skipped.len()),
        ("Renamed", report.files_renamed()),
        ("Folders created", report.folders_created()),
        ("Moved", report.files_moved()),
        ("Failed", report.failed().count()),
    ]
}

fn describe_steps(candidate: &CandidateReport) -> String {
    let mut steps = Vec::new();
    if let Some(renamed) = &candidate.renamed_to {
        let name = renamed
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        steps.push(format!("renamed to {}", name));
    }
    match candidate.folder {
        Some(FolderOutcome::Created) => steps.push("folder created".to_string()),
        Some(FolderOutcome::ForceCreated) => steps.push("folder re-created".to_string()),
        Some(FolderOutcome::AlreadyExists) => steps.push("folder exists".to_string()),
        None => {}
    }
    if let Some(moved) = &candidate.moved_to {
        steps.push(format!("moved to {}", moved.display()));
    }
    if steps.is_empty() {
        "unchanged".to_string()
    } else {
        steps.join(", ")
    }
}
