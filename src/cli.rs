//! Command-line interface module for foldify.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Logging setup
//! - Loading the rename rules
//! - Running the organizer and presenting its report

use crate::file_organizer::{FileOrganizer, OrganizeRequest, RunReport};
use crate::output::OutputFormatter;
use crate::properties::RuleProperties;
use crate::rules::RuleSet;
use clap::{ArgAction, Parser};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(name = "foldify")]
#[command(version, about = "Move each file of a directory into a folder named after it")]
#[command(long_about = "Move each file of a directory into a folder named after it.\n\n\
    Files can be renamed first with rules read from config/renameRules.properties,\n\
    .foldifyrc.toml or ~/.config/foldify/rules.toml.\n\n\
    Exit codes:\n  \
    0 - Every file was processed\n  \
    1 - Some files failed\n  \
    2 - The directory could not be read")]
pub struct Cli {
    /// Directory to organize (defaults to the current directory)
    #[arg(short, long, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Re-issue folder creation for folders that already exist
    #[arg(short, long)]
    pub force: bool,

    /// Move each file into its folder, replacing a same-named file there
    #[arg(short = 'm', long = "move")]
    pub move_files: bool,

    /// Create a folder named after each file
    #[arg(short = 'c', long = "create")]
    pub create_folder: bool,

    /// Rename files using the rename rules before organizing
    #[arg(short, long)]
    pub rename: bool,

    /// Extensions to include, e.g. "pdf,txt"
    #[arg(long = "ext-include", visible_alias = "ei", value_name = "LIST")]
    pub ext_include: Option<String>,

    /// Extensions to skip, e.g. "log,tmp"
    #[arg(long = "ext-exclude", visible_alias = "ex", value_name = "LIST")]
    pub ext_exclude: Option<String>,

    /// Skip files whose extension is not in --ext-include
    #[arg(long, requires = "ext_include")]
    pub strict_include: bool,

    /// Rename rules file (.properties or .toml)
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Show what would happen without changing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Builds the organizer request, resolving the directory.
    ///
    /// # Errors
    ///
    /// Fails when no path was given and the current directory is unavailable.
    pub fn to_request(&self) -> Result<OrganizeRequest, String> {
        let source_directory = match &self.path {
            Some(path) => path.clone(),
            None => std::env::current_dir()
                .map_err(|e| format!("Cannot determine current directory: {}", e))?,
        };

        Ok(OrganizeRequest {
            source_directory,
            force: self.force,
            move_files: self.move_files,
            create_folder: self.create_folder,
            rename: self.rename,
            ext_include: self.ext_include.clone(),
            ext_exclude: self.ext_exclude.clone(),
            strict_include: self.strict_include,
            dry_run: self.dry_run,
        })
    }

    /// Log filter used when `RUST_LOG` is not set.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Installs the global `tracing` subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over the verbosity flags.
pub fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A subscriber may already be installed (tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Loads the rename rules, falling back to identity rules on any problem.
///
/// Renaming never blocks the run: missing or unreadable rules leave names
/// unchanged, and malformed fields only disable their own stage.
pub fn load_rules(explicit: Option<&Path>) -> RuleSet {
    match RuleProperties::load(explicit) {
        Ok(Some(props)) => {
            if let Some(origin) = props.origin() {
                info!("Rename rules loaded from {}", origin.display());
            }
            let rules = RuleSet::from_properties(&props);
            for problem in rules.problems() {
                warn!("Rename rule ignored: {}", problem);
            }
            rules
        }
        Ok(None) => {
            warn!("No rename rules found; file names will be kept");
            RuleSet::identity()
        }
        Err(e) => {
            warn!("Could not load rename rules ({}); file names will be kept", e);
            RuleSet::identity()
        }
    }
}

/// Runs the CLI application with parsed arguments.
///
/// Returns the run report; per-file failures are inside it.
///
/// # Errors
///
/// Returns an error message when the directory cannot be listed or the
/// report cannot be serialized.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use foldify::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["foldify", "--path", "/path/to/downloads", "--create", "--move"]);
/// match run_cli(&cli) {
///     Ok(report) => println!("Moved {} files", report.files_moved()),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(cli: &Cli) -> Result<RunReport, String> {
    let request = cli.to_request()?;
    let rules = if request.rename {
        load_rules(cli.rules.as_deref())
    } else {
        RuleSet::identity()
    };

    info!("------------- {} Start -------------", chrono::Local::now());
    if !cli.json {
        OutputFormatter::info(&format!(
            "Organizing contents of: {}",
            request.source_directory.display()
        ));
        if request.dry_run {
            OutputFormatter::dry_run_notice("No files will be modified.");
        }
    }

    let report = FileOrganizer::new(&rules)
        .run(&request)
        .map_err(|e| e.to_string())?;
    info!("------------- {} End -------------", chrono::Local::now());

    if cli.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Could not serialize report: {}", e))?;
        println!("{}", json);
    } else {
        present_report(&request, &report);
    }

    Ok(report)
}

fn present_report(request: &OrganizeRequest, report: &RunReport) {
    if !request.has_operation() {
        OutputFormatter::warning("No operation requested. Use --create, --move or --rename.");
        return;
    }

    OutputFormatter::header(&format!("Operation: {}", report.operation));
    if report.candidates.is_empty() {
        OutputFormatter::info("Nothing to do.");
    }
    OutputFormatter::candidate_lines(report);
    OutputFormatter::summary_table(report);

    if report.has_failures() {
        OutputFormatter::error("Some files could not be organized. Please review errors above.");
    }
    if report.dry_run {
        OutputFormatter::dry_run_notice("Dry run complete. No files were modified.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_flags() {
        let cli = Cli::try_parse_from(["foldify", "-p", "/data", "-c", "-m", "-r", "-f"]).unwrap();
        let request = cli.to_request().unwrap();

        assert_eq!(request.source_directory, PathBuf::from("/data"));
        assert!(request.create_folder);
        assert!(request.move_files);
        assert!(request.rename);
        assert!(request.force);
        assert!(!request.dry_run);
    }

    #[test]
    fn test_parse_extension_aliases() {
        let cli = Cli::try_parse_from(["foldify", "--ei", "pdf", "--ex", "log,tmp"]).unwrap();
        assert_eq!(cli.ext_include.as_deref(), Some("pdf"));
        assert_eq!(cli.ext_exclude.as_deref(), Some("log,tmp"));

        let cli = Cli::try_parse_from(["foldify", "--ext-include", "mkv"]).unwrap();
        assert_eq!(cli.ext_include.as_deref(), Some("mkv"));
    }

    #[test]
    fn test_strict_include_requires_include_list() {
        assert!(Cli::try_parse_from(["foldify", "--strict-include"]).is_err());
        assert!(Cli::try_parse_from(["foldify", "--strict-include", "--ei", "pdf"]).is_ok());
    }

    #[test]
    fn test_path_defaults_to_current_directory() {
        let cli = Cli::try_parse_from(["foldify", "-c"]).unwrap();
        let request = cli.to_request().unwrap();
        assert_eq!(request.source_directory, std::env::current_dir().unwrap());
    }

    #[test]
    fn test_log_level_from_flags() {
        fn level(args: &[&str]) -> &'static str {
            Cli::try_parse_from(args).unwrap().log_level()
        }
        assert_eq!(level(&["foldify"]), "warn");
        assert_eq!(level(&["foldify", "-v"]), "info");
        assert_eq!(level(&["foldify", "-vv"]), "debug");
        assert_eq!(level(&["foldify", "-q"]), "error");
        assert!(Cli::try_parse_from(["foldify", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_load_rules_missing_file_falls_back_to_identity() {
        let rules = load_rules(Some(Path::new("/non/existent/rules.properties")));
        assert!(rules.is_identity());
    }
}
