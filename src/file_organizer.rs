/// Per-file folder organization.
///
/// This module drives a single pass over a directory: list the entries,
/// classify them, then for every candidate optionally rename it, create its
/// target folder and move it in. Only a failed listing stops the pass; any
/// other failure is recorded against its file and the pass continues.
use crate::classifier::{Classification, classify, split_name};
use crate::lister::{DirectoryLister, FsLister};
use crate::renamer::{RenameOutcome, Renamer};
use crate::rules::RuleSet;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// What to do with the files of one directory. Built once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizeRequest {
    /// The directory whose direct children are organized.
    pub source_directory: PathBuf,
    /// Re-issue folder creation even when the folder already exists.
    pub force: bool,
    /// Move each file into its target folder, replacing a same-named file.
    pub move_files: bool,
    /// Create the target folder of each file.
    pub create_folder: bool,
    /// Rename files with the rule set before anything else.
    pub rename: bool,
    /// Extensions to include, as free text (`"pdf,txt"`).
    pub ext_include: Option<String>,
    /// Extensions to skip, as free text.
    pub ext_exclude: Option<String>,
    /// Treat `ext_include` as a hard filter.
    pub strict_include: bool,
    /// Compute and report every step without touching the filesystem.
    pub dry_run: bool,
}

impl OrganizeRequest {
    /// A request for `source_directory` with every operation switched off.
    pub fn new(source_directory: impl Into<PathBuf>) -> Self {
        Self {
            source_directory: source_directory.into(),
            ..Default::default()
        }
    }

    /// True when at least one of rename, create-folder or move is requested.
    pub fn has_operation(&self) -> bool {
        self.rename || self.create_folder || self.move_files
    }

    /// Human-readable summary of the requested operations.
    pub fn describe(&self) -> String {
        let mut text = if self.create_folder {
            let mut text = String::from("Create folder(s)");
            if self.rename {
                text.push_str(" with files renamed");
            }
            text
        } else if self.rename {
            String::from("Rename")
        } else if self.move_files {
            return String::from("Move into existing folders");
        } else {
            return String::from("No operation");
        };
        if self.move_files {
            text.push_str(" and move");
        }
        text
    }
}

/// A file selected for processing.
///
/// Never mutated: renaming produces a new candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub extension: Option<String>,
}

impl CandidateFile {
    /// # Errors
    ///
    /// Fails for paths without a UTF-8 file name.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, CandidateError> {
        let path = path.into();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| CandidateError::UnreadableName { path: path.clone() })?;
        let extension = split_name(file_name).1.map(str::to_string);
        Ok(Self { path, extension })
    }

    pub fn file_name(&self) -> &str {
        // Checked in `new`
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }

    /// The file name without its extension.
    pub fn stem(&self) -> &str {
        split_name(self.file_name()).0
    }

    /// `parent / stem`: the folder this file belongs in.
    pub fn target_folder(&self) -> PathBuf {
        self.parent().join(self.stem())
    }

    fn parent(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// The candidate this file becomes under a new stem.
    fn with_stem(&self, stem: &str) -> Self {
        let file_name = match &self.extension {
            Some(ext) => format!("{}.{}", stem, ext),
            None => stem.to_string(),
        };
        Self {
            path: self.parent().join(file_name),
            extension: self.extension.clone(),
        }
    }
}

/// Stages of a pass, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Enumerating,
    Classifying,
    Renaming,
    Materializing,
    Moving,
}

/// Errors that abort the whole pass.
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("Failed to list directory {}: {source}", path.display())]
    ListingFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors that abandon a single candidate.
#[derive(Debug, Error)]
pub enum CandidateError {
    #[error("File name of {} is not valid UTF-8", path.display())]
    UnreadableName { path: PathBuf },
    #[error("Renaming {} would produce an empty name", path.display())]
    EmptyName { path: PathBuf },
    #[error("Renamed file name '{name}' is not a valid file name")]
    InvalidName { name: String },
    #[error("Cannot rename to {}: a file with that name already exists", path.display())]
    RenameTargetExists { path: PathBuf },
    #[error("Failed to rename {} to {}: {source}", from.display(), to.display())]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Target folder {} exists but is not a directory", path.display())]
    TargetNotDirectory { path: PathBuf },
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Target folder {} does not exist", path.display())]
    MissingTargetFolder { path: PathBuf },
    #[error("Failed to move {} to {}: {source}", from.display(), to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CandidateError {
    /// The phase in which this error stops a candidate.
    pub fn phase(&self) -> Phase {
        match self {
            Self::UnreadableName { .. } => Phase::Classifying,
            Self::EmptyName { .. }
            | Self::InvalidName { .. }
            | Self::RenameTargetExists { .. }
            | Self::RenameFailed { .. } => Phase::Renaming,
            Self::TargetNotDirectory { .. } | Self::DirectoryCreationFailed { .. } => {
                Phase::Materializing
            }
            Self::MissingTargetFolder { .. } | Self::FileMoveFailure { .. } => Phase::Moving,
        }
    }
}

/// Result type for passes over a directory.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// How the target folder step went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderOutcome {
    Created,
    AlreadyExists,
    /// The folder existed and creation was re-issued because of `force`.
    ForceCreated,
}

/// An entry that was not processed, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub classification: Classification,
}

/// Everything that happened to one candidate.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateReport {
    /// Where the file was when the pass found it.
    pub original_path: PathBuf,
    /// Where the file is now (or would be, in a dry run).
    pub final_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renamed_to: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rename: Option<RenameOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<FolderOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_folder: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moved_to: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<Phase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CandidateReport {
    fn new(path: &Path) -> Self {
        Self {
            original_path: path.to_path_buf(),
            final_path: path.to_path_buf(),
            renamed_to: None,
            rename: None,
            folder: None,
            target_folder: None,
            moved_to: None,
            failed_at: None,
            error: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// The outcome of one pass.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub source_directory: PathBuf,
    pub operation: String,
    pub dry_run: bool,
    pub skipped: Vec<SkippedEntry>,
    pub candidates: Vec<CandidateReport>,
}

impl RunReport {
    fn new(request: &OrganizeRequest) -> Self {
        Self {
            source_directory: request.source_directory.clone(),
            operation: request.describe(),
            dry_run: request.dry_run,
            skipped: Vec::new(),
            candidates: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &CandidateReport> {
        self.candidates.iter().filter(|c| c.succeeded())
    }

    pub fn failed(&self) -> impl Iterator<Item = &CandidateReport> {
        self.candidates.iter().filter(|c| !c.succeeded())
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }

    pub fn files_renamed(&self) -> usize {
        self.candidates
            .iter()
            .filter(|c| c.renamed_to.is_some())
            .count()
    }

    pub fn folders_created(&self) -> usize {
        self.candidates
            .iter()
            .filter(|c| c.folder == Some(FolderOutcome::Created))
            .count()
    }

    pub fn files_moved(&self) -> usize {
        self.candidates
            .iter()
            .filter(|c| c.moved_to.is_some())
            .count()
    }

    /// Finds the report for a file by its original name.
    pub fn candidate(&self, file_name: &str) -> Option<&CandidateReport> {
        self.candidates
            .iter()
            .find(|c| c.original_path.file_name().is_some_and(|n| n == file_name))
    }
}

/// Organizes the files of a directory into same-named folders.
///
/// # Examples
///
/// ```no_run
/// use foldify::file_organizer::{FileOrganizer, OrganizeRequest};
/// use foldify::rules::RuleSet;
///
/// let rules = RuleSet::identity();
/// let organizer = FileOrganizer::new(&rules);
///
/// let mut request = OrganizeRequest::new("/path/to/downloads");
/// request.create_folder = true;
/// request.move_files = true;
///
/// match organizer.run(&request) {
///     Ok(report) => println!("Moved {} files", report.files_moved()),
///     Err(e) => eprintln!("Organization failed: {}", e),
/// }
/// ```
pub struct FileOrganizer<'a, L = FsLister> {
    lister: L,
    renamer: Renamer<'a>,
}

impl<'a> FileOrganizer<'a, FsLister> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self::with_lister(FsLister, Renamer::new(rules))
    }
}

impl<'a, L: DirectoryLister> FileOrganizer<'a, L> {
    pub fn with_lister(lister: L, renamer: Renamer<'a>) -> Self {
        Self { lister, renamer }
    }

    /// Runs one pass over `request.source_directory`.
    ///
    /// # Errors
    ///
    /// Returns `OrganizeError::ListingFailed` when the directory cannot be
    /// listed completely. Per-file failures are reported in the
    /// [`RunReport`] instead.
    pub fn run(&self, request: &OrganizeRequest) -> OrganizeResult<RunReport> {
        let mut report = RunReport::new(request);

        if !request.has_operation() {
            info!("No operation to be performed");
            return Ok(report);
        }
        info!("Operation to be performed: {}", report.operation);

        debug!("Phase: {:?}", Phase::Enumerating);
        let entries = self
            .lister
            .list(&request.source_directory)
            .map_err(|source| OrganizeError::ListingFailed {
                path: request.source_directory.clone(),
                source,
            })?;

        debug!("Phase: {:?}", Phase::Classifying);
        let mut candidates = Vec::new();
        for entry in entries {
            let classification = classify(&entry, request);
            info!("{} {}", entry.path.display(), classification);
            if classification.is_included() {
                candidates.push(entry.path);
            } else {
                report.skipped.push(SkippedEntry {
                    path: entry.path,
                    classification,
                });
            }
        }

        if candidates.is_empty() {
            info!("Nothing to do");
            return Ok(report);
        }

        for path in candidates {
            let mut candidate_report = CandidateReport::new(&path);
            if let Err(e) = self.process(path, request, &mut candidate_report) {
                error!("{}", e);
                candidate_report.failed_at = Some(e.phase());
                candidate_report.error = Some(e.to_string());
            }
            report.candidates.push(candidate_report);
        }

        Ok(report)
    }

    fn process(
        &self,
        path: PathBuf,
        request: &OrganizeRequest,
        report: &mut CandidateReport,
    ) -> Result<(), CandidateError> {
        let mut candidate = CandidateFile::new(path)?;

        if request.rename {
            candidate = self.rename_in_place(candidate, request.dry_run, report)?;
            report.final_path = candidate.path.clone();
        }

        let folder = candidate.target_folder();
        let mut folder_ready = folder.is_dir();
        if request.create_folder {
            report.target_folder = Some(folder.clone());
            let outcome = materialize_folder(&folder, request.force, request.dry_run)?;
            report.folder = Some(outcome);
            folder_ready = true;
        }

        if request.move_files {
            let destination = move_into_folder(&candidate, &folder, folder_ready, request.dry_run)?;
            report.final_path = destination.clone();
            report.moved_to = Some(destination);
        }

        Ok(())
    }

    /// Renames the file under its own parent before its folder is derived.
    fn rename_in_place(
        &self,
        candidate: CandidateFile,
        dry_run: bool,
        report: &mut CandidateReport,
    ) -> Result<CandidateFile, CandidateError> {
        let outcome = self.renamer.rename(candidate.stem());
        let new_stem = outcome.name.clone();
        report.rename = Some(outcome);

        if new_stem == candidate.stem() {
            debug!("{} keeps its name", candidate.path.display());
            return Ok(candidate);
        }
        if new_stem.is_empty() {
            return Err(CandidateError::EmptyName {
                path: candidate.path,
            });
        }
        if new_stem.contains('/') || new_stem.contains(MAIN_SEPARATOR) || new_stem == ".." {
            return Err(CandidateError::InvalidName { name: new_stem });
        }

        let renamed = candidate.with_stem(&new_stem);
        if renamed.path.symlink_metadata().is_ok() {
            return Err(CandidateError::RenameTargetExists { path: renamed.path });
        }

        if !dry_run {
            fs::rename(&candidate.path, &renamed.path).map_err(|source| {
                CandidateError::RenameFailed {
                    from: candidate.path.clone(),
                    to: renamed.path.clone(),
                    source,
                }
            })?;
        }
        info!("File renamed: {}", renamed.file_name());
        report.renamed_to = Some(renamed.path.clone());
        Ok(renamed)
    }
}

/// Creates `folder` unless it already exists. Never deletes or replaces.
///
/// # Errors
///
/// Fails when something other than a directory occupies `folder`, or the
/// directory cannot be created.
pub fn materialize_folder(
    folder: &Path,
    force: bool,
    dry_run: bool,
) -> Result<FolderOutcome, CandidateError> {
    let create = |outcome: FolderOutcome| -> Result<FolderOutcome, CandidateError> {
        if !dry_run {
            fs::create_dir_all(folder).map_err(|source| {
                CandidateError::DirectoryCreationFailed {
                    path: folder.to_path_buf(),
                    source,
                }
            })?;
        }
        Ok(outcome)
    };

    if folder.symlink_metadata().is_err() {
        let outcome = create(FolderOutcome::Created)?;
        info!("New folder created: {}", folder.display());
        return Ok(outcome);
    }

    if !folder.is_dir() {
        return Err(CandidateError::TargetNotDirectory {
            path: folder.to_path_buf(),
        });
    }

    if force {
        let outcome = create(FolderOutcome::ForceCreated)?;
        info!("Force created folder: {}", folder.display());
        Ok(outcome)
    } else {
        info!("Folder already exists: {}", folder.display());
        Ok(FolderOutcome::AlreadyExists)
    }
}

/// Moves the candidate into `folder`, replacing a same-named file there.
fn move_into_folder(
    candidate: &CandidateFile,
    folder: &Path,
    folder_ready: bool,
    dry_run: bool,
) -> Result<PathBuf, CandidateError> {
    if !folder_ready {
        return Err(CandidateError::MissingTargetFolder {
            path: folder.to_path_buf(),
        });
    }

    let destination = folder.join(candidate.file_name());
    if destination.is_file() {
        warn!("Replacing existing file {}", destination.display());
    }

    if !dry_run {
        fs::rename(&candidate.path, &destination).map_err(|source| {
            CandidateError::FileMoveFailure {
                from: candidate.path.clone(),
                to: destination.clone(),
                source,
            }
        })?;
    }
    info!("File moved to: {}", destination.display());
    Ok(destination)
}
