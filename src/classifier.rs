//! Decides which directory entries are organized.
//!
//! Classification looks at names only, never at file contents. Checks run in
//! this order, with early termination:
//! 1. Directories are never candidates
//! 2. Reserved paths (archives, anything under a config marker) are skipped
//! 3. Extensions listed in the exclude filter are skipped
//! 4. Everything else is included
//!
//! The include filter does not narrow the selection unless
//! [`OrganizeRequest::strict_include`] is set: without it, a file whose
//! extension is not listed is still included, exactly like a listed one.

use crate::file_organizer::OrganizeRequest;
use crate::lister::ListedEntry;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Paths ending with this are never organized.
pub const ARCHIVE_SUFFIX: &str = ".jar";

/// Paths containing this are never organized.
pub const RESERVED_MARKER: &str = "config";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IncludeReason {
    /// The extension is listed in the include filter.
    MatchedInclude,
    /// No filter excluded the file.
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Directory,
    Include(IncludeReason),
    ExcludeReserved,
    ExcludeIgnoredExt,
    /// Only produced with a strict include filter.
    ExcludeNotIncluded,
}

impl Classification {
    pub fn is_included(&self) -> bool {
        matches!(self, Classification::Include(_))
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Classification::Directory => "is a directory, ignoring",
            Classification::Include(IncludeReason::MatchedInclude) => {
                "has an included extension, adding to the list"
            }
            Classification::Include(IncludeReason::Default) => "is a file, adding to the list",
            Classification::ExcludeReserved => "is reserved, skipping",
            Classification::ExcludeIgnoredExt => "has ignored extension, skipping",
            Classification::ExcludeNotIncluded => "does not have an included extension, skipping",
        };
        f.write_str(text)
    }
}

/// Splits a file name into stem and extension at the last `.`.
///
/// A leading dot (hidden files) or a trailing dot does not start an
/// extension.
///
/// ```
/// use foldify::classifier::split_name;
///
/// assert_eq!(split_name("Report2020.pdf"), ("Report2020", Some("pdf")));
/// assert_eq!(split_name("archive.tar.gz"), ("archive.tar", Some("gz")));
/// assert_eq!(split_name("README"), ("README", None));
/// assert_eq!(split_name(".bashrc"), (".bashrc", None));
/// ```
pub fn split_name(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < file_name.len() => {
            (&file_name[..idx], Some(&file_name[idx + 1..]))
        }
        _ => (file_name, None),
    }
}

/// The extension used for filtering; empty when there is none.
pub fn extension_of(path: &Path) -> String {
    path.file_name()
        .map(|name| {
            let name = name.to_string_lossy();
            split_name(&name).1.unwrap_or_default().to_string()
        })
        .unwrap_or_default()
}

/// True for archives and anything whose path mentions the reserved marker.
///
/// The whole listed path is checked, so every file of a directory whose
/// location mentions the marker is reserved.
pub fn is_reserved(path: &Path) -> bool {
    let text = path.to_string_lossy();
    text.ends_with(ARCHIVE_SUFFIX) || text.contains(RESERVED_MARKER)
}

/// `filter` lists extensions as free text; a non-empty extension matches
/// when it occurs anywhere in that text.
fn filter_mentions(filter: Option<&str>, extension: &str) -> bool {
    !extension.is_empty() && filter.is_some_and(|filter| filter.contains(extension))
}

/// Classifies one listed entry for the given request.
pub fn classify(entry: &ListedEntry, request: &OrganizeRequest) -> Classification {
    if entry.is_dir {
        return Classification::Directory;
    }

    if is_reserved(&entry.path) {
        return Classification::ExcludeReserved;
    }

    let extension = extension_of(&entry.path);
    if filter_mentions(request.ext_exclude.as_deref(), &extension) {
        return Classification::ExcludeIgnoredExt;
    }

    if filter_mentions(request.ext_include.as_deref(), &extension) {
        Classification::Include(IncludeReason::MatchedInclude)
    } else if request.strict_include && request.ext_include.is_some() {
        Classification::ExcludeNotIncluded
    } else {
        Classification::Include(IncludeReason::Default)
    }
}
