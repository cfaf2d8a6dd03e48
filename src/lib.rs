//! foldify - move every file of a directory into a folder named after it
//!
//! This library provides the pieces of that workflow: a rule-driven renaming
//! pipeline configured from a key-value rules file, name-based classification
//! of directory entries, and the organizer that renames files, creates their
//! folders and moves them in.

pub mod classifier;
pub mod cli;
pub mod date_pattern;
pub mod file_organizer;
pub mod lister;
pub mod output;
pub mod properties;
pub mod renamer;
pub mod rules;

pub use classifier::{Classification, classify};
pub use file_organizer::{FileOrganizer, OrganizeError, OrganizeRequest, RunReport};
pub use lister::{DirectoryLister, FsLister, ListedEntry, MemoryLister};
pub use properties::{ConfigError, RuleProperties};
pub use renamer::{RenameOutcome, Renamer};
pub use rules::RuleSet;

pub use cli::{Cli, run_cli};
