//! Rename rule configuration source.
//!
//! Rules are read once per run into a flat key-value map. Two file formats
//! are understood:
//! - Java-style `.properties` files (`key=value` per line)
//! - TOML files with a single top-level table
//!
//! # Configuration File Format
//!
//! ```toml
//! targetWords = ["Report", "_"]
//! replacementWords = ["Doc", " "]
//! prefix = "X_"
//! changeCase = "capitalize"
//! formatYear = true
//! yearFormat = "yy"
//! yearBetween = "1990-2000"
//! trimSpaces = true
//! ```
//!
//! The same rules as a properties file:
//!
//! ```text
//! targetWords=[Report,_]
//! replacementWords=[Doc, ]
//! prefix=X_
//! changeCase=capitalize
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while loading the rule configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    Io(String),
}

/// A single configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// Plain text, including bracketed lists written as text (`[a,b]`).
    Text(String),
    /// A list given natively by the source format.
    List(Vec<String>),
}

/// The flat key-value store rename rules are built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleProperties {
    values: BTreeMap<String, PropertyValue>,
    origin: Option<PathBuf>,
}

/// Legacy rules file location, relative to the working directory.
pub const LEGACY_RULES_PATH: &str = "config/renameRules.properties";

/// Name of the per-directory TOML rules file.
pub const LOCAL_RULES_FILE: &str = ".foldifyrc.toml";

impl RuleProperties {
    /// Load rule properties, with fallback through the usual locations.
    ///
    /// Attempts, in order:
    /// 1. `explicit`, if given
    /// 2. `config/renameRules.properties` in the current directory
    /// 3. `.foldifyrc.toml` in the current directory
    /// 4. `~/.config/foldify/rules.toml`
    ///
    /// Returns `Ok(None)` when no rules file exists anywhere.
    ///
    /// # Errors
    ///
    /// Returns an error if the file that was found (or explicitly given)
    /// cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Option<Self>, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_file(path).map(Some);
        }

        let mut candidates = vec![
            PathBuf::from(LEGACY_RULES_PATH),
            PathBuf::from(LOCAL_RULES_FILE),
        ];
        if let Ok(home) = std::env::var("HOME") {
            candidates.push(
                PathBuf::from(home)
                    .join(".config")
                    .join("foldify")
                    .join("rules.toml"),
            );
        }

        for candidate in candidates {
            if candidate.is_file() {
                return Self::load_from_file(&candidate).map(Some);
            }
            debug!("No rules file at {}", candidate.display());
        }

        Ok(None)
    }

    /// Load properties from a specific file, choosing the format by extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if the file does not exist,
    /// `ConfigError::Io` if it cannot be read and `ConfigError::ConfigInvalid`
    /// if a TOML file fails to parse.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let mut properties = if is_toml {
            Self::parse_toml(&content)?
        } else {
            Self::parse_properties(&content)
        };
        properties.origin = Some(path.to_path_buf());
        debug!(
            "Loaded {} rule properties from {}",
            properties.values.len(),
            path.display()
        );
        Ok(properties)
    }

    /// Parse `key=value` lines.
    ///
    /// Blank lines and lines starting with `#` or `!` are ignored. The key is
    /// everything before the first `=` or `:`; both sides are trimmed.
    /// Lines without a separator define the key with an empty value.
    pub fn parse_properties(content: &str) -> Self {
        let mut values = BTreeMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let (key, value) = match line.find(['=', ':']) {
                Some(idx) => (&line[..idx], &line[idx + 1..]),
                None => (line, ""),
            };
            values.insert(
                key.trim().to_string(),
                PropertyValue::Text(value.trim().to_string()),
            );
        }
        Self {
            values,
            origin: None,
        }
    }

    /// Parse a TOML document with a single top-level table.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigInvalid` on syntax errors, nested tables,
    /// or arrays holding anything other than strings.
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table =
            toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;

        let mut values = BTreeMap::new();
        for (key, value) in table {
            let converted = match value {
                toml::Value::String(s) => PropertyValue::Text(s),
                toml::Value::Boolean(b) => PropertyValue::Text(b.to_string()),
                toml::Value::Integer(i) => PropertyValue::Text(i.to_string()),
                toml::Value::Array(items) => PropertyValue::List(
                    items
                        .into_iter()
                        .map(|item| match item {
                            toml::Value::String(s) => Ok(s),
                            other => Err(ConfigError::ConfigInvalid(format!(
                                "'{}' must only contain strings, found {}",
                                key,
                                other.type_str()
                            ))),
                        })
                        .collect::<Result<Vec<_>, _>>()?,
                ),
                other => {
                    return Err(ConfigError::ConfigInvalid(format!(
                        "unsupported value for '{}': {}",
                        key,
                        other.type_str()
                    )));
                }
            };
            values.insert(key, converted);
        }

        Ok(Self {
            values,
            origin: None,
        })
    }

    /// Build properties from in-memory text pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), PropertyValue::Text(v.to_string())))
                .collect(),
            origin: None,
        }
    }

    /// Set a value, replacing any previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: PropertyValue) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.values.get(key)
    }

    /// Returns the value as text. Lists are not text.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(PropertyValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Interprets a boolean-as-string value; only `true` (any case) is true.
    pub fn flag(&self, key: &str) -> bool {
        self.text(key)
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
    }

    /// The file these properties were read from, if any.
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }
}
