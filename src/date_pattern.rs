//! Date-format patterns used by the year reformat and append-date stages.
//!
//! Legacy rule files use `SimpleDateFormat` letters
//! (`yy`, `dd-MM-yyyy`, `'FY'yy`). Those are translated to chrono strftime
//! items. A pattern containing `%` is taken as strftime already, so a
//! letter pattern cannot carry a literal `%`.
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use foldify::date_pattern::DatePattern;
//!
//! let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
//! let render = |pattern: &str| DatePattern::parse(pattern).unwrap().render(date);
//! assert_eq!(render("yy").as_deref(), Some("24"));
//! assert_eq!(render("dd-MM-yyyy").as_deref(), Some("07-03-2024"));
//! assert_eq!(render("%Y%m%d").as_deref(), Some("20240307"));
//! ```

use chrono::NaiveDate;
use chrono::format::{Item, StrftimeItems};
use std::fmt::{self, Write};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatePatternError {
    #[error("date pattern is empty")]
    Empty,
    #[error("unsupported pattern letter '{0}'")]
    UnsupportedLetter(char),
    #[error("unterminated quote in date pattern")]
    UnterminatedQuote,
    #[error("invalid strftime pattern '{0}'")]
    InvalidStrftime(String),
    /// The pattern asks for a time or zone field a calendar date lacks.
    #[error("pattern '{0}' needs fields a date does not have")]
    UnsupportedField(String),
}

/// A validated date pattern, stored as a strftime string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePattern {
    source: String,
    strftime: String,
}

impl DatePattern {
    /// Parse and validate a pattern.
    ///
    /// # Errors
    ///
    /// Returns an error for empty patterns, unknown pattern letters,
    /// unterminated quotes, strftime specifiers chrono does not know, and
    /// specifiers such as `%H` or `%Z` that a calendar date cannot fill.
    pub fn parse(pattern: &str) -> Result<Self, DatePatternError> {
        if pattern.is_empty() {
            return Err(DatePatternError::Empty);
        }

        let strftime = if pattern.contains('%') {
            pattern.to_string()
        } else {
            translate_letters(pattern)?
        };

        if StrftimeItems::new(&strftime).any(|item| matches!(item, Item::Error)) {
            return Err(DatePatternError::InvalidStrftime(strftime));
        }

        let parsed = Self {
            source: pattern.to_string(),
            strftime,
        };
        if parsed.render(sample_date()).is_none() {
            return Err(DatePatternError::UnsupportedField(parsed.strftime));
        }
        Ok(parsed)
    }

    /// Render `date`, or `None` if the pattern needs more than a date.
    pub fn render(&self, date: NaiveDate) -> Option<String> {
        let mut out = String::new();
        write!(out, "{}", date.format(&self.strftime)).ok()?;
        Some(out)
    }

    /// Render the first of January of `year`, or `None` if chrono cannot
    /// represent that year.
    pub fn render_year(&self, year: i32) -> Option<String> {
        NaiveDate::from_ymd_opt(year, 1, 1).and_then(|date| self.render(date))
    }

    pub fn as_strftime(&self) -> &str {
        &self.strftime
    }
}

impl fmt::Display for DatePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn sample_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default()
}

fn translate_letters(pattern: &str) -> Result<String, DatePatternError> {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.peek() == Some(&'\'') {
                chars.next();
                out.push('\'');
                continue;
            }
            let mut closed = false;
            while let Some(q) = chars.next() {
                if q == '\'' {
                    if chars.peek() == Some(&'\'') {
                        chars.next();
                        out.push('\'');
                        continue;
                    }
                    closed = true;
                    break;
                }
                out.push(q);
            }
            if !closed {
                return Err(DatePatternError::UnterminatedQuote);
            }
            continue;
        }

        if !c.is_ascii_alphabetic() {
            out.push(c);
            continue;
        }

        let mut run = 1;
        while chars.peek() == Some(&c) {
            chars.next();
            run += 1;
        }

        let specifier = match (c, run) {
            ('y' | 'u', 2) => "%y",
            ('y' | 'u', _) => "%Y",
            ('M' | 'L', 1) => "%-m",
            ('M' | 'L', 2) => "%m",
            ('M' | 'L', 3) => "%b",
            ('M' | 'L', _) => "%B",
            ('d', 1) => "%-d",
            ('d', _) => "%d",
            ('D', _) => "%j",
            ('E', 1..=3) => "%a",
            ('E', _) => "%A",
            _ => return Err(DatePatternError::UnsupportedLetter(c)),
        };
        out.push_str(specifier);
    }

    Ok(out)
}
