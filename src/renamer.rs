//! Rule-driven filename transformation.
//!
//! A name (without its extension) is passed through a fixed sequence of
//! stages. Each stage reads one field of the [`RuleSet`]; a disabled or
//! invalid field skips the stage and never aborts the rename.
//!
//! # Examples
//!
//! ```
//! use foldify::properties::RuleProperties;
//! use foldify::renamer::Renamer;
//! use foldify::rules::RuleSet;
//!
//! let props = RuleProperties::from_pairs([
//!     ("targetWords", "[Report]"),
//!     ("replacementWords", "[Doc]"),
//!     ("prefix", "X_"),
//! ]);
//! let rules = RuleSet::from_properties(&props);
//! assert_eq!(Renamer::new(&rules).rename("Report2020").name, "X_Doc2020");
//! ```

use crate::date_pattern::DatePattern;
use crate::rules::{CaseMode, Rule, RuleSet, Substitution, YearReformat};
use chrono::{Local, NaiveDate};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, warn};

static YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{4}").expect("year pattern is valid"));

/// The rename stages, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Substitute,
    Suffix,
    Prefix,
    Case,
    YearReformat,
    Trim,
    AppendDate,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Substitute,
        Stage::Suffix,
        Stage::Prefix,
        Stage::Case,
        Stage::YearReformat,
        Stage::Trim,
        Stage::AppendDate,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Substitute => "substitute",
            Stage::Suffix => "suffix",
            Stage::Prefix => "prefix",
            Stage::Case => "case",
            Stage::YearReformat => "year reformat",
            Stage::Trim => "trim",
            Stage::AppendDate => "append date",
        };
        f.write_str(name)
    }
}

/// Why a stage did not run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    Disabled,
    /// The rule is configured but malformed.
    Invalid(String),
    /// The rule is valid but nothing in the name qualified.
    NoMatch(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum StageOutcome {
    /// The stage ran and produced this new name.
    Applied(String),
    /// The stage ran without changing the name.
    Unchanged,
    Skipped(SkipReason),
}

impl StageOutcome {
    fn from_change(before: &str, after: String) -> Self {
        if before == after {
            StageOutcome::Unchanged
        } else {
            StageOutcome::Applied(after)
        }
    }

    fn disabled() -> Self {
        StageOutcome::Skipped(SkipReason::Disabled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub outcome: StageOutcome,
}

/// Result of renaming one name: the final text plus what every stage did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameOutcome {
    pub name: String,
    pub trace: Vec<StageRecord>,
}

impl RenameOutcome {
    pub fn outcome_of(&self, stage: Stage) -> Option<&StageOutcome> {
        self.trace
            .iter()
            .find(|record| record.stage == stage)
            .map(|record| &record.outcome)
    }

    pub fn skip_reason(&self, stage: Stage) -> Option<&SkipReason> {
        match self.outcome_of(stage) {
            Some(StageOutcome::Skipped(reason)) => Some(reason),
            _ => None,
        }
    }

    /// Stages that actually changed the name.
    pub fn applied_stages(&self) -> Vec<Stage> {
        self.trace
            .iter()
            .filter(|record| matches!(record.outcome, StageOutcome::Applied(_)))
            .map(|record| record.stage)
            .collect()
    }
}

/// Applies a [`RuleSet`] to bare file names.
#[derive(Debug, Clone)]
pub struct Renamer<'a> {
    rules: &'a RuleSet,
    today: NaiveDate,
}

impl<'a> Renamer<'a> {
    /// Creates a renamer that appends today's local date when asked to.
    pub fn new(rules: &'a RuleSet) -> Self {
        Self::with_today(rules, Local::now().date_naive())
    }

    /// Creates a renamer with a fixed "today".
    pub fn with_today(rules: &'a RuleSet, today: NaiveDate) -> Self {
        Self { rules, today }
    }

    /// Runs every stage over `name`, which must not include the extension.
    pub fn rename(&self, name: &str) -> RenameOutcome {
        let mut current = name.to_string();
        let mut trace = Vec::with_capacity(Stage::ALL.len());

        for stage in Stage::ALL {
            let outcome = self.run_stage(stage, &current);
            match &outcome {
                StageOutcome::Applied(next) => {
                    debug!("{} stage: '{}' -> '{}'", stage, current, next);
                    current = next.clone();
                }
                StageOutcome::Skipped(SkipReason::Invalid(reason)) => {
                    warn!("Skipping {} stage for '{}': {}", stage, name, reason);
                }
                _ => {}
            }
            trace.push(StageRecord { stage, outcome });
        }

        RenameOutcome {
            name: current,
            trace,
        }
    }

    fn run_stage(&self, stage: Stage, name: &str) -> StageOutcome {
        match stage {
            Stage::Substitute => substitute(name, &self.rules.substitutions),
            Stage::Suffix => append_suffix(name, self.rules.suffix.as_deref()),
            Stage::Prefix => prepend_prefix(name, self.rules.prefix.as_deref()),
            Stage::Case => change_case(name, &self.rules.case_mode),
            Stage::YearReformat => reformat_year(name, &self.rules.year_reformat),
            Stage::Trim => trim_spaces(name, self.rules.trim_spaces),
            Stage::AppendDate => append_date(name, &self.rules.append_date, self.today),
        }
    }
}

/// Replaces every literal occurrence of each target, pair by pair.
///
/// Later pairs see the output of earlier ones.
pub fn substitute(name: &str, rule: &Rule<Vec<Substitution>>) -> StageOutcome {
    match rule {
        Rule::Disabled => StageOutcome::disabled(),
        Rule::Invalid(reason) => StageOutcome::Skipped(SkipReason::Invalid(reason.clone())),
        Rule::Enabled(pairs) => {
            let replaced = pairs.iter().fold(name.to_string(), |acc, pair| {
                acc.replace(&pair.target, &pair.replacement)
            });
            StageOutcome::from_change(name, replaced)
        }
    }
}

pub fn append_suffix(name: &str, suffix: Option<&str>) -> StageOutcome {
    match suffix {
        Some(suffix) => StageOutcome::from_change(name, format!("{}{}", name, suffix)),
        None => StageOutcome::disabled(),
    }
}

pub fn prepend_prefix(name: &str, prefix: Option<&str>) -> StageOutcome {
    match prefix {
        Some(prefix) => StageOutcome::from_change(name, format!("{}{}", prefix, name)),
        None => StageOutcome::disabled(),
    }
}

pub fn change_case(name: &str, rule: &Rule<CaseMode>) -> StageOutcome {
    let mode = match rule {
        Rule::Disabled | Rule::Enabled(CaseMode::None) => return StageOutcome::disabled(),
        Rule::Invalid(reason) => {
            return StageOutcome::Skipped(SkipReason::Invalid(reason.clone()));
        }
        Rule::Enabled(mode) => *mode,
    };

    let changed = match mode {
        CaseMode::Upper => name.to_uppercase(),
        CaseMode::Lower => name.to_lowercase(),
        CaseMode::Capitalize => capitalize_words(name),
        CaseMode::None => name.to_string(),
    };
    StageOutcome::from_change(name, changed)
}

/// Uppercases the first character of each word and joins words with single
/// spaces, collapsing any other whitespace.
fn capitalize_words(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rewrites the first four-digit run when it is a year inside the range.
pub fn reformat_year(name: &str, rule: &Rule<YearReformat>) -> StageOutcome {
    let reformat = match rule {
        Rule::Disabled => return StageOutcome::disabled(),
        Rule::Invalid(reason) => {
            return StageOutcome::Skipped(SkipReason::Invalid(reason.clone()));
        }
        Rule::Enabled(reformat) => reformat,
    };

    let Some(found) = YEAR_PATTERN.find(name) else {
        return StageOutcome::Skipped(SkipReason::NoMatch("no four-digit year".to_string()));
    };
    let Ok(year) = found.as_str().parse::<i32>() else {
        return StageOutcome::Skipped(SkipReason::NoMatch(format!(
            "'{}' is not a year",
            found.as_str()
        )));
    };
    if !reformat.contains(year) {
        return StageOutcome::Skipped(SkipReason::NoMatch(format!(
            "year {} outside {}-{}",
            year, reformat.low, reformat.high
        )));
    }
    let Some(rendered) = reformat.format.render_year(year) else {
        return StageOutcome::Skipped(SkipReason::NoMatch(format!(
            "year {} cannot be formatted",
            year
        )));
    };

    let mut out = String::with_capacity(name.len() + rendered.len());
    out.push_str(&name[..found.start()]);
    out.push_str(&rendered);
    out.push_str(&name[found.end()..]);
    StageOutcome::from_change(name, out)
}

pub fn trim_spaces(name: &str, enabled: bool) -> StageOutcome {
    if enabled {
        StageOutcome::from_change(name, name.trim().to_string())
    } else {
        StageOutcome::disabled()
    }
}

pub fn append_date(name: &str, rule: &Rule<DatePattern>, today: NaiveDate) -> StageOutcome {
    match rule {
        Rule::Disabled => StageOutcome::disabled(),
        Rule::Invalid(reason) => StageOutcome::Skipped(SkipReason::Invalid(reason.clone())),
        Rule::Enabled(pattern) => match pattern.render(today) {
            Some(date) => StageOutcome::from_change(name, format!("{}{}", name, date)),
            None => StageOutcome::Skipped(SkipReason::Invalid(format!(
                "cannot render date with '{}'",
                pattern
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::RuleProperties;
    use crate::rules::keys;

    fn rules_from(pairs: &[(&str, &str)]) -> RuleSet {
        RuleSet::from_properties(&RuleProperties::from_pairs(pairs.iter().copied()))
    }

    fn fixed_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
    }

    #[test]
    fn test_identity_rules_return_input() {
        let rules = RuleSet::identity();
        let renamer = Renamer::with_today(&rules, fixed_day());
        for name in ["", "plain", "  spaced  name ", "Trip 1999", "ünïcödé"] {
            let outcome = renamer.rename(name);
            assert_eq!(outcome.name, name);
            assert!(outcome.applied_stages().is_empty());
        }
    }

    #[test]
    fn test_substitutions_are_chained() {
        let rules = rules_from(&[
            (keys::TARGET_WORDS, "[a,b]"),
            (keys::REPLACEMENT_WORDS, "[b,c]"),
        ]);
        assert_eq!(Renamer::new(&rules).rename("a").name, "c");
    }

    #[test]
    fn test_substitution_is_literal_not_regex() {
        let rules = rules_from(&[
            (keys::TARGET_WORDS, "[.*]"),
            (keys::REPLACEMENT_WORDS, "[_]"),
        ]);
        assert_eq!(Renamer::new(&rules).rename("a.*b.*").name, "a_b_");
        assert_eq!(Renamer::new(&rules).rename("abc").name, "abc");
    }

    #[test]
    fn test_invalid_substitution_skips_only_that_stage() {
        let rules = rules_from(&[
            (keys::TARGET_WORDS, "[a,b]"),
            (keys::REPLACEMENT_WORDS, "[c]"),
            (keys::PREFIX, "X_"),
        ]);
        let outcome = Renamer::new(&rules).rename("ab");

        assert_eq!(outcome.name, "X_ab");
        assert!(matches!(
            outcome.skip_reason(Stage::Substitute),
            Some(SkipReason::Invalid(_))
        ));
    }

    #[test]
    fn test_prefix_ends_up_leftmost_and_suffix_rightmost() {
        let rules = rules_from(&[(keys::PREFIX, "pre-"), (keys::SUFFIX, "-post")]);
        assert_eq!(Renamer::new(&rules).rename("name").name, "pre-name-post");
    }

    #[test]
    fn test_upper_case_is_idempotent() {
        let rules = rules_from(&[(keys::CHANGE_CASE, "upper")]);
        let renamer = Renamer::new(&rules);
        let once = renamer.rename("Mixed case Straße").name;
        let twice = renamer.rename(&once).name;
        assert_eq!(once, twice);
        assert_eq!(once, "MIXED CASE STRASSE");
    }

    #[test]
    fn test_lower_case() {
        let rules = rules_from(&[(keys::CHANGE_CASE, "lower")]);
        assert_eq!(Renamer::new(&rules).rename("My FILE").name, "my file");
    }

    #[test]
    fn test_capitalize_keeps_rest_of_word_and_collapses_spaces() {
        let rules = rules_from(&[(keys::CHANGE_CASE, "capitalize")]);
        assert_eq!(
            Renamer::new(&rules).rename("the  quick\tbROWN fox").name,
            "The Quick BROWN Fox"
        );
    }

    #[test]
    fn test_case_affects_affixes() {
        let rules = rules_from(&[(keys::PREFIX, "x_"), (keys::CHANGE_CASE, "upper")]);
        assert_eq!(Renamer::new(&rules).rename("doc").name, "X_DOC");
    }

    #[test]
    fn test_year_reformat_inside_range() {
        let rules = rules_from(&[
            (keys::FORMAT_YEAR, "true"),
            (keys::YEAR_FORMAT, "yy"),
            (keys::YEAR_BETWEEN, "1990-2000"),
        ]);
        assert_eq!(Renamer::new(&rules).rename("trip1999").name, "trip99");
    }

    #[test]
    fn test_year_reformat_outside_range_is_unchanged() {
        let rules = rules_from(&[
            (keys::FORMAT_YEAR, "true"),
            (keys::YEAR_FORMAT, "yy"),
            (keys::YEAR_BETWEEN, "1990-2000"),
        ]);
        let outcome = Renamer::new(&rules).rename("trip2005");
        assert_eq!(outcome.name, "trip2005");
        assert!(matches!(
            outcome.skip_reason(Stage::YearReformat),
            Some(SkipReason::NoMatch(_))
        ));
    }

    #[test]
    fn test_year_reformat_replaces_only_first_run() {
        let rules = rules_from(&[
            (keys::FORMAT_YEAR, "true"),
            (keys::YEAR_FORMAT, "'FY'yy"),
            (keys::YEAR_BETWEEN, "1900-2100"),
        ]);
        assert_eq!(
            Renamer::new(&rules).rename("1998 to 2004").name,
            "FY98 to 2004"
        );
    }

    #[test]
    fn test_year_reformat_uses_leftmost_four_digits_of_longer_run() {
        let rule = Rule::Enabled(YearReformat {
            format: DatePattern::parse("yy").unwrap(),
            low: 1000,
            high: 9999,
        });
        assert_eq!(
            reformat_year("id123456", &rule),
            StageOutcome::Applied("id3456".to_string())
        );
    }

    #[test]
    fn test_year_reformat_without_digits() {
        let rule = Rule::Enabled(YearReformat {
            format: DatePattern::parse("yy").unwrap(),
            low: 1990,
            high: 2000,
        });
        assert!(matches!(
            reformat_year("no year here", &rule),
            StageOutcome::Skipped(SkipReason::NoMatch(_))
        ));
    }

    #[test]
    fn test_trim_spaces() {
        let rules = rules_from(&[(keys::TRIM_SPACES, "true"), (keys::SUFFIX, "  ")]);
        assert_eq!(Renamer::new(&rules).rename("  padded").name, "padded");
    }

    #[test]
    fn test_append_date_uses_given_day() {
        let rules = rules_from(&[
            (keys::APPEND_DATE, "true"),
            (keys::DATE_FORMAT, "_yyyyMMdd"),
        ]);
        let renamer = Renamer::with_today(&rules, fixed_day());
        assert_eq!(renamer.rename("notes").name, "notes_20240307");
    }

    #[test]
    fn test_append_date_runs_after_trim() {
        let rules = rules_from(&[
            (keys::TRIM_SPACES, "true"),
            (keys::APPEND_DATE, "true"),
            (keys::DATE_FORMAT, "' 'yyyy"),
        ]);
        let renamer = Renamer::with_today(&rules, fixed_day());
        assert_eq!(renamer.rename(" notes ").name, "notes 2024");
    }

    #[test]
    fn test_time_field_in_date_format_skips_append_date() {
        let rules = rules_from(&[
            (keys::PREFIX, "X_"),
            (keys::TRIM_SPACES, "true"),
            (keys::APPEND_DATE, "true"),
            (keys::DATE_FORMAT, "_%H%M"),
        ]);
        let outcome = Renamer::with_today(&rules, fixed_day()).rename("notes ");

        assert_eq!(outcome.name, "X_notes");
        assert!(matches!(
            outcome.skip_reason(Stage::AppendDate),
            Some(SkipReason::Invalid(_))
        ));
        assert_eq!(outcome.applied_stages(), vec![Stage::Prefix, Stage::Trim]);
    }

    #[test]
    fn test_time_field_in_year_format_skips_year_reformat() {
        let rules = rules_from(&[
            (keys::CHANGE_CASE, "upper"),
            (keys::FORMAT_YEAR, "true"),
            (keys::YEAR_FORMAT, "%H"),
            (keys::YEAR_BETWEEN, "1990-2000"),
        ]);
        let outcome = Renamer::new(&rules).rename("trip1999");

        assert_eq!(outcome.name, "TRIP1999");
        assert!(matches!(
            outcome.skip_reason(Stage::YearReformat),
            Some(SkipReason::Invalid(_))
        ));
    }

    #[test]
    fn test_trace_covers_every_stage_in_order() {
        let rules = rules_from(&[(keys::PREFIX, "X_")]);
        let outcome = Renamer::new(&rules).rename("a");
        let stages: Vec<Stage> = outcome.trace.iter().map(|r| r.stage).collect();
        assert_eq!(stages, Stage::ALL.to_vec());
        assert_eq!(outcome.applied_stages(), vec![Stage::Prefix]);
        assert_eq!(
            outcome.skip_reason(Stage::Suffix),
            Some(&SkipReason::Disabled)
        );
    }

    #[test]
    fn test_stage_reports_unchanged_when_nothing_matches() {
        let rule = Rule::Enabled(vec![Substitution::new("zzz", "y")]);
        assert_eq!(substitute("abc", &rule), StageOutcome::Unchanged);
    }
}
