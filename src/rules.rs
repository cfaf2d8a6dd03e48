//! Parsed rename rules.
//!
//! A [`RuleSet`] is built once per run from [`RuleProperties`] and never
//! changes afterwards. Every optional field is wrapped in a [`Rule`] so that
//! a malformed value disables only its own rename stage and keeps the reason
//! around for reporting.

use crate::date_pattern::DatePattern;
use crate::properties::{PropertyValue, RuleProperties};

/// State of one configurable rename rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule<T> {
    /// Not configured, or switched off.
    Disabled,
    Enabled(T),
    /// Configured but unusable; the message says why.
    Invalid(String),
}

// Derived `Default` would require `T: Default`
impl<T> Default for Rule<T> {
    fn default() -> Self {
        Rule::Disabled
    }
}

impl<T> Rule<T> {
    pub fn enabled(&self) -> Option<&T> {
        match self {
            Rule::Enabled(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Rule::Invalid(_))
    }
}

/// One literal word replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub target: String,
    pub replacement: String,
}

impl Substitution {
    pub fn new(target: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            replacement: replacement.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseMode {
    #[default]
    None,
    Upper,
    Lower,
    /// Uppercase the first character of each whitespace-separated word.
    Capitalize,
}

/// Rewrites a four-digit year inside `low..=high` using `format`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearReformat {
    pub format: DatePattern,
    pub low: i32,
    pub high: i32,
}

impl YearReformat {
    pub fn contains(&self, year: i32) -> bool {
        (self.low..=self.high).contains(&year)
    }
}

/// Immutable rename configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleSet {
    pub substitutions: Rule<Vec<Substitution>>,
    pub suffix: Option<String>,
    pub prefix: Option<String>,
    pub case_mode: Rule<CaseMode>,
    pub year_reformat: Rule<YearReformat>,
    pub trim_spaces: bool,
    pub append_date: Rule<DatePattern>,
}

pub mod keys {
    pub const TARGET_WORDS: &str = "targetWords";
    pub const REPLACEMENT_WORDS: &str = "replacementWords";
    pub const SUFFIX: &str = "suffix";
    pub const PREFIX: &str = "prefix";
    pub const CHANGE_CASE: &str = "changeCase";
    pub const FORMAT_YEAR: &str = "formatYear";
    pub const YEAR_FORMAT: &str = "yearFormat";
    pub const YEAR_BETWEEN: &str = "yearBetween";
    pub const TRIM_SPACES: &str = "trimSpaces";
    pub const APPEND_DATE: &str = "appendDate";
    pub const DATE_FORMAT: &str = "dateFormat";
}

impl RuleSet {
    /// A rule set under which renaming returns its input unchanged.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Build a rule set from configuration properties.
    ///
    /// Never fails: each malformed field becomes [`Rule::Invalid`] and the
    /// rest of the rules still apply.
    pub fn from_properties(props: &RuleProperties) -> Self {
        Self {
            substitutions: parse_substitutions(props),
            suffix: non_empty(props.text(keys::SUFFIX)),
            prefix: non_empty(props.text(keys::PREFIX)),
            case_mode: parse_case_mode(props.text(keys::CHANGE_CASE)),
            year_reformat: parse_year_reformat(props),
            trim_spaces: props.flag(keys::TRIM_SPACES),
            append_date: parse_append_date(props),
        }
    }

    /// True when no stage would change a name.
    pub fn is_identity(&self) -> bool {
        let no_substitutions = match &self.substitutions {
            Rule::Enabled(pairs) => pairs.is_empty(),
            _ => true,
        };
        no_substitutions
            && self.suffix.is_none()
            && self.prefix.is_none()
            && !matches!(
                self.case_mode,
                Rule::Enabled(CaseMode::Upper | CaseMode::Lower | CaseMode::Capitalize)
            )
            && self.year_reformat.enabled().is_none()
            && !self.trim_spaces
            && self.append_date.enabled().is_none()
    }

    /// Messages for every field that failed to parse.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let fields: [(&str, Option<&str>); 4] = [
            ("substitutions", invalid_reason(&self.substitutions)),
            ("changeCase", invalid_reason(&self.case_mode)),
            ("formatYear", invalid_reason(&self.year_reformat)),
            ("appendDate", invalid_reason(&self.append_date)),
        ];
        for (field, reason) in fields {
            if let Some(reason) = reason {
                problems.push(format!("{}: {}", field, reason));
            }
        }
        problems
    }
}

fn invalid_reason<T>(rule: &Rule<T>) -> Option<&str> {
    match rule {
        Rule::Invalid(reason) => Some(reason),
        _ => None,
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Split a word list written as `[a,b,c]`, or take a native list as-is.
///
/// Entries are not trimmed: spaces around words are part of the words.
fn word_list(value: &PropertyValue) -> Vec<String> {
    match value {
        PropertyValue::List(items) => items.clone(),
        PropertyValue::Text(text) => {
            let stripped: String = text.chars().filter(|c| *c != '[' && *c != ']').collect();
            stripped.split(',').map(str::to_string).collect()
        }
    }
}

fn parse_substitutions(props: &RuleProperties) -> Rule<Vec<Substitution>> {
    let targets = props.get(keys::TARGET_WORDS).map(word_list);
    let replacements = props.get(keys::REPLACEMENT_WORDS).map(word_list);

    match (targets, replacements) {
        (None, None) => Rule::Disabled,
        (Some(_), None) => Rule::Invalid(format!(
            "{} is set but {} is missing",
            keys::TARGET_WORDS,
            keys::REPLACEMENT_WORDS
        )),
        (None, Some(_)) => Rule::Invalid(format!(
            "{} is set but {} is missing",
            keys::REPLACEMENT_WORDS,
            keys::TARGET_WORDS
        )),
        (Some(targets), Some(replacements)) => {
            if targets.len() != replacements.len() {
                return Rule::Invalid(format!(
                    "{} has {} entries but {} has {}",
                    keys::TARGET_WORDS,
                    targets.len(),
                    keys::REPLACEMENT_WORDS,
                    replacements.len()
                ));
            }
            // `[]` on both sides
            if targets.is_empty() || (targets.len() == 1 && targets[0].is_empty()) {
                return Rule::Disabled;
            }
            if let Some(position) = targets.iter().position(String::is_empty) {
                return Rule::Invalid(format!(
                    "{} entry {} is empty",
                    keys::TARGET_WORDS,
                    position + 1
                ));
            }
            Rule::Enabled(
                targets
                    .into_iter()
                    .zip(replacements)
                    .map(|(target, replacement)| Substitution {
                        target,
                        replacement,
                    })
                    .collect(),
            )
        }
    }
}

fn parse_case_mode(value: Option<&str>) -> Rule<CaseMode> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Rule::Disabled;
    };
    match value.to_ascii_lowercase().as_str() {
        "none" => Rule::Enabled(CaseMode::None),
        "upper" => Rule::Enabled(CaseMode::Upper),
        "lower" => Rule::Enabled(CaseMode::Lower),
        "capitalize" => Rule::Enabled(CaseMode::Capitalize),
        other => Rule::Invalid(format!(
            "unknown case mode '{}', expected upper, lower or capitalize",
            other
        )),
    }
}

/// Parse `"YYYY-YYYY"` into an inclusive range.
pub fn parse_year_range(value: &str) -> Result<(i32, i32), String> {
    let (low, high) = value
        .trim()
        .split_once('-')
        .ok_or_else(|| format!("year range '{}' is not of the form YYYY-YYYY", value))?;
    let low: i32 = low
        .trim()
        .parse()
        .map_err(|_| format!("invalid lower year '{}'", low.trim()))?;
    let high: i32 = high
        .trim()
        .parse()
        .map_err(|_| format!("invalid upper year '{}'", high.trim()))?;
    if low > high {
        return Err(format!("year range {}-{} is reversed", low, high));
    }
    Ok((low, high))
}

fn parse_year_reformat(props: &RuleProperties) -> Rule<YearReformat> {
    if !props.flag(keys::FORMAT_YEAR) {
        return Rule::Disabled;
    }

    let Some(format) = props.text(keys::YEAR_FORMAT) else {
        return Rule::Invalid(format!("{} is missing", keys::YEAR_FORMAT));
    };
    let format = match DatePattern::parse(format) {
        Ok(pattern) => pattern,
        Err(e) => return Rule::Invalid(format!("{}: {}", keys::YEAR_FORMAT, e)),
    };

    let Some(range) = props.text(keys::YEAR_BETWEEN) else {
        return Rule::Invalid(format!("{} is missing", keys::YEAR_BETWEEN));
    };
    match parse_year_range(range) {
        Ok((low, high)) => Rule::Enabled(YearReformat { format, low, high }),
        Err(reason) => Rule::Invalid(format!("{}: {}", keys::YEAR_BETWEEN, reason)),
    }
}

fn parse_append_date(props: &RuleProperties) -> Rule<DatePattern> {
    if !props.flag(keys::APPEND_DATE) {
        return Rule::Disabled;
    }
    match props.text(keys::DATE_FORMAT) {
        None => Rule::Invalid(format!("{} is missing", keys::DATE_FORMAT)),
        Some(format) => match DatePattern::parse(format) {
            Ok(pattern) => Rule::Enabled(pattern),
            Err(e) => Rule::Invalid(format!("{}: {}", keys::DATE_FORMAT, e)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_properties_give_identity() {
        let rules = RuleSet::from_properties(&RuleProperties::default());
        assert_eq!(rules, RuleSet::identity());
        assert!(rules.is_identity());
        assert!(rules.problems().is_empty());
    }

    #[test]
    fn test_bracketed_word_lists() {
        let props = RuleProperties::from_pairs([
            (keys::TARGET_WORDS, "[Report,_]"),
            (keys::REPLACEMENT_WORDS, "[Doc, ]"),
        ]);
        let rules = RuleSet::from_properties(&props);
        assert_eq!(
            rules.substitutions,
            Rule::Enabled(vec![
                Substitution::new("Report", "Doc"),
                Substitution::new("_", " "),
            ])
        );
    }

    #[test]
    fn test_native_lists_keep_commas() {
        let mut props = RuleProperties::default();
        props.insert(keys::TARGET_WORDS, PropertyValue::List(vec!["a,b".into()]));
        props.insert(keys::REPLACEMENT_WORDS, PropertyValue::List(vec!["c".into()]));
        let rules = RuleSet::from_properties(&props);
        assert_eq!(
            rules.substitutions,
            Rule::Enabled(vec![Substitution::new("a,b", "c")])
        );
    }

    #[test]
    fn test_mismatched_word_lists_are_invalid() {
        let props = RuleProperties::from_pairs([
            (keys::TARGET_WORDS, "[a,b]"),
            (keys::REPLACEMENT_WORDS, "[c]"),
            (keys::PREFIX, "X_"),
        ]);
        let rules = RuleSet::from_properties(&props);
        assert!(rules.substitutions.is_invalid());
        // Other rules are unaffected
        assert_eq!(rules.prefix.as_deref(), Some("X_"));
        assert_eq!(rules.problems().len(), 1);
    }

    #[test]
    fn test_one_sided_word_list_is_invalid() {
        let props = RuleProperties::from_pairs([(keys::TARGET_WORDS, "[a]")]);
        assert!(RuleSet::from_properties(&props).substitutions.is_invalid());
    }

    #[test]
    fn test_empty_target_word_is_invalid() {
        let props = RuleProperties::from_pairs([
            (keys::TARGET_WORDS, "[a,]"),
            (keys::REPLACEMENT_WORDS, "[b,c]"),
        ]);
        assert!(RuleSet::from_properties(&props).substitutions.is_invalid());
    }

    #[test]
    fn test_empty_brackets_disable_substitution() {
        let props = RuleProperties::from_pairs([
            (keys::TARGET_WORDS, "[]"),
            (keys::REPLACEMENT_WORDS, "[]"),
        ]);
        assert_eq!(
            RuleSet::from_properties(&props).substitutions,
            Rule::Disabled
        );
    }

    #[test]
    fn test_empty_replacement_deletes_word() {
        let props = RuleProperties::from_pairs([
            (keys::TARGET_WORDS, "[ - copy]"),
            (keys::REPLACEMENT_WORDS, "[]"),
        ]);
        assert_eq!(
            RuleSet::from_properties(&props).substitutions,
            Rule::Enabled(vec![Substitution::new(" - copy", "")])
        );
    }

    #[test]
    fn test_case_mode_parsing() {
        assert_eq!(parse_case_mode(None), Rule::Disabled);
        assert_eq!(parse_case_mode(Some("")), Rule::Disabled);
        assert_eq!(parse_case_mode(Some("UPPER")), Rule::Enabled(CaseMode::Upper));
        assert_eq!(parse_case_mode(Some("lower")), Rule::Enabled(CaseMode::Lower));
        assert_eq!(
            parse_case_mode(Some("capitalize")),
            Rule::Enabled(CaseMode::Capitalize)
        );
        assert!(parse_case_mode(Some("title")).is_invalid());
    }

    #[test]
    fn test_year_reformat_requires_flag() {
        let props = RuleProperties::from_pairs([
            (keys::FORMAT_YEAR, "false"),
            (keys::YEAR_FORMAT, "yy"),
            (keys::YEAR_BETWEEN, "1990-2000"),
        ]);
        assert_eq!(RuleSet::from_properties(&props).year_reformat, Rule::Disabled);
    }

    #[test]
    fn test_year_reformat_enabled() {
        let props = RuleProperties::from_pairs([
            (keys::FORMAT_YEAR, "true"),
            (keys::YEAR_FORMAT, "yy"),
            (keys::YEAR_BETWEEN, "1990-2000"),
        ]);
        let rules = RuleSet::from_properties(&props);
        let reformat = rules.year_reformat.enabled().expect("year reformat enabled");
        assert_eq!((reformat.low, reformat.high), (1990, 2000));
        assert!(reformat.contains(1990));
        assert!(reformat.contains(2000));
        assert!(!reformat.contains(2001));
    }

    #[test]
    fn test_year_reformat_invalid_fields() {
        let bad_range = RuleProperties::from_pairs([
            (keys::FORMAT_YEAR, "true"),
            (keys::YEAR_FORMAT, "yy"),
            (keys::YEAR_BETWEEN, "nineties"),
        ]);
        assert!(RuleSet::from_properties(&bad_range).year_reformat.is_invalid());

        let missing_format = RuleProperties::from_pairs([
            (keys::FORMAT_YEAR, "true"),
            (keys::YEAR_BETWEEN, "1990-2000"),
        ]);
        assert!(RuleSet::from_properties(&missing_format)
            .year_reformat
            .is_invalid());
    }

    #[test]
    fn test_parse_year_range() {
        assert_eq!(parse_year_range("1990-2000"), Ok((1990, 2000)));
        assert_eq!(parse_year_range(" 1990 - 2000 "), Ok((1990, 2000)));
        assert!(parse_year_range("2000-1990").is_err());
        assert!(parse_year_range("1990").is_err());
    }

    #[test]
    fn test_append_date_needs_valid_format() {
        let props = RuleProperties::from_pairs([
            (keys::APPEND_DATE, "true"),
            (keys::DATE_FORMAT, "HH:mm"),
        ]);
        assert!(RuleSet::from_properties(&props).append_date.is_invalid());

        let props = RuleProperties::from_pairs([
            (keys::APPEND_DATE, "true"),
            (keys::DATE_FORMAT, "_yyyyMMdd"),
        ]);
        assert!(RuleSet::from_properties(&props).append_date.enabled().is_some());
    }

    #[test]
    fn test_time_fields_make_date_rules_invalid() {
        let props = RuleProperties::from_pairs([
            (keys::APPEND_DATE, "true"),
            (keys::DATE_FORMAT, "_%H%M"),
            (keys::FORMAT_YEAR, "true"),
            (keys::YEAR_FORMAT, "%H"),
            (keys::YEAR_BETWEEN, "1990-2000"),
        ]);
        let rules = RuleSet::from_properties(&props);

        assert!(rules.append_date.is_invalid());
        assert!(rules.year_reformat.is_invalid());
        assert_eq!(rules.problems().len(), 2);
    }

    #[test]
    fn test_empty_affixes_are_ignored() {
        let props = RuleProperties::from_pairs([(keys::PREFIX, ""), (keys::SUFFIX, "_v2")]);
        let rules = RuleSet::from_properties(&props);
        assert_eq!(rules.prefix, None);
        assert_eq!(rules.suffix.as_deref(), Some("_v2"));
    }
}
