use std::{cmp::Ordering, fmt, str::FromStr};

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::data::{Row, Value, cell, to_number};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    Contains,
    Greater,
    Less,
    /// Any operator name this build does not know; always passes.
    #[serde(other)]
    Unknown,
}

impl FilterOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOperator::Equals => "equals",
            FilterOperator::NotEquals => "not_equals",
            FilterOperator::Contains => "contains",
            FilterOperator::Greater => "greater",
            FilterOperator::Less => "less",
            FilterOperator::Unknown => "unknown",
        }
    }
}

impl FromStr for FilterOperator {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "equals" | "=" | "==" => FilterOperator::Equals,
            "not_equals" | "!=" => FilterOperator::NotEquals,
            "contains" => FilterOperator::Contains,
            "greater" | ">" => FilterOperator::Greater,
            "less" | "<" => FilterOperator::Less,
            _ => FilterOperator::Unknown,
        })
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub column: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl FilterCondition {
    pub fn new(
        column: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn matches(&self, row: &Row) -> bool {
        let value = cell(row, &self.column);
        if value.is_null() {
            return false;
        }
        let needle = self.value.to_lowercase();
        match self.operator {
            FilterOperator::Equals => value.to_display_string().to_lowercase() == needle,
            FilterOperator::NotEquals => value.to_display_string().to_lowercase() != needle,
            FilterOperator::Contains => value.to_display_string().to_lowercase().contains(&needle),
            FilterOperator::Greater => compare_threshold(value, &needle) == Some(Ordering::Greater),
            FilterOperator::Less => compare_threshold(value, &needle) == Some(Ordering::Less),
            FilterOperator::Unknown => true,
        }
    }
}

impl fmt::Display for FilterCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?}", self.column, self.operator, self.value)
    }
}

/// Numbers compare numerically against the coerced threshold; everything
/// else compares its text case-sensitively by UTF-16 code unit.
fn compare_threshold(value: &Value, threshold: &str) -> Option<Ordering> {
    match value {
        Value::Number(n) => n.partial_cmp(&to_number(threshold)),
        other => Some(
            other
                .to_display_string()
                .encode_utf16()
                .cmp(threshold.encode_utf16()),
        ),
    }
}

/// Keeps the rows that satisfy every condition, in their original order.
pub fn apply_filters<'a, I>(rows: I, conditions: &[FilterCondition]) -> Vec<&'a Row>
where
    I: IntoIterator<Item = &'a Row>,
{
    rows.into_iter()
        .filter(|row| conditions.iter().all(|condition| condition.matches(row)))
        .collect()
}

pub fn parse_filters(filters: &[String]) -> Result<Vec<FilterCondition>> {
    filters.iter().map(|f| parse_filter(f)).collect()
}

/// Parses `column <op> value` where `<op>` is `contains`, `!=`, `=`, `>` or
/// `<`. Quotes around the value are stripped.
pub fn parse_filter(filter: &str) -> Result<FilterCondition> {
    let trimmed = filter.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Empty filter expression"));
    }

    let lowered = trimmed.to_ascii_lowercase();
    for (needle, op) in [
        (" not_equals ", FilterOperator::NotEquals),
        (" equals ", FilterOperator::Equals),
        (" contains ", FilterOperator::Contains),
        (" greater ", FilterOperator::Greater),
        (" less ", FilterOperator::Less),
    ] {
        if let Some(idx) = lowered.find(needle) {
            let (left, right_with_space) = trimmed.split_at(idx);
            let right = &right_with_space[needle.len()..];
            return condition(left, op, right);
        }
    }

    for needle in ["!=", "=", ">", "<"] {
        if let Some(idx) = trimmed.find(needle) {
            let Ok(op) = needle.parse::<FilterOperator>();
            return condition(&trimmed[..idx], op, &trimmed[idx + needle.len()..]);
        }
    }

    Err(anyhow!("Failed to parse filter expression '{trimmed}'"))
}

fn condition(column: &str, operator: FilterOperator, value: &str) -> Result<FilterCondition> {
    let column = column.trim();
    if column.is_empty() {
        return Err(anyhow!("Filter is missing a column name"));
    }
    Ok(FilterCondition::new(column, operator, unquote(value.trim())))
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        if (bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\'')
        {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn equals_and_contains_ignore_case() {
        let r = row(&[("name", Value::from("Alice"))]);
        assert!(FilterCondition::new("name", FilterOperator::Equals, "ALICE").matches(&r));
        assert!(FilterCondition::new("name", FilterOperator::Contains, "LIC").matches(&r));
        assert!(!FilterCondition::new("name", FilterOperator::NotEquals, "alice").matches(&r));
    }

    #[test]
    fn null_fails_every_operator() {
        let r = row(&[("x", Value::Null)]);
        for op in [
            FilterOperator::Equals,
            FilterOperator::NotEquals,
            FilterOperator::Contains,
            FilterOperator::Greater,
            FilterOperator::Less,
            FilterOperator::Unknown,
        ] {
            assert!(!FilterCondition::new("x", op, "1").matches(&r), "{op}");
            assert!(!FilterCondition::new("missing", op, "1").matches(&r), "{op}");
        }
    }

    #[test]
    fn numeric_thresholds_compare_numerically() {
        let r = row(&[("x", Value::from(9.0))]);
        assert!(!FilterCondition::new("x", FilterOperator::Greater, "10").matches(&r));
        assert!(FilterCondition::new("x", FilterOperator::Less, "10").matches(&r));
        assert!(!FilterCondition::new("x", FilterOperator::Less, "ten").matches(&r));
        assert!(!FilterCondition::new("x", FilterOperator::Greater, "ten").matches(&r));
    }

    #[test]
    fn string_thresholds_are_case_sensitive_against_lowered_value() {
        // "B" (0x42) is below "a" (0x61), and the filter text is lowered first.
        let r = row(&[("s", Value::from("B"))]);
        assert!(FilterCondition::new("s", FilterOperator::Less, "A").matches(&r));
        let r = row(&[("s", Value::from("b"))]);
        assert!(FilterCondition::new("s", FilterOperator::Greater, "A").matches(&r));
    }

    #[test]
    fn numbers_stringify_for_text_operators() {
        let r = row(&[("n", Value::from(1000.0))]);
        assert!(FilterCondition::new("n", FilterOperator::Equals, "1000").matches(&r));
        assert!(FilterCondition::new("n", FilterOperator::Contains, "00").matches(&r));
        let b = row(&[("b", Value::from(true))]);
        assert!(FilterCondition::new("b", FilterOperator::Equals, "TRUE").matches(&b));
    }

    #[test]
    fn unknown_operator_is_permissive() {
        let r = row(&[("x", Value::from("anything"))]);
        assert!(FilterCondition::new("x", FilterOperator::Unknown, "zzz").matches(&r));
        let parsed: FilterCondition =
            serde_json::from_str(r#"{"column":"x","operator":"starts_with","value":"a"}"#)
                .unwrap();
        assert_eq!(parsed.operator, FilterOperator::Unknown);
    }

    #[test]
    fn empty_conditions_keep_everything() {
        let rows = vec![row(&[("a", Value::from(1.0))]), row(&[])];
        let kept = apply_filters(&rows, &[]);
        assert_eq!(kept.len(), 2);
        assert!(std::ptr::eq(kept[0], &rows[0]));
    }

    #[test]
    fn parse_filter_supports_words_and_symbols() {
        let f = parse_filter("city contains 'New York'").unwrap();
        assert_eq!(f, FilterCondition::new("city", FilterOperator::Contains, "New York"));
        let f = parse_filter("amount>5").unwrap();
        assert_eq!(f.operator, FilterOperator::Greater);
        assert_eq!(f.value, "5");
        let f = parse_filter("status != \"shipped\"").unwrap();
        assert_eq!(f, FilterCondition::new("status", FilterOperator::NotEquals, "shipped"));
        let f = parse_filter("qty less 3").unwrap();
        assert_eq!(f.operator, FilterOperator::Less);
        assert!(parse_filter("  ").is_err());
        assert!(parse_filter("= 5").is_err());
        assert!(parse_filter("no operator here").is_err());
    }
}
