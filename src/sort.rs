use std::{cmp::Ordering, fmt, str::FromStr};

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::data::{Row, Value, cell};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(anyhow!("Unknown sort direction '{other}'")),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    pub column: String,
    pub direction: SortDirection,
}

impl SortConfig {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    /// Parses `column[:asc|desc]`. A suffix that is not a direction is kept
    /// as part of the column name.
    pub fn parse(directive: &str) -> Result<Self> {
        let trimmed = directive.trim();
        let (column, direction) = match trimmed.rsplit_once(':') {
            Some((column, suffix)) => match suffix.parse::<SortDirection>() {
                Ok(direction) => (column.trim(), direction),
                Err(_) => (trimmed, SortDirection::Asc),
            },
            None => (trimmed, SortDirection::Asc),
        };
        if column.is_empty() {
            return Err(anyhow!("Sort directive '{directive}' is missing a column"));
        }
        Ok(Self::new(column, direction))
    }

    /// Header-click cycle for `column`: unsorted → asc → desc → unsorted.
    pub fn cycle(current: Option<&SortConfig>, column: &str) -> Option<SortConfig> {
        match current {
            Some(sort) if sort.column == column => match sort.direction {
                SortDirection::Asc => Some(SortConfig::new(column, SortDirection::Desc)),
                SortDirection::Desc => None,
            },
            _ => Some(SortConfig::new(column, SortDirection::Asc)),
        }
    }
}

impl fmt::Display for SortConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.column, self.direction)
    }
}

/// Orders two cells. Nulls always go last; `direction` only flips the
/// order between two non-null values.
pub fn compare_values(a: &Value, b: &Value, direction: SortDirection) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    if a.is_null() {
        return Ordering::Greater;
    }
    if b.is_null() {
        return Ordering::Less;
    }
    let ordering = match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        _ => locale_compare(&a.to_display_string(), &b.to_display_string()),
    };
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// Root-locale style string ordering: letters compare case-insensitively
/// first, lowercase precedes uppercase on ties, then code points decide.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let folded_a = a.chars().flat_map(char::to_lowercase);
    let folded_b = b.chars().flat_map(char::to_lowercase);
    folded_a
        .cmp(folded_b)
        .then_with(|| a.chars().map(case_rank).cmp(b.chars().map(case_rank)))
        .then_with(|| a.cmp(b))
}

fn case_rank(ch: char) -> u8 {
    u8::from(ch.is_uppercase())
}

/// Returns a newly ordered sequence; `rows` is left untouched. `None` keeps
/// the input order.
pub fn apply_sort<'a, I>(rows: I, sort: Option<&SortConfig>) -> Vec<&'a Row>
where
    I: IntoIterator<Item = &'a Row>,
{
    let mut sorted: Vec<&'a Row> = rows.into_iter().collect();
    if let Some(sort) = sort {
        stable_merge_sort(&mut sorted, &mut |a: &&Row, b: &&Row| {
            compare_values(cell(a, &sort.column), cell(b, &sort.column), sort.direction)
        });
    }
    sorted
}

// slice::sort_by may panic when the comparator is not a total order, which
// mixed number/text columns produce.
fn stable_merge_sort<T, F>(items: &mut [T], compare: &mut F)
where
    T: Copy,
    F: FnMut(&T, &T) -> Ordering,
{
    let len = items.len();
    if len < 2 {
        return;
    }
    let mid = len / 2;
    stable_merge_sort(&mut items[..mid], compare);
    stable_merge_sort(&mut items[mid..], compare);
    if compare(&items[mid], &items[mid - 1]) != Ordering::Less {
        return;
    }

    let mut merged = Vec::with_capacity(len);
    let (mut left, mut right) = (0, mid);
    while left < mid && right < len {
        if compare(&items[right], &items[left]) == Ordering::Less {
            merged.push(items[right]);
            right += 1;
        } else {
            merged.push(items[left]);
            left += 1;
        }
    }
    merged.extend_from_slice(&items[left..mid]);
    merged.extend_from_slice(&items[right..]);
    items.copy_from_slice(&merged);
}
