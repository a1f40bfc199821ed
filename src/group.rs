//! Group-by aggregation for summary views.
//!
//! Rows are partitioned by the stringified value of one column, keeping the
//! order in which each key is first seen. Every partition reports its row
//! count plus a sum and mean for the columns that are numeric *in the
//! partition's first row*. Columns that only turn numeric further down are
//! not aggregated.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::data::{Row, Value, cell};

pub const ALL_DATA_KEY: &str = "All Data";
pub const UNKNOWN_KEY: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupResult<'a> {
    pub key: String,
    pub count: usize,
    pub sum: BTreeMap<String, f64>,
    pub avg: BTreeMap<String, f64>,
    pub rows: Vec<&'a Row>,
}

/// Stringified partition key; nulls and missing cells fall into `Unknown`.
pub fn group_key(value: &Value) -> String {
    match value {
        Value::Null => UNKNOWN_KEY.to_string(),
        other => other.to_display_string(),
    }
}

/// Partitions `rows` into keyed groups in first-seen order, preserving row
/// order inside each group.
pub(crate) fn partition<'a, I>(rows: I, column: &str) -> Vec<(String, Vec<&'a Row>)>
where
    I: IntoIterator<Item = &'a Row>,
{
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&'a Row>)> = Vec::new();
    for row in rows {
        let key = group_key(cell(row, column));
        match positions.get(&key) {
            Some(&idx) => groups[idx].1.push(row),
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push((key, vec![row]));
            }
        }
    }
    groups
}

pub fn apply_group_by<'a, I>(rows: I, group_by: Option<&str>) -> Vec<GroupResult<'a>>
where
    I: IntoIterator<Item = &'a Row>,
{
    let Some(column) = group_by else {
        let rows: Vec<&'a Row> = rows.into_iter().collect();
        return vec![GroupResult {
            key: ALL_DATA_KEY.to_string(),
            count: rows.len(),
            sum: BTreeMap::new(),
            avg: BTreeMap::new(),
            rows,
        }];
    };

    partition(rows, column)
        .into_iter()
        .map(|(key, rows)| summarize(key, rows))
        .collect()
}

fn summarize(key: String, rows: Vec<&Row>) -> GroupResult<'_> {
    let numeric_columns: Vec<&String> = rows
        .first()
        .map(|first| {
            first
                .iter()
                .filter(|(_, value)| matches!(value, Value::Number(_)))
                .map(|(column, _)| column)
                .collect()
        })
        .unwrap_or_default();

    let mut sum = BTreeMap::new();
    let mut avg = BTreeMap::new();
    for column in numeric_columns {
        let (total, seen) = rows
            .iter()
            .filter_map(|row| cell(row, column).as_number())
            .fold((0.0, 0usize), |(total, seen), n| (total + n, seen + 1));
        let mean = if seen > 0 { total / seen as f64 } else { 0.0 };
        sum.insert(column.clone(), total);
        avg.insert(column.clone(), mean);
    }

    GroupResult {
        key,
        count: rows.len(),
        sum,
        avg,
        rows,
    }
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
    fn groups_sum_and_average_numeric_columns() {
        let rows = vec![
            row(&[("g", "A".into()), ("v", 10.0.into())]),
            row(&[("g", "A".into()), ("v", 20.0.into())]),
            row(&[("g", "B".into()), ("v", 5.0.into())]),
        ];
        let groups = apply_group_by(&rows, Some("g"));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "A");
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[0].sum["v"], 30.0);
        assert_eq!(groups[0].avg["v"], 15.0);
        assert_eq!(groups[1].key, "B");
        assert_eq!(groups[1].sum["v"], 5.0);
        assert_eq!(groups[1].avg["v"], 5.0);
        assert!(!groups[0].sum.contains_key("g"));
    }

    #[test]
    fn no_group_column_yields_single_all_data_group() {
        let rows = vec![row(&[("v", 1.0.into())]), row(&[("v", 2.0.into())])];
        let groups = apply_group_by(&rows, None);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, ALL_DATA_KEY);
        assert_eq!(groups[0].count, 2);
        assert!(groups[0].sum.is_empty());
        assert!(groups[0].avg.is_empty());
    }

    #[test]
    fn empty_input_groups_gracefully() {
        let rows: Vec<Row> = Vec::new();
        assert!(apply_group_by(&rows, Some("g")).is_empty());
        let all = apply_group_by(&rows, None);
        assert_eq!(all[0].count, 0);
    }

    #[test]
    fn null_keys_fall_into_unknown_in_first_seen_order() {
        let rows = vec![
            row(&[("g", "B".into())]),
            row(&[("g", Value::Null)]),
            row(&[]),
            row(&[("g", 1.0.into())]),
            row(&[("g", "B".into())]),
        ];
        let keys: Vec<(String, usize)> = apply_group_by(&rows, Some("g"))
            .into_iter()
            .map(|g| (g.key, g.count))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("B".to_string(), 2),
                (UNKNOWN_KEY.to_string(), 2),
                ("1".to_string(), 1)
            ]
        );
    }

    #[test]
    fn numeric_columns_come_from_first_row_only() {
        let rows = vec![
            row(&[("g", "A".into()), ("v", "n/a".into()), ("w", 1.0.into())]),
            row(&[("g", "A".into()), ("v", 7.0.into()), ("w", "x".into())]),
            row(&[("g", "A".into()), ("v", 3.0.into()), ("w", 4.0.into())]),
        ];
        let groups = apply_group_by(&rows, Some("g"));
        assert!(!groups[0].sum.contains_key("v"));
        assert_eq!(groups[0].sum["w"], 5.0);
        assert_eq!(groups[0].avg["w"], 2.5);
    }
}
