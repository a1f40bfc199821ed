//! Single-series chart data: one averaged value per category.

use serde::Serialize;

use crate::{
    data::{Row, cell},
    group::{GroupResult, partition},
};

pub const DEFAULT_GROUP_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub name: String,
    pub value: f64,
}

/// Columns whose first non-null value is a number.
pub fn numeric_columns<'a>(columns: &'a [String], rows: &[Row]) -> Vec<&'a str> {
    columns
        .iter()
        .filter(|column| {
            rows.iter()
                .map(|row| cell(row, column))
                .find(|value| !value.is_null())
                .is_some_and(|value| value.as_number().is_some())
        })
        .map(String::as_str)
        .collect()
}

/// Averages `y` per distinct `x`, keeping the first `limit` categories in
/// first-seen order. Cells that do not coerce to a number count as zero.
pub fn aggregate<'a, I>(rows: I, x: &str, y: &str, limit: usize) -> Vec<ChartPoint>
where
    I: IntoIterator<Item = &'a Row>,
{
    partition(rows, x)
        .into_iter()
        .take(limit)
        .map(|(name, rows)| {
            let sum: f64 = rows
                .iter()
                .map(|row| {
                    let n = cell(row, y).coerce_number();
                    if n.is_nan() { 0.0 } else { n }
                })
                .sum();
            ChartPoint {
                name,
                value: round2(sum / rows.len() as f64),
            }
        })
        .collect()
}

/// Maps group results to points using each group's mean of `column`.
pub fn series_from_groups(
    groups: &[GroupResult<'_>],
    column: &str,
    limit: usize,
) -> Vec<ChartPoint> {
    groups
        .iter()
        .take(limit)
        .map(|group| ChartPoint {
            name: group.key.clone(),
            value: round2(group.avg.get(column).copied().unwrap_or(0.0)),
        })
        .collect()
}

/// Rounds to two decimals, halves towards positive infinity.
pub fn round2(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data::Value, group::apply_group_by};

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn averages_per_category_with_loose_coercion() {
        let rows = vec![
            row(&[("city", "Oslo".into()), ("temp", 10.0.into())]),
            row(&[("city", "Oslo".into()), ("temp", "5".into())]),
            row(&[("city", "Oslo".into()), ("temp", "n/a".into())]),
            row(&[("city", "Rome".into()), ("temp", true.into())]),
            row(&[("temp", 3.0.into())]),
        ];
        let points = aggregate(&rows, "city", "temp", DEFAULT_GROUP_LIMIT);
        assert_eq!(
            points,
            vec![
                ChartPoint { name: "Oslo".into(), value: 5.0 },
                ChartPoint { name: "Rome".into(), value: 1.0 },
                ChartPoint { name: "Unknown".into(), value: 3.0 },
            ]
        );
    }

    #[test]
    fn caps_categories_and_rounds_to_cents() {
        let rows: Vec<Row> = (0..30)
            .map(|i| row(&[("k", Value::from(i as f64)), ("v", Value::from(1.0 / 3.0))]))
            .collect();
        let points = aggregate(&rows, "k", "v", DEFAULT_GROUP_LIMIT);
        assert_eq!(points.len(), 20);
        assert_eq!(points[0].value, 0.33);
        assert_eq!(round2(2.675), 2.67);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-1.005), -1.0);
    }

    #[test]
    fn numeric_columns_use_first_non_null_sample() {
        let columns = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let rows = vec![
            row(&[("a", Value::Null), ("b", "x".into())]),
            row(&[("a", 2.0.into()), ("b", 1.0.into())]),
        ];
        assert_eq!(numeric_columns(&columns, &rows), vec!["a"]);
    }

    #[test]
    fn series_from_groups_uses_group_means() {
        let rows = vec![
            row(&[("g", "A".into()), ("v", 1.0.into())]),
            row(&[("g", "A".into()), ("v", 2.0.into())]),
            row(&[("g", "B".into()), ("v", "x".into())]),
        ];
        let groups = apply_group_by(&rows, Some("g"));
        let points = series_from_groups(&groups, "v", DEFAULT_GROUP_LIMIT);
        assert_eq!(points[0], ChartPoint { name: "A".into(), value: 1.5 });
        assert_eq!(points[1], ChartPoint { name: "B".into(), value: 0.0 });
    }
}
