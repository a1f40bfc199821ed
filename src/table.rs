//! Plain-text rendering of table pages, group summaries and chart series.

use std::{borrow::Cow, fmt::Write as _};

use itertools::Itertools;

use crate::{
    chart::ChartPoint,
    data::{Row, Value, cell},
    group::GroupResult,
    pagination::Page,
};

const NULL_CELL: &str = "-";
const BAR_WIDTH: usize = 40;

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| display_width(h).max(3)).collect_vec();
    for row in rows {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(display_width(value));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let separator = widths.iter().map(|w| "-".repeat(*w)).collect_vec();
    let _ = writeln!(output, "{}", format_row(&separator, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

/// Renders one page of rows followed by its range and page footer. With
/// `filtered_from`, the footer also names the unfiltered row count.
pub fn render_page(
    columns: &[String],
    page: &Page<'_, &Row>,
    filtered_from: Option<usize>,
) -> String {
    let rows = page
        .rows
        .iter()
        .map(|row| columns.iter().map(|column| cell_text(cell(row, column))).collect_vec())
        .collect_vec();
    let mut output = render_table(columns, &rows);
    let mut label = page.range_label();
    if let Some(total) = filtered_from {
        let _ = write!(label, " (filtered from {total})");
    }
    let _ = writeln!(
        output,
        "{label} | Page {} of {}",
        page.page.min(page.display_total_pages()),
        page.display_total_pages()
    );
    output
}

/// One line per group: key, row count, then the mean of each numeric column.
pub fn render_groups(groups: &[GroupResult<'_>]) -> String {
    let numeric = groups
        .iter()
        .flat_map(|group| group.avg.keys())
        .unique()
        .cloned()
        .collect_vec();
    let headers = ["group".to_string(), "count".to_string()]
        .into_iter()
        .chain(numeric.iter().map(|column| format!("avg({column})")))
        .collect_vec();
    let rows = groups
        .iter()
        .map(|group| {
            [group.key.clone(), group.count.to_string()]
                .into_iter()
                .chain(numeric.iter().map(|column| {
                    group
                        .avg
                        .get(column)
                        .map_or_else(
                            || NULL_CELL.to_string(),
                            |avg| Value::Number(*avg).to_string(),
                        )
                }))
                .collect_vec()
        })
        .collect_vec();
    render_table(&headers, &rows)
}

/// Horizontal bar chart scaled to the largest absolute value.
pub fn render_chart(points: &[ChartPoint]) -> String {
    let label_width = points.iter().map(|p| display_width(&p.name)).max().unwrap_or(0);
    let peak = points.iter().map(|p| p.value.abs()).fold(0.0, f64::max);
    points
        .iter()
        .map(|point| {
            let bar = if peak > 0.0 {
                (point.value.abs() / peak * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            let name = sanitize_cell(&point.name);
            let padding = label_width.saturating_sub(display_width(&name));
            format!(
                "{name}{}  {} {}",
                " ".repeat(padding),
                "#".repeat(bar),
                Value::Number(point.value)
            )
        })
        .map(|line| format!("{line}\n"))
        .collect()
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => NULL_CELL.to_string(),
        other => other.to_display_string(),
    }
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let sanitized = sanitize_cell(value);
            let padding = width.saturating_sub(display_width(&sanitized));
            format!("{sanitized}{}", " ".repeat(padding))
        })
        .join("  ");
    line.trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
