//! Dataset import and export.
//!
//! - **Import**: `.csv` and `.json` files (extension is case-insensitive)
//!   are decoded with the configured encoding and parsed into a [`Dataset`].
//!   CSV cells become numbers when their trimmed text is numeric; JSON keeps
//!   its own scalar types.
//! - **Export**: CSV (fields quoted only when needed, nulls empty) or pretty
//!   JSON, to a file or stdout (`-` or no path).

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use csv::{QuoteStyle, StringRecord, Trim};
use encoding_rs::Encoding;
use log::{debug, info};

use crate::{
    chart::ChartPoint,
    config::WorkspaceConfig,
    data::{Dataset, Row, Value, cell, parse_numeric},
    error::ImportError,
};

/// Columns and rows recovered from one file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedData {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl ParsedData {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn decode_bytes(
    path: &Path,
    bytes: &[u8],
    encoding: &'static Encoding,
) -> Result<String, ImportError> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(ImportError::Decode {
            path: path.to_path_buf(),
            encoding: encoding.name(),
        })
    } else {
        Ok(text.into_owned())
    }
}

/// Parses CSV text whose first non-blank line is the header. Blank and
/// whitespace-only lines are ignored; records with a different number of
/// fields than the header are skipped.
pub fn parse_csv(text: &str) -> Result<ParsedData, ImportError> {
    if text.trim().is_empty() {
        return Err(ImportError::Empty);
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .double_quote(true)
        .from_reader(text.as_bytes());
    let mut records = reader
        .records()
        .filter(|record| !record.as_ref().is_ok_and(is_blank_record));

    let columns: Vec<String> = match records.next() {
        Some(header) => header?.iter().map(str::to_string).collect(),
        None => return Err(ImportError::Empty),
    };

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for record in records {
        let record = record?;
        if record.len() != columns.len() {
            skipped += 1;
            continue;
        }
        let row: Row = columns
            .iter()
            .zip(record.iter())
            .map(|(column, field)| (column.clone(), csv_cell(field)))
            .collect();
        rows.push(row);
    }
    if skipped > 0 {
        debug!("Skipped {skipped} CSV record(s) with a mismatched field count");
    }
    Ok(ParsedData { columns, rows })
}

/// A line holding only whitespace trims down to a single empty field.
fn is_blank_record(record: &StringRecord) -> bool {
    record.len() == 1 && record[0].is_empty()
}

fn csv_cell(field: &str) -> Value {
    match parse_numeric(field) {
        Some(number) => Value::Number(number),
        None => Value::String(field.to_string()),
    }
}

/// Accepts a top-level array, an object with a `data` array, or a single
/// object. Columns are the keys of the first record, in source order.
pub fn parse_json(text: &str) -> Result<ParsedData, ImportError> {
    let json: serde_json::Value = serde_json::from_str(text)?;
    let records = match json {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut object)
            if object.get("data").is_some_and(serde_json::Value::is_array) =>
        {
            match object.remove("data") {
                Some(serde_json::Value::Array(items)) => items,
                _ => Vec::new(),
            }
        }
        serde_json::Value::Object(object) => vec![serde_json::Value::Object(object)],
        _ => return Err(ImportError::InvalidJson),
    };
    if records.is_empty() {
        return Err(ImportError::NoData);
    }

    let columns = match &records[0] {
        serde_json::Value::Object(first) => first.keys().cloned().collect(),
        _ => Vec::new(),
    };
    let rows = records
        .into_iter()
        .map(|record| match record {
            serde_json::Value::Object(object) => object
                .into_iter()
                .map(|(key, value)| (key, Value::from(value)))
                .collect(),
            _ => Row::new(),
        })
        .collect();
    Ok(ParsedData { columns, rows })
}

/// Reads, decodes and parses `path` into a named dataset.
pub fn import_file(path: &Path, config: &WorkspaceConfig) -> Result<Dataset> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let parse: fn(&str) -> Result<ParsedData, ImportError> = match extension.as_deref() {
        Some("csv") => parse_csv,
        Some("json") => parse_json,
        _ => return Err(ImportError::UnsupportedFormat.into()),
    };
    let encoding = config.resolve_encoding()?;
    let bytes = fs::read(path).map_err(|source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = decode_bytes(path, &bytes, encoding)?;
    let parsed = parse(&text).with_context(|| format!("Parsing {path:?}"))?;
    if parsed.row_count() > config.max_rows {
        return Err(ImportError::TooManyRows {
            rows: parsed.row_count(),
            limit: config.max_rows,
        }
        .into());
    }

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());
    info!(
        "Imported {} row(s) across {} column(s) from {:?} ({})",
        parsed.row_count(),
        parsed.columns.len(),
        path,
        format_file_size(bytes.len() as u64)
    );
    Ok(Dataset::new(name, parsed.columns, parsed.rows, bytes.len() as u64))
}

pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    })
}

pub fn write_csv<W: Write>(writer: W, columns: &[String], rows: &[&Row]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true)
        .from_writer(writer);
    writer.write_record(columns)?;
    for row in rows {
        writer.write_record(columns.iter().map(|column| match cell(row, column) {
            Value::Null => String::new(),
            other => other.to_display_string(),
        }))?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes rows as a JSON array of objects with keys in column order; keys a
/// row does not have are left out.
pub fn write_json<W: Write>(mut writer: W, columns: &[String], rows: &[&Row]) -> Result<()> {
    let records = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .filter_map(|column| {
                    row.get(column)
                        .map(|value| serde_json::to_value(value).map(|json| (column.clone(), json)))
                })
                .collect::<serde_json::Result<serde_json::Map<_, _>>>()
        })
        .collect::<serde_json::Result<Vec<_>>>()?;
    serde_json::to_writer_pretty(&mut writer, &records)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Writes a chart series as `name,value` CSV.
pub fn write_chart_csv<W: Write>(writer: W, points: &[ChartPoint]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(writer);
    writer.write_record(["name", "value"])?;
    for point in points {
        writer.write_record([point.name.clone(), Value::Number(point.value).to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_chart_json<W: Write>(mut writer: W, points: &[ChartPoint]) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, points)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Human-readable byte count, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut exponent = 0;
    while exponent + 1 < UNITS.len() && bytes >= 1u64 << (10 * (exponent + 1)) {
        exponent += 1;
    }
    let scaled = bytes as f64 / (1u64 << (10 * exponent)) as f64;
    let rounded = format!("{scaled:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[exponent])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_types_numeric_cells_and_keeps_text() {
        let parsed =
            parse_csv("id, name ,amount\n1,Alice, 42.5\n2,\"Smith, Bob\",\n\n3,007,x\n").unwrap();
        assert_eq!(parsed.columns, vec!["id", "name", "amount"]);
        assert_eq!(parsed.row_count(), 3);
        assert_eq!(parsed.rows[0]["amount"], Value::Number(42.5));
        assert_eq!(parsed.rows[1]["name"], Value::from("Smith, Bob"));
        assert_eq!(parsed.rows[1]["amount"], Value::from(""));
        assert_eq!(parsed.rows[2]["name"], Value::Number(7.0));
    }

    #[test]
    fn csv_drops_records_with_wrong_field_count() {
        let parsed = parse_csv("a,b\n1,2\n3\n4,5,6\n7,8\n").unwrap();
        assert_eq!(parsed.row_count(), 2);
        assert_eq!(parsed.rows[1]["a"], Value::Number(7.0));
    }

    #[test]
    fn csv_ignores_whitespace_only_lines() {
        let parsed = parse_csv("  \nid,name\n1,a\n").unwrap();
        assert_eq!(parsed.columns, vec!["id", "name"]);
        assert_eq!(parsed.row_count(), 1);

        let single = parse_csv("name\n   \nAlice\n\t\n").unwrap();
        assert_eq!(single.row_count(), 1);
        assert_eq!(single.rows[0]["name"], Value::from("Alice"));

        let quoted = parse_csv("note,n\n\"line one\n   \nline three\",1\n").unwrap();
        assert_eq!(quoted.row_count(), 1);
        assert_eq!(quoted.rows[0]["note"], Value::from("line one\n   \nline three"));
    }

    #[test]
    fn csv_rejects_blank_input() {
        assert!(matches!(parse_csv(" \n\n"), Err(ImportError::Empty)));
    }

    #[test]
    fn json_accepts_array_data_property_and_single_object() {
        let array = parse_json(r#"[{"b":1,"a":"x"},{"a":"y","c":true}]"#).unwrap();
        assert_eq!(array.columns, vec!["b", "a"]);
        assert_eq!(array.row_count(), 2);
        assert_eq!(array.rows[1]["c"], Value::Boolean(true));

        let wrapped = parse_json(r#"{"data":[{"a":1}],"meta":{}}"#).unwrap();
        assert_eq!(wrapped.columns, vec!["a"]);

        let single = parse_json(r#"{"a":1,"data":"not an array"}"#).unwrap();
        assert_eq!(single.row_count(), 1);
        assert_eq!(single.columns, vec!["a", "data"]);
        assert_eq!(single.rows[0]["data"], Value::from("not an array"));
    }

    #[test]
    fn json_rejects_scalars_and_empty_arrays() {
        assert!(matches!(parse_json("42"), Err(ImportError::InvalidJson)));
        assert!(matches!(parse_json("[]"), Err(ImportError::NoData)));
        assert!(matches!(parse_json("{"), Err(ImportError::Json(_))));
    }

    #[test]
    fn csv_export_quotes_only_when_needed() {
        let parsed = parse_csv("name,qty\n\"a, b\",1\nplain,2.5\n").unwrap();
        let mut rows: Vec<&Row> = parsed.rows.iter().collect();
        let missing = Row::from([("name".to_string(), Value::from("say \"hi\""))]);
        rows.push(&missing);
        let mut out = Vec::new();
        write_csv(&mut out, &parsed.columns, &rows).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "name,qty\n\"a, b\",1\nplain,2.5\n\"say \"\"hi\"\"\",\n"
        );
    }

    #[test]
    fn json_export_keeps_column_order() {
        let parsed = parse_json(r#"[{"z":1,"a":null}]"#).unwrap();
        let rows: Vec<&Row> = parsed.rows.iter().collect();
        let mut out = Vec::new();
        write_json(&mut out, &parsed.columns, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.find("\"z\"").unwrap() < text.find("\"a\"").unwrap());
        assert!(text.contains("null"));
    }

    #[test]
    fn chart_series_exports_as_name_value_csv() {
        let points = vec![
            ChartPoint { name: "Oslo, NO".into(), value: 12.5 },
            ChartPoint { name: "Rome".into(), value: 3.0 },
        ];
        let mut out = Vec::new();
        write_chart_csv(&mut out, &points).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "name,value\n\"Oslo, NO\",12.5\nRome,3\n");
    }

    #[test]
    fn file_sizes_are_humanized() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1024 * 1024), "1 MB");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024 * 1024), "5120 GB");
    }
}
