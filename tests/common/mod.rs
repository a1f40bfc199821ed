#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use datavista::data::{Row, Value};
use tempfile::{TempDir, tempdir};

pub const SALES_CSV: &str = "\
region,product,units,price
North,Widget,10,2.5
South,Gadget,4,10
North,Gadget,7,10
East,Widget,,2.5
South,Widget,12,2.5
";

pub const SALES_JSON: &str = r#"{
  "data": [
    {"region": "North", "product": "Widget", "units": 10, "active": true},
    {"region": "South", "product": "Gadget", "units": 4, "active": false},
    {"region": "North", "product": "Gadget", "units": 7, "active": null}
  ]
}"#;

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, contents.as_bytes())
    }

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }
}

/// Builds a row from `(column, value)` pairs.
pub fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(column, value)| (column.to_string(), value.clone()))
        .collect()
}

/// Single-column rows, `None` becoming an explicit null.
pub fn column_rows(column: &str, values: &[Option<f64>]) -> Vec<Row> {
    values
        .iter()
        .map(|value| row(&[(column, Value::from(*value))]))
        .collect()
}

pub fn column_values(rows: &[&Row], column: &str) -> Vec<Value> {
    rows.iter()
        .map(|row| row.get(column).cloned().unwrap_or_default())
        .collect()
}
