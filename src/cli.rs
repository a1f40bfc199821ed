use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Explore CSV and JSON datasets with filters, sorting and grouping",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the first rows of a dataset exactly as imported
    Preview(PreviewArgs),
    /// Show one page of the filtered and sorted rows
    View(ViewArgs),
    /// Summarize row counts and numeric means per distinct value of a column
    Group(GroupArgs),
    /// Average a value column per category and draw it as a bar chart
    Chart(ChartArgs),
    /// Write the filtered and sorted rows to CSV or JSON
    Export(ExportArgs),
    /// List the columns of a dataset with their detected kind
    Columns(SourceArgs),
    /// Open an interactive session with undo and redo over transforms
    Shell(ShellArgs),
}

/// Where the dataset comes from and how to read it.
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Input `.csv` or `.json` file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// YAML workspace settings
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Character encoding of the input file (overrides the config)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Maximum number of rows accepted on import (overrides the config)
    #[arg(long = "max-rows")]
    pub max_rows: Option<usize>,
}

#[derive(Debug, Args)]
pub struct TransformArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Row filters such as `amount > 100`, `status = shipped` or `name contains ann`
    #[arg(long = "filter", action = clap::ArgAction::Append)]
    pub filters: Vec<String>,
    /// Sort directive of the form `column[:asc|desc]`
    #[arg(long = "sort")]
    pub sort: Option<String>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
}

#[derive(Debug, Args)]
pub struct ViewArgs {
    #[command(flatten)]
    pub transform: TransformArgs,
    /// 1-based page to display
    #[arg(long, default_value_t = 1)]
    pub page: usize,
    /// Rows per page (defaults to the configured page size)
    #[arg(long = "page-size")]
    pub page_size: Option<usize>,
}

#[derive(Debug, Args)]
pub struct GroupArgs {
    #[command(flatten)]
    pub transform: TransformArgs,
    /// Column whose distinct values form the groups
    #[arg(long = "by")]
    pub by: String,
}

#[derive(Debug, Args)]
pub struct ChartArgs {
    #[command(flatten)]
    pub transform: TransformArgs,
    /// Category column
    #[arg(short = 'x', long = "x-column")]
    pub x: String,
    /// Value column (defaults to the first numeric column other than the category)
    #[arg(short = 'y', long = "y-column")]
    pub y: Option<String>,
    /// Maximum number of categories (defaults to the configured chart limit)
    #[arg(long)]
    pub limit: Option<usize>,
    /// Use grouped means of numeric cells instead of coercing every cell
    #[arg(long)]
    pub grouped: bool,
    /// Write the series to a file instead of drawing bars (`-` for stdout)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Emit the series as `name,value` CSV or JSON instead of bars
    #[arg(long)]
    pub format: Option<ExportFormat>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub transform: TransformArgs,
    /// Output file (stdout if omitted or `-`)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Output format (defaults to the output file extension, then CSV)
    #[arg(long)]
    pub format: Option<ExportFormat>,
}

#[derive(Debug, Args)]
pub struct ShellArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Rows per page (defaults to the configured page size)
    #[arg(long = "page-size")]
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Picks JSON for `.json` outputs and CSV for everything else.
    pub fn infer(explicit: Option<Self>, output: Option<&std::path::Path>) -> Self {
        explicit.unwrap_or_else(|| {
            match output
                .and_then(|path| path.extension())
                .and_then(|ext| ext.to_str())
            {
                Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
                _ => ExportFormat::Csv,
            }
        })
    }
}
