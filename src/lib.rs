pub mod chart;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod filter;
pub mod group;
pub mod history;
pub mod io_utils;
pub mod pagination;
pub mod pipeline;
pub mod shell;
pub mod sort;
pub mod table;

use std::{env, io, sync::OnceLock};

use anyhow::{Context, Result, ensure};
use clap::Parser;
use itertools::Itertools;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::{Cli, Commands, ExportFormat},
    config::WorkspaceConfig,
    data::{Dataset, Row},
    filter::parse_filters,
    history::Session,
    pagination::{PageCursor, paginate},
    pipeline::{TransformState, group_view, transform},
    shell::Shell,
    sort::SortConfig,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("datavista", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Preview(args) => handle_preview(&args),
        Commands::View(args) => handle_view(&args),
        Commands::Group(args) => handle_group(&args),
        Commands::Chart(args) => handle_chart(&args),
        Commands::Export(args) => handle_export(&args),
        Commands::Columns(args) => handle_columns(&args),
        Commands::Shell(args) => handle_shell(&args),
    }
}

fn load_config(source: &cli::SourceArgs) -> Result<WorkspaceConfig> {
    let mut config = match &source.config {
        Some(path) => WorkspaceConfig::load(path)
            .with_context(|| format!("Loading workspace config from {path:?}"))?,
        None => WorkspaceConfig::default(),
    };
    if let Some(encoding) = &source.input_encoding {
        config.encoding = encoding.clone();
    }
    if let Some(max_rows) = source.max_rows {
        config.max_rows = max_rows;
    }
    config.validate()?;
    debug!("Workspace config: {config:?}");
    Ok(config)
}

fn load_dataset(source: &cli::SourceArgs, config: &WorkspaceConfig) -> Result<Dataset> {
    io_utils::import_file(&source.input, config)
        .with_context(|| format!("Importing {:?}", source.input))
}

/// Builds the transform state named on the command line. Unknown columns
/// are allowed and only warned about, since they simply match nothing.
fn transform_state(args: &cli::TransformArgs, dataset: &Dataset) -> Result<TransformState> {
    let filters = parse_filters(&args.filters)?;
    let sort = args.sort.as_deref().map(SortConfig::parse).transpose()?;
    let state = TransformState {
        sort,
        filters,
        group_by: None,
    };
    let referenced = state
        .filters
        .iter()
        .map(|f| f.column.as_str())
        .chain(state.sort.iter().map(|s| s.column.as_str()));
    warn_unknown_columns(referenced, dataset);
    Ok(state)
}

fn warn_unknown_columns<'a>(columns: impl IntoIterator<Item = &'a str>, dataset: &Dataset) {
    let unknown = columns
        .into_iter()
        .filter(|column| !dataset.columns.iter().any(|c| c == column))
        .unique()
        .collect_vec();
    if !unknown.is_empty() {
        warn!(
            "Column(s) {} not found in '{}'; available: {}",
            unknown.iter().map(|c| format!("'{c}'")).join(", "),
            dataset.name,
            dataset.columns.join(", ")
        );
    }
}

fn handle_preview(args: &cli::PreviewArgs) -> Result<()> {
    let config = load_config(&args.source)?;
    let dataset = load_dataset(&args.source, &config)?;
    info!(
        "Previewing '{}' ({} rows, {})",
        dataset.name,
        dataset.row_count(),
        io_utils::format_file_size(dataset.file_size)
    );
    let rows: Vec<&Row> = dataset.rows.iter().collect();
    let page = paginate(&rows, 1, args.rows.max(1));
    print!("{}", table::render_page(&dataset.columns, &page, None));
    Ok(())
}

fn handle_view(args: &cli::ViewArgs) -> Result<()> {
    let config = load_config(&args.transform.source)?;
    let dataset = load_dataset(&args.transform.source, &config)?;
    let state = transform_state(&args.transform, &dataset)?;
    let page_size = args.page_size.unwrap_or(config.page_size);
    ensure!(page_size > 0, "Page size must be greater than zero");

    let rows = transform(&dataset.rows, &state);
    let mut cursor = PageCursor::new(page_size);
    cursor.go_to(args.page, rows.len().div_ceil(page_size));
    if cursor.page() != args.page {
        warn!("Page {} is out of range; showing page {}", args.page, cursor.page());
    }
    info!("Viewing '{}' with {state}", dataset.name);
    let filtered_from = (!state.filters.is_empty()).then_some(dataset.row_count());
    print!(
        "{}",
        table::render_page(&dataset.columns, &cursor.slice(&rows), filtered_from)
    );
    Ok(())
}

fn handle_group(args: &cli::GroupArgs) -> Result<()> {
    let config = load_config(&args.transform.source)?;
    let dataset = load_dataset(&args.transform.source, &config)?;
    let state = transform_state(&args.transform, &dataset)?.with_group_by(Some(args.by.clone()));
    warn_unknown_columns([args.by.as_str()], &dataset);

    let groups = group_view(&dataset.rows, &state);
    info!("Grouped '{}' by '{}' into {} group(s)", dataset.name, args.by, groups.len());
    print!("{}", table::render_groups(&groups));
    Ok(())
}

fn handle_chart(args: &cli::ChartArgs) -> Result<()> {
    let config = load_config(&args.transform.source)?;
    let dataset = load_dataset(&args.transform.source, &config)?;
    let state = transform_state(&args.transform, &dataset)?;
    let limit = args.limit.unwrap_or(config.chart_group_limit);
    ensure!(limit > 0, "Chart limit must be greater than zero");

    let y = match &args.y {
        Some(y) => y.as_str(),
        None => chart::numeric_columns(&dataset.columns, &dataset.rows)
            .into_iter()
            .find(|column| *column != args.x)
            .with_context(|| format!("No numeric column to chart against '{}'", args.x))?,
    };
    warn_unknown_columns([args.x.as_str(), y], &dataset);

    let points = if args.grouped {
        let groups = group_view(&dataset.rows, &state.with_group_by(Some(args.x.clone())));
        chart::series_from_groups(&groups, y, limit)
    } else {
        chart::aggregate(transform(&dataset.rows, &state), &args.x, y, limit)
    };
    info!("Charting avg({y}) by {} across {} categories", args.x, points.len());
    if args.format.is_none() && args.output.is_none() {
        print!("{}", table::render_chart(&points));
        return Ok(());
    }

    let format = ExportFormat::infer(args.format, args.output.as_deref());
    let writer = io_utils::open_output(args.output.as_deref())?;
    match format {
        ExportFormat::Csv => io_utils::write_chart_csv(writer, &points),
        ExportFormat::Json => io_utils::write_chart_json(writer, &points),
    }
    .with_context(|| format!("Exporting chart data for '{}'", dataset.name))
}

fn handle_export(args: &cli::ExportArgs) -> Result<()> {
    let config = load_config(&args.transform.source)?;
    let dataset = load_dataset(&args.transform.source, &config)?;
    let state = transform_state(&args.transform, &dataset)?;
    let rows = transform(&dataset.rows, &state);
    let format = ExportFormat::infer(args.format, args.output.as_deref());

    let writer = io_utils::open_output(args.output.as_deref())?;
    match format {
        ExportFormat::Csv => io_utils::write_csv(writer, &dataset.columns, &rows),
        ExportFormat::Json => io_utils::write_json(writer, &dataset.columns, &rows),
    }
    .with_context(|| format!("Exporting '{}'", dataset.name))?;
    info!(
        "Exported {} of {} row(s) as {:?}{}",
        rows.len(),
        dataset.row_count(),
        format,
        args.output
            .as_ref()
            .map(|path| format!(" to {path:?}"))
            .unwrap_or_default()
    );
    Ok(())
}

fn handle_columns(args: &cli::SourceArgs) -> Result<()> {
    let config = load_config(args)?;
    let dataset = load_dataset(args, &config)?;
    let numeric = chart::numeric_columns(&dataset.columns, &dataset.rows);
    let rows = dataset
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let kind = if numeric.contains(&column.as_str()) { "number" } else { "text" };
            vec![(idx + 1).to_string(), column.clone(), kind.to_string()]
        })
        .collect_vec();
    println!(
        "{}: {} rows, {}",
        dataset.name,
        dataset.row_count(),
        io_utils::format_file_size(dataset.file_size)
    );
    print!(
        "{}",
        table::render_table(&["#".into(), "column".into(), "kind".into()], &rows)
    );
    Ok(())
}

fn handle_shell(args: &cli::ShellArgs) -> Result<()> {
    let config = load_config(&args.source)?;
    let dataset = load_dataset(&args.source, &config)?;
    let page_size = args.page_size.unwrap_or(config.page_size);
    ensure!(page_size > 0, "Page size must be greater than zero");

    let session = Session::new(dataset, page_size, config.history_limit);
    let mut shell = Shell::new(session, config.page_size_options, config.chart_group_limit);
    shell.run(io::stdin().lock(), io::stdout().lock())
}
